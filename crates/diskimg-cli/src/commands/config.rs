use super::{config_path, json_pretty, read_config_file, EndpointOverrides, EXIT_SUCCESS};

/// Persist the given endpoint settings into the config file, keeping any
/// fields not given.
pub fn set(overrides: &EndpointOverrides, timeout_secs: Option<u64>) -> Result<u8, String> {
    let path = config_path(overrides)?;
    let mut config = read_config_file(&path)?;
    if let Some(ref url) = overrides.url {
        config.url = url.trim_end_matches('/').to_owned();
    }
    if let Some(ref key) = overrides.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(ref region) = overrides.region {
        config.region = Some(region.clone());
    }
    if let Some(secs) = timeout_secs {
        config.timeout_secs = secs;
    }
    config.save(&path).map_err(|e| e.to_string())?;
    println!("config written to {}", path.display());
    Ok(EXIT_SUCCESS)
}

/// Print the config file contents with the API key masked.
pub fn show(overrides: &EndpointOverrides, json: bool) -> Result<u8, String> {
    let path = config_path(overrides)?;
    let mut config = read_config_file(&path)?;
    config.api_key = config.api_key.as_deref().map(mask);
    if json {
        println!("{}", json_pretty(&config)?);
    } else {
        println!("path:     {}", path.display());
        println!("url:      {}", config.url);
        println!("api_key:  {}", config.api_key.as_deref().unwrap_or("(none)"));
        println!("region:   {}", config.region.as_deref().unwrap_or("(default)"));
        println!("timeout:  {}s", config.timeout_secs);
    }
    Ok(EXIT_SUCCESS)
}

fn mask(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "****".to_owned();
    }
    let tail: String = key.chars().skip(len - 4).collect();
    format!("****{tail}")
}
