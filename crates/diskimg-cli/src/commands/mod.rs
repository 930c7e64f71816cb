pub mod completions;
pub mod config;
pub mod create;
pub mod delete;
pub mod latest;
pub mod list;
pub mod man_pages;
pub mod show;

use diskimg_client::http::HttpTransport;
use diskimg_client::{ClientConfig, ClientError, DiskImageClient};
use diskimg_schema::DiskImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_LOOKUP_FAILED: u8 = 2;
pub const EXIT_CONFIG_ERROR: u8 = 3;

pub const LOOKUP_PREFIX: &str = "lookup failed:";
pub const CONFIG_PREFIX: &str = "config error:";

/// Endpoint settings given on the command line; each overrides the config
/// file and environment.
#[derive(Debug, Default, Clone)]
pub struct EndpointOverrides {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub region: Option<String>,
    pub config_path: Option<PathBuf>,
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Render a client error so `main` can map it to an exit code.
pub fn describe(e: &ClientError) -> String {
    if e.is_lookup_failure() {
        format!("{LOOKUP_PREFIX} {e}")
    } else {
        e.to_string()
    }
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_state(state: &str) -> String {
    use console::Style;
    match state {
        "available" => Style::new().green().apply_to(state).to_string(),
        "pending" | "uploading" => Style::new().yellow().apply_to(state).to_string(),
        "processing" => Style::new().cyan().apply_to(state).to_string(),
        "failed" | "error" => Style::new().red().bold().apply_to(state).to_string(),
        "deprecated" => Style::new().dim().apply_to(state).to_string(),
        other => other.to_owned(),
    }
}

pub fn config_path(overrides: &EndpointOverrides) -> Result<PathBuf, String> {
    match overrides.config_path {
        Some(ref path) => Ok(path.clone()),
        None => diskimg_client::config::default_config_path().map_err(|e| e.to_string()),
    }
}

/// Resolve endpoint settings: flags, then environment, then config file,
/// then built-in defaults.
pub fn load_config(overrides: &EndpointOverrides) -> Result<ClientConfig, String> {
    let path = config_path(overrides)?;
    let base = read_config_file(&path)?;
    let mut config = base.apply_env();
    if let Some(ref url) = overrides.url {
        config.url = url.trim_end_matches('/').to_owned();
    }
    if let Some(ref key) = overrides.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(ref region) = overrides.region {
        config.region = Some(region.clone());
    }
    Ok(config)
}

/// Read a config file, falling back to defaults when it does not exist.
pub fn read_config_file(path: &Path) -> Result<ClientConfig, String> {
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(ClientConfig::default());
    }
    ClientConfig::load(path).map_err(|e| match e {
        ClientError::Config(_) => e.to_string(),
        other => format!("{CONFIG_PREFIX} {other}"),
    })
}

pub fn make_client(overrides: &EndpointOverrides) -> Result<DiskImageClient<HttpTransport>, String> {
    let config = load_config(overrides)?;
    tracing::debug!(
        "endpoint {} (region {})",
        config.url,
        config.region.as_deref().unwrap_or("default")
    );
    Ok(DiskImageClient::from_config(config))
}

pub fn print_image_detail(image: &DiskImage) {
    println!("id:            {}", image.id);
    println!("name:          {}", image.name);
    println!("version:       {}", image.version);
    println!("state:         {}", colorize_state(&image.state));
    println!("distribution:  {}", image.distribution);
    println!("default:       {}", image.distribution_default);
    println!("os:            {}", image.os.as_deref().unwrap_or("(none)"));
    println!(
        "initial_user:  {}",
        image.initial_user.as_deref().unwrap_or("(none)")
    );
    if !image.label.is_empty() {
        println!("label:         {}", image.label);
    }
    if !image.description.is_empty() {
        println!("description:   {}", image.description);
    }
    if let Some(size) = image.disk_image_size_bytes {
        println!("size_bytes:    {size}");
    }
    if let Some(ref by) = image.created_by {
        println!("created_by:    {by}");
    }
    if let Some(created) = image.created_at {
        println!("created_at:    {}", created.to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_string() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn colorize_state_known_and_unknown() {
        for state in ["available", "pending", "processing", "failed", "deprecated"] {
            assert!(colorize_state(state).contains(state));
        }
        assert_eq!(colorize_state("unknown"), "unknown");
    }

    #[test]
    fn describe_prefixes_lookup_failures() {
        let zero = ClientError::ZeroMatches {
            search: "freebsd".to_owned(),
        };
        assert_eq!(
            describe(&zero),
            "lookup failed: unable to find freebsd, zero matches"
        );
        let cfg = ClientError::Config("bad".to_owned());
        assert!(describe(&cfg).starts_with(CONFIG_PREFIX));
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_LOOKUP_FAILED);
        assert_ne!(EXIT_LOOKUP_FAILED, EXIT_CONFIG_ERROR);
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_config_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        ClientConfig::new("https://file.example.com")
            .with_api_key("file-key")
            .with_region("NYC1")
            .save(&path)
            .unwrap();

        let config = load_config(&EndpointOverrides {
            url: Some("http://flag.example.com/".to_owned()),
            region: Some("LON1".to_owned()),
            config_path: Some(path),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.url, "http://flag.example.com");
        assert_eq!(config.region.as_deref(), Some("LON1"));
    }

    #[test]
    fn invalid_config_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        let err = read_config_file(&path).unwrap_err();
        assert!(err.starts_with(CONFIG_PREFIX), "{err}");
    }

    #[test]
    fn make_client_with_url() {
        let dir = tempfile::tempdir().unwrap();
        let client = make_client(&EndpointOverrides {
            url: Some("http://localhost:8322".to_owned()),
            config_path: Some(dir.path().join("none.json")),
            ..Default::default()
        });
        assert!(client.is_ok());
    }

    #[test]
    fn spinner_creates_progress_bar() {
        let pb = spinner("testing...");
        spin_ok(&pb, "done");
        let pb = spinner("testing...");
        spin_fail(&pb, "failed");
    }
}
