use super::{colorize_state, describe, json_pretty, EXIT_SUCCESS};
use diskimg_client::http::HttpTransport;
use diskimg_client::DiskImageClient;

pub fn run(
    client: &DiskImageClient<HttpTransport>,
    include_custom: bool,
    json: bool,
) -> Result<u8, String> {
    let images = client.list(include_custom).map_err(|e| describe(&e))?;
    if json {
        println!("{}", json_pretty(&images)?);
    } else if images.is_empty() {
        println!("no disk images found");
    } else {
        println!(
            "{:<38} {:<24} {:<10} {:<12} DISTRIBUTION",
            "ID", "NAME", "VERSION", "STATE"
        );
        for image in &images {
            let state_str = colorize_state(&image.state);
            let marker = if image.distribution_default { " *" } else { "" };
            println!(
                "{:<38} {:<24} {:<10} {:<12} {}{marker}",
                image.id, image.name, image.version, state_str, image.distribution
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
