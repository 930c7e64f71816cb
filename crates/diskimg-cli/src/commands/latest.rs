use super::{describe, json_pretty, print_image_detail, EXIT_SUCCESS};
use diskimg_client::http::HttpTransport;
use diskimg_client::DiskImageClient;

pub fn run(
    client: &DiskImageClient<HttpTransport>,
    distribution: &str,
    json: bool,
) -> Result<u8, String> {
    let image = client
        .most_recent_distro(distribution)
        .map_err(|e| describe(&e))?;
    if json {
        println!("{}", json_pretty(&image)?);
    } else {
        print_image_detail(&image);
    }
    Ok(EXIT_SUCCESS)
}
