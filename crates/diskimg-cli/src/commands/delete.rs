use super::{describe, json_pretty, spin_fail, spin_ok, spinner, EXIT_FAILURE, EXIT_SUCCESS};
use dialoguer::Confirm;
use diskimg_client::http::HttpTransport;
use diskimg_client::{resolve, DiskImageClient};
use std::io::{stdin, IsTerminal};

pub fn run(
    client: &DiskImageClient<HttpTransport>,
    search: &str,
    yes: bool,
    json: bool,
) -> Result<u8, String> {
    // Custom images only appear in the catalog listed with include_custom.
    let images = client.list(true).map_err(|e| describe(&e))?;
    let image = resolve(&images, search).map_err(|e| describe(&e))?;

    if !yes {
        if !stdin().is_terminal() {
            return Err(format!(
                "refusing to delete {} without --yes in non-interactive mode",
                image.name
            ));
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("delete disk image {} ({})?", image.name, image.id))
            .default(false)
            .interact()
            .map_err(|e| format!("prompt failed: {e}"))?;
        if !confirmed {
            eprintln!("aborted");
            return Ok(EXIT_FAILURE);
        }
    }

    let pb = (!json).then(|| spinner("deleting disk image…"));
    client.delete(image.id.as_str()).map_err(|e| {
        if let Some(ref pb) = pb {
            spin_fail(pb, "delete failed");
        }
        describe(&e)
    })?;
    if let Some(ref pb) = pb {
        spin_ok(pb, &format!("deleted {}", image.name));
    }

    if json {
        let payload = serde_json::json!({
            "id": image.id,
            "name": image.name,
            "deleted": true,
        });
        println!("{}", json_pretty(&payload)?);
    }
    Ok(EXIT_SUCCESS)
}
