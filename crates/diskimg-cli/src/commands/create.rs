use super::{describe, json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use diskimg_client::checksum;
use diskimg_client::http::HttpTransport;
use diskimg_client::DiskImageClient;
use diskimg_schema::CreateDiskImageParams;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub name: String,
    pub distribution: String,
    pub version: String,
    pub file: PathBuf,
    pub source: String,
    pub os: Option<String>,
    pub initial_user: Option<String>,
    pub logo: Option<PathBuf>,
}

/// Build the request body for `args`, hashing the image file and encoding
/// the logo. The region comes from the client's endpoint config.
pub fn build_params(
    args: &CreateArgs,
    region: Option<&str>,
) -> Result<CreateDiskImageParams, String> {
    let digests = checksum::file_digests(&args.file)
        .map_err(|e| format!("failed to read {}: {e}", args.file.display()))?;
    let logo_base64 = match args.logo {
        Some(ref path) => Some(checksum::encode_logo(path).map_err(|e| e.to_string())?),
        None => None,
    };

    Ok(CreateDiskImageParams {
        name: args.name.clone(),
        distribution: args.distribution.clone(),
        version: args.version.clone(),
        source: args.source.clone(),
        os: args.os.clone(),
        initial_user: args.initial_user.clone(),
        region: region.map(ToOwned::to_owned),
        image_sha256: digests.sha256,
        image_md5: digests.md5,
        logo_base64,
        image_size_bytes: digests.size_bytes,
    })
}

pub fn run(
    client: &DiskImageClient<HttpTransport>,
    args: &CreateArgs,
    json: bool,
) -> Result<u8, String> {
    let region = client.transport().config().region.as_deref();

    let pb = (!json).then(|| spinner("hashing image…"));
    let params = build_params(args, region).inspect_err(|_| {
        if let Some(ref pb) = pb {
            spin_fail(pb, "hashing failed");
        }
    })?;
    if let Some(ref pb) = pb {
        pb.set_message("registering disk image…");
    }

    let created = client.create(&params).map_err(|e| {
        if let Some(ref pb) = pb {
            spin_fail(pb, "create failed");
        }
        describe(&e)
    })?;
    if let Some(ref pb) = pb {
        spin_ok(pb, "disk image registered");
    }

    if json {
        println!("{}", json_pretty(&created)?);
    } else {
        println!("id:          {}", created.id);
        println!("name:        {}", created.name);
        println!("status:      {}", created.status);
        println!("size_bytes:  {}", params.image_size_bytes);
        println!("sha256:      {}", params.image_sha256);
        println!("upload_url:  {}", created.disk_image_url);
    }
    Ok(EXIT_SUCCESS)
}
