use crate::types::{ImageId, ImageName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A disk image as returned by `GET /v2/disk_images` and `GET /v2/disk_images/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskImage {
    pub id: ImageId,
    pub name: ImageName,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub state: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_user: Option<String>,
    #[serde(default)]
    pub distribution: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub os: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub label: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_image_size_bytes: Option<i64>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Account member who uploaded the image; several users can share one account.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_by: Option<String>,
    #[serde(default)]
    pub distribution_default: bool,
}

/// Body of `POST /v2/disk_images`.
///
/// Checksums and size are required by the API contract; the client sends them
/// as given and leaves verification to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDiskImageParams {
    pub name: String,
    pub distribution: String,
    pub version: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub image_sha256: String,
    pub image_md5: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_base64: Option<String>,
    pub image_size_bytes: i64,
}

/// Response to `POST /v2/disk_images`. `disk_image_url` is the pre-signed
/// upload target for the image file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDiskImageResponse {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub status: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_user: Option<String>,
    #[serde(default)]
    pub disk_image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_image_size_bytes: Option<i64>,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub image_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_by: Option<String>,
    #[serde(default)]
    pub distribution_default: bool,
}

// The API sends "" for unset strings; treat that the same as an absent key.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
