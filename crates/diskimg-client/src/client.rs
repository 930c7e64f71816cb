use crate::http::HttpTransport;
use crate::{resolve, CatalogFilter, ClientConfig, ClientError, Transport};
use diskimg_schema::{CreateDiskImageParams, CreateDiskImageResponse, DiskImage};
use serde::de::DeserializeOwned;

const DISK_IMAGES_PATH: &str = "/v2/disk_images";

/// Disk image operations over a [`Transport`].
///
/// The client keeps no state between calls besides its transport and catalog
/// filter. Every operation performs one request; lookups fetch the filtered
/// default catalog once and scan it in memory.
pub struct DiskImageClient<T: Transport> {
    transport: T,
    filter: CatalogFilter,
}

impl DiskImageClient<HttpTransport> {
    /// Build a client over HTTP for the given endpoint config.
    pub fn from_config(config: ClientConfig) -> Self {
        Self::new(HttpTransport::new(config))
    }
}

impl<T: Transport> DiskImageClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            filter: CatalogFilter::default(),
        }
    }

    /// Replace the catalog exclusion policy.
    #[must_use]
    pub fn with_filter(mut self, filter: CatalogFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List disk images. With `include_custom`, images uploaded to the account
    /// are returned alongside the stock catalog. The catalog filter always
    /// applies.
    pub fn list(&self, include_custom: bool) -> Result<Vec<DiskImage>, ClientError> {
        let path = if include_custom {
            format!("{DISK_IMAGES_PATH}?type=custom")
        } else {
            DISK_IMAGES_PATH.to_owned()
        };
        let body = self.transport.get(&path)?;
        let images: Vec<DiskImage> = decode(&body)?;
        Ok(self.filter.apply(images))
    }

    pub fn get_by_id(&self, id: &str) -> Result<DiskImage, ClientError> {
        let body = self.transport.get(&image_path(id))?;
        decode(&body)
    }

    /// Find an image by exact or unambiguous partial name or id.
    pub fn resolve(&self, search: &str) -> Result<DiskImage, ClientError> {
        let images = self.list(false)?;
        resolve::resolve(&images, search).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Result<DiskImage, ClientError> {
        let images = self.list(false)?;
        resolve::find_by_name(&images, name).cloned()
    }

    /// The highest-versioned image whose name contains `name`.
    pub fn most_recent_distro(&self, name: &str) -> Result<DiskImage, ClientError> {
        let images = self.list(false)?;
        resolve::most_recent(&images, name).cloned()
    }

    /// Register a new disk image. The response carries the upload URL.
    pub fn create(
        &self,
        params: &CreateDiskImageParams,
    ) -> Result<CreateDiskImageResponse, ClientError> {
        let payload = serde_json::to_vec(params).map_err(ClientError::Encode)?;
        let body = self.transport.post(DISK_IMAGES_PATH, &payload)?;
        let created: CreateDiskImageResponse = decode(&body)?;
        tracing::info!("created disk image {} ({})", created.name, created.id);
        Ok(created)
    }

    pub fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.transport.delete(&image_path(id))?;
        tracing::info!("deleted disk image {id}");
        Ok(())
    }
}

fn image_path(id: &str) -> String {
    format!("{DISK_IMAGES_PATH}/{}", urlencoding::encode(id))
}

fn decode<D: DeserializeOwned>(body: &[u8]) -> Result<D, ClientError> {
    serde_json::from_slice(body).map_err(ClientError::Decode)
}
