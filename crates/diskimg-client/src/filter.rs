use diskimg_schema::DiskImage;

/// Name fragments of image families that belong to managed orchestration
/// products. Those images are never offered as standalone disk images.
pub const RESERVED_FAMILIES: &[&str] = &["k3s", "talos"];

/// Catalog exclusion policy applied to every listing.
///
/// An image is dropped when its name contains any of the excluded fragments
/// (case-sensitive substring match). The default policy excludes
/// [`RESERVED_FAMILIES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    excluded: Vec<String>,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self::excluding(RESERVED_FAMILIES.iter().copied())
    }
}

impl CatalogFilter {
    pub fn excluding<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// A filter that keeps every image.
    pub fn none() -> Self {
        Self {
            excluded: Vec::new(),
        }
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn admits(&self, image: &DiskImage) -> bool {
        !self
            .excluded
            .iter()
            .any(|fragment| image.name.contains(fragment.as_str()))
    }

    pub fn apply(&self, images: Vec<DiskImage>) -> Vec<DiskImage> {
        let before = images.len();
        let kept: Vec<DiskImage> = images.into_iter().filter(|i| self.admits(i)).collect();
        if kept.len() != before {
            tracing::debug!("catalog filter dropped {} of {before} images", before - kept.len());
        }
        kept
    }
}
