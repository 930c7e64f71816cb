//! Wire entities and version ordering for the disk image API.
//!
//! This crate defines the schema layer: the read entity (`DiskImage`), the
//! create request and response bodies, string newtypes for identifiers, and
//! the semantic-version ordering used to pick the newest image of a
//! distribution.

pub mod image;
pub mod types;
pub mod version;

pub use image::{CreateDiskImageParams, CreateDiskImageResponse, DiskImage};
pub use types::{ImageId, ImageName};
pub use version::{Version, VersionError};
