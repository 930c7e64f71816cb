//! Digests and encodings needed to register a local image file.

use crate::ClientError;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Upper bound on logo files read into memory for encoding.
pub const MAX_LOGO_BYTES: u64 = 512 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDigests {
    pub sha256: String,
    pub md5: String,
    pub size_bytes: i64,
}

/// Stream `path` once, computing lowercase hex SHA-256 and MD5 plus the size.
pub fn file_digests(path: &Path) -> Result<ImageDigests, ClientError> {
    let mut file = File::open(path)?;
    let mut sha = Sha256::new();
    let mut md5 = md5::Context::new();
    let mut buffer = vec![0u8; 64 * 1024];
    let mut size: u64 = 0;

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        sha.update(&buffer[..n]);
        md5.consume(&buffer[..n]);
        size += n as u64;
    }

    let size_bytes = i64::try_from(size)
        .map_err(|_| ClientError::Config(format!("{} is too large", path.display())))?;
    let digests = ImageDigests {
        sha256: hex::encode(sha.finalize()),
        md5: format!("{:x}", md5.compute()),
        size_bytes,
    };
    tracing::debug!(
        "digests for {}: sha256={} md5={} size={}",
        path.display(),
        digests.sha256,
        digests.md5,
        digests.size_bytes
    );
    Ok(digests)
}

/// Read a logo file and return it base64-encoded for `logo_base64`.
pub fn encode_logo(path: &Path) -> Result<String, ClientError> {
    let len = std::fs::metadata(path)?.len();
    if len > MAX_LOGO_BYTES {
        return Err(ClientError::Config(format!(
            "logo {} is {len} bytes, limit is {MAX_LOGO_BYTES}",
            path.display()
        )));
    }
    let data = std::fs::read(path)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.raw");
        std::fs::write(&path, b"hello world").unwrap();

        let digests = file_digests(&path).unwrap();
        assert_eq!(
            digests.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(digests.md5, "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(digests.size_bytes, 11);
    }

    #[test]
    fn digests_of_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.raw");
        std::fs::write(&path, b"").unwrap();

        let digests = file_digests(&path).unwrap();
        assert_eq!(
            digests.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(digests.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digests.size_bytes, 0);
    }

    #[test]
    fn digests_span_multiple_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.raw");
        let data: Vec<u8> = (0..200_000).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let digests = file_digests(&path).unwrap();
        assert_eq!(digests.size_bytes, 200_000);
        assert_eq!(digests.sha256, hex::encode(Sha256::digest(&data)));
        assert_eq!(digests.md5, format!("{:x}", md5::compute(&data)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            file_digests(&dir.path().join("absent")),
            Err(ClientError::Io(_))
        ));
    }

    #[test]
    fn logo_is_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"\x89PNG").unwrap();
        assert_eq!(encode_logo(&path).unwrap(), "iVBORw==");
    }

    #[test]
    fn oversized_logo_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, vec![0u8; (MAX_LOGO_BYTES + 1) as usize]).unwrap();
        assert!(matches!(encode_logo(&path), Err(ClientError::Config(_))));
    }
}
