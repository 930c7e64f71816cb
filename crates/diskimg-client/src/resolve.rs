//! Catalog lookups: fuzzy resolution, exact name lookup, and newest-version
//! selection. These operate on an already fetched and filtered catalog.

use crate::ClientError;
use diskimg_schema::{version, DiskImage};
use std::cmp::Ordering;

/// Find the image whose name or id equals `search`, or failing that the only
/// image whose name or id contains it.
///
/// An exact match always wins; when several entries match exactly, the last
/// one in catalog order is returned. Partial matches only count while no
/// exact match has been seen.
pub fn resolve<'a>(images: &'a [DiskImage], search: &str) -> Result<&'a DiskImage, ClientError> {
    let mut exact_match = false;
    let mut partial_matches = 0usize;
    let mut result = None;

    for image in images {
        if image.name == search || image.id == search {
            exact_match = true;
            result = Some(image);
        } else if (image.name.contains(search) || image.id.contains(search)) && !exact_match {
            result = Some(image);
            partial_matches += 1;
        }
    }

    match result {
        Some(image) if exact_match || partial_matches == 1 => Ok(image),
        _ if partial_matches > 1 => {
            tracing::debug!("'{search}' matched {partial_matches} images");
            Err(ClientError::MultipleMatches {
                search: search.to_owned(),
            })
        }
        _ => Err(ClientError::ZeroMatches {
            search: search.to_owned(),
        }),
    }
}

/// First image, in catalog order, whose name is exactly `name`.
pub fn find_by_name<'a>(images: &'a [DiskImage], name: &str) -> Result<&'a DiskImage, ClientError> {
    images
        .iter()
        .find(|image| image.name == name)
        .ok_or_else(|| ClientError::NotFound {
            what: name.to_owned(),
        })
}

/// The image with the highest version among those whose name contains
/// `name`. Ties keep the earliest entry; malformed versions rank lowest.
pub fn most_recent<'a>(images: &'a [DiskImage], name: &str) -> Result<&'a DiskImage, ClientError> {
    let mut best: Option<&DiskImage> = None;

    for image in images.iter().filter(|image| image.name.contains(name)) {
        if !version::is_valid(&image.version) {
            tracing::warn!(
                "image {} has malformed version '{}', ranking it lowest",
                image.name,
                image.version
            );
        }
        best = match best {
            Some(current)
                if version::compare(&current.version, &image.version) != Ordering::Less =>
            {
                Some(current)
            }
            _ => Some(image),
        };
    }

    best.ok_or_else(|| ClientError::NotFound {
        what: name.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, name: &str, version: &str) -> DiskImage {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "version": version,
        }))
        .unwrap()
    }

    fn catalog() -> Vec<DiskImage> {
        vec![
            image("a1b2c3", "ubuntu-focal", "20.04"),
            image("d4e5f6", "ubuntu-jammy", "22.04"),
            image("0a1b2c", "debian-10", "10"),
            image("3d4e5f", "debian-11", "11"),
            image("6a7b8c", "alpine-3.19", "3.19"),
        ]
    }

    #[test]
    fn exact_name_beats_partial_matches() {
        let images = catalog();
        let found = resolve(&images, "ubuntu-focal").unwrap();
        assert_eq!(found.id, "a1b2c3");
    }

    #[test]
    fn exact_id_match() {
        let images = catalog();
        assert_eq!(resolve(&images, "d4e5f6").unwrap().name, "ubuntu-jammy");
    }

    #[test]
    fn exact_match_wins_even_after_partials() {
        let images = vec![
            image("1", "ubuntu-focal-minimal", "1"),
            image("2", "ubuntu-focal-server", "1"),
            image("3", "ubuntu-focal", "1"),
        ];
        assert_eq!(resolve(&images, "ubuntu-focal").unwrap().id, "3");
    }

    #[test]
    fn later_exact_match_overrides_earlier() {
        let images = vec![image("1", "dup", "1"), image("2", "dup", "1")];
        assert_eq!(resolve(&images, "dup").unwrap().id, "2");
    }

    #[test]
    fn partials_after_exact_do_not_count() {
        let images = vec![
            image("1", "centos", "1"),
            image("2", "centos-7", "1"),
            image("3", "centos-8", "1"),
        ];
        assert_eq!(resolve(&images, "centos").unwrap().id, "1");
    }

    #[test]
    fn ambiguous_partial_is_multiple_matches() {
        let images = catalog();
        match resolve(&images, "debian") {
            Err(ClientError::MultipleMatches { search }) => assert_eq!(search, "debian"),
            other => panic!("expected MultipleMatches, got {other:?}"),
        }
    }

    #[test]
    fn unique_partial_resolves() {
        let images = catalog();
        assert_eq!(resolve(&images, "alpine").unwrap().name, "alpine-3.19");
    }

    #[test]
    fn partial_id_resolves() {
        let images = catalog();
        assert_eq!(resolve(&images, "f6").unwrap().name, "ubuntu-jammy");
    }

    #[test]
    fn no_match_is_zero_matches() {
        let images = catalog();
        let err = resolve(&images, "freebsd").unwrap_err();
        assert!(matches!(err, ClientError::ZeroMatches { ref search } if search == "freebsd"));
        assert_eq!(err.to_string(), "unable to find freebsd, zero matches");
    }

    #[test]
    fn empty_catalog_is_zero_matches() {
        assert!(matches!(
            resolve(&[], "anything"),
            Err(ClientError::ZeroMatches { .. })
        ));
    }

    #[test]
    fn find_by_name_requires_exact_name() {
        let images = catalog();
        assert_eq!(find_by_name(&images, "debian-11").unwrap().id, "3d4e5f");
        let err = find_by_name(&images, "debian").unwrap_err();
        assert!(matches!(err, ClientError::NotFound { ref what } if what == "debian"));
    }

    #[test]
    fn find_by_name_first_wins() {
        let images = vec![image("1", "dup", "1"), image("2", "dup", "1")];
        assert_eq!(find_by_name(&images, "dup").unwrap().id, "1");
    }

    #[test]
    fn most_recent_uses_semantic_order() {
        let images = vec![
            image("old", "debian", "v1.2.0"),
            image("new", "debian", "v1.10.0"),
        ];
        assert_eq!(most_recent(&images, "debian").unwrap().id, "new");
    }

    #[test]
    fn most_recent_matches_by_substring() {
        let images = catalog();
        assert_eq!(most_recent(&images, "ubuntu").unwrap().name, "ubuntu-jammy");
        assert_eq!(most_recent(&images, "debian").unwrap().name, "debian-11");
    }

    #[test]
    fn most_recent_tie_keeps_first() {
        let images = vec![
            image("first", "rocky-9", "v9.3.0"),
            image("second", "rocky-9-cloud", "v9.3.0+build2"),
        ];
        assert_eq!(most_recent(&images, "rocky").unwrap().id, "first");
    }

    #[test]
    fn most_recent_prefers_valid_over_malformed() {
        let images = vec![
            image("bad", "fedora-rawhide", "rawhide"),
            image("good", "fedora-39", "39"),
            image("worse", "fedora-next", ""),
        ];
        assert_eq!(most_recent(&images, "fedora").unwrap().id, "good");
    }

    #[test]
    fn most_recent_release_beats_prerelease() {
        let images = vec![
            image("rc", "opensuse", "v15.6.0-rc.1"),
            image("ga", "opensuse", "v15.6.0"),
        ];
        assert_eq!(most_recent(&images, "opensuse").unwrap().id, "ga");
    }

    #[test]
    fn most_recent_not_found_names_search() {
        let images = catalog();
        let err = most_recent(&images, "nonexistent").unwrap_err();
        assert_eq!(err.to_string(), "nonexistent image not found");
    }
}
