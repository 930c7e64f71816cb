//! HTTP client and server end-to-end tests.
//!
//! These tests start a real `diskimg-server` in-process on a random port
//! and drive the real `HttpTransport` client against it. No mocks.

use diskimg_client::{ClientConfig, ClientError, DiskImageClient, Transport};
use diskimg_schema::{CreateDiskImageParams, DiskImage};
use diskimg_server::{stock_images, Catalog, TestServer};

fn start_server() -> TestServer {
    TestServer::start(Catalog::new(stock_images()))
}

fn make_client(url: &str) -> DiskImageClient<diskimg_client::http::HttpTransport> {
    DiskImageClient::from_config(ClientConfig::new(url))
}

fn upload_params(name: &str) -> CreateDiskImageParams {
    CreateDiskImageParams {
        name: name.to_owned(),
        distribution: "debian".to_owned(),
        version: "12.5".to_owned(),
        source: "upload".to_owned(),
        image_sha256: "0".repeat(64),
        image_md5: "0".repeat(32),
        image_size_bytes: 10 * 1024 * 1024,
        ..Default::default()
    }
}

fn names(images: &[DiskImage]) -> Vec<String> {
    images.iter().map(|i| i.name.to_string()).collect()
}

// --- Tests ---

#[test]
fn http_e2e_list_excludes_reserved_families() {
    let server = start_server();
    let client = make_client(&server.url);

    let images = client.list(false).unwrap();
    let names = names(&images);
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|n| !n.contains("k3s") && !n.contains("talos")));
}

#[test]
fn http_e2e_custom_images_only_with_flag() {
    let server = start_server();
    let client = make_client(&server.url);

    client.create(&upload_params("my-debian")).unwrap();

    assert!(!names(&client.list(false).unwrap()).contains(&"my-debian".to_owned()));
    assert!(names(&client.list(true).unwrap()).contains(&"my-debian".to_owned()));
}

#[test]
fn http_e2e_get_by_id() {
    let server = start_server();
    let client = make_client(&server.url);

    let image = client
        .get_by_id("b1e5c2a0-0001-4000-8000-000000000002")
        .unwrap();
    assert_eq!(image.name, "ubuntu-jammy");
    assert!(image.distribution_default);
}

#[test]
fn http_e2e_get_missing_id_is_classified_404() {
    let server = start_server();
    let client = make_client(&server.url);

    match client.get_by_id("does-not-exist") {
        Err(ClientError::Transport(e)) => {
            assert!(e.is_not_found());
            assert_eq!(e.code(), Some("database_disk_image_not_found"));
        }
        other => panic!("expected 404 transport error, got {other:?}"),
    }
}

#[test]
fn http_e2e_resolve_and_select() {
    let server = start_server();
    let client = make_client(&server.url);

    assert_eq!(client.resolve("ubuntu-focal").unwrap().version, "20.04");
    assert_eq!(client.resolve("rocky").unwrap().name, "rocky-9");
    assert!(matches!(
        client.resolve("ubuntu"),
        Err(ClientError::MultipleMatches { .. })
    ));
    assert!(matches!(
        client.resolve("freebsd"),
        Err(ClientError::ZeroMatches { .. })
    ));
    assert_eq!(client.most_recent_distro("debian").unwrap().name, "debian-12");
    assert_eq!(client.most_recent_distro("ubuntu").unwrap().name, "ubuntu-jammy");
    assert!(matches!(
        client.get_by_name("k3s-v1.28"),
        Err(ClientError::NotFound { .. })
    ));
}

#[test]
fn http_e2e_create_then_delete() {
    let server = start_server();
    let client = make_client(&server.url);

    let created = client.create(&upload_params("scratch")).unwrap();
    assert_eq!(created.status, "pending");
    assert_eq!(created.image_size, 10 * 1024 * 1024);
    assert!(!created.disk_image_url.is_empty());

    let fetched = client.get_by_id(&created.id).unwrap();
    assert_eq!(fetched.name, "scratch");

    client.delete(&created.id).unwrap();
    assert!(client.get_by_id(&created.id).is_err());
}

#[test]
fn http_e2e_duplicate_create_conflicts() {
    let server = start_server();
    let client = make_client(&server.url);

    match client.create(&upload_params("debian-11")) {
        Err(ClientError::Transport(e)) => assert_eq!(e.status(), Some(409)),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn http_e2e_delete_stock_image_forbidden() {
    let server = start_server();
    let client = make_client(&server.url);

    match client.delete("b1e5c2a0-0001-4000-8000-000000000001") {
        Err(ClientError::Transport(e)) => {
            assert_eq!(e.status(), Some(403));
            assert_eq!(e.code(), Some("disk_image_not_custom"));
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn http_e2e_region_query_is_accepted() {
    let server = start_server();
    let client = DiskImageClient::from_config(ClientConfig::new(&server.url).with_region("LON1"));

    client.create(&upload_params("regional")).unwrap();
    assert!(names(&client.list(true).unwrap()).contains(&"regional".to_owned()));
}

#[test]
fn http_e2e_api_key_required_when_configured() {
    let server = TestServer::start(Catalog::new(stock_images()).with_api_key("s3cret"));

    let anonymous = make_client(&server.url);
    match anonymous.list(false) {
        Err(ClientError::Transport(e)) => assert_eq!(e.status(), Some(401)),
        other => panic!("expected 401, got {other:?}"),
    }

    let authed = DiskImageClient::from_config(ClientConfig::new(&server.url).with_api_key("s3cret"));
    assert_eq!(authed.list(false).unwrap().len(), 5);
}

#[test]
fn http_e2e_malformed_create_body_rejected() {
    let server = start_server();
    let client = make_client(&server.url);

    let err = client
        .transport()
        .post("/v2/disk_images", br#"{"name": "incomplete"}"#)
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.code(), Some("parameter_invalid"));
}

#[test]
fn http_e2e_empty_required_fields_rejected() {
    let server = start_server();
    let client = make_client(&server.url);

    let nameless = upload_params("");
    let mut versionless = upload_params("no-version");
    versionless.version.clear();
    let mut distroless = upload_params("no-distribution");
    distroless.distribution.clear();

    for params in [nameless, versionless, distroless] {
        match client.create(&params) {
            Err(ClientError::Transport(e)) => {
                assert_eq!(e.status(), Some(400));
                assert_eq!(e.code(), Some("parameter_invalid"));
            }
            other => panic!("expected 400, got {other:?}"),
        }
    }

    // The custom catalog stays decodable after rejected creates.
    assert_eq!(client.list(true).unwrap().len(), 5);
}

#[test]
fn http_e2e_connection_refused() {
    let client = make_client("http://127.0.0.1:1");
    assert!(matches!(
        client.list(false),
        Err(ClientError::Transport(diskimg_client::TransportError::Connection(_)))
    ));
}

#[test]
fn http_e2e_seeded_catalog_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join("seed.json");
    std::fs::write(
        &seed_path,
        r#"[
            {"id": "s1", "name": "debian", "version": "v1.2.0"},
            {"id": "s2", "name": "debian", "version": "v1.10.0"}
        ]"#,
    )
    .unwrap();

    let seed = std::fs::read(&seed_path).unwrap();
    let server = TestServer::start(Catalog::from_seed_json(&seed).unwrap());
    let client = make_client(&server.url);

    assert_eq!(client.most_recent_distro("debian").unwrap().id, "s2");
    assert!(server.catalog.get("s1").is_some());
}
