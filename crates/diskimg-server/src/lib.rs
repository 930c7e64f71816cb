//! Reference HTTP server for the disk image API.
//!
//! Serves the four `/v2/disk_images` routes from an in-memory catalog so the
//! client and CLI can be exercised end to end without the real provider.
//! Stock images come from a seed; images created through `POST` are marked
//! custom and only listed with `?type=custom`.
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

use chrono::Utc;
use diskimg_schema::{CreateDiskImageParams, CreateDiskImageResponse, DiskImage};
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, info, warn};

const DISK_IMAGES: &str = "/v2/disk_images";

#[derive(Debug, Clone)]
struct StoredImage {
    image: DiskImage,
    custom: bool,
}

/// In-memory disk image catalog.
pub struct Catalog {
    images: RwLock<Vec<StoredImage>>,
    next_id: AtomicU64,
    api_key: Option<String>,
}

impl Catalog {
    pub fn new(stock: Vec<DiskImage>) -> Self {
        Self {
            images: RwLock::new(
                stock
                    .into_iter()
                    .map(|image| StoredImage {
                        image,
                        custom: false,
                    })
                    .collect(),
            ),
            next_id: AtomicU64::new(1),
            api_key: None,
        }
    }

    /// Require `Authorization: Bearer <key>` on every API route.
    #[must_use]
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_owned());
        self
    }

    /// Parse a JSON array of disk images, as served by `GET /v2/disk_images`.
    pub fn from_seed_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        let images: Vec<DiskImage> = serde_json::from_slice(data)?;
        Ok(Self::new(images))
    }

    pub fn list(&self, include_custom: bool) -> Vec<DiskImage> {
        let images = self.images.read().expect("catalog lock poisoned");
        images
            .iter()
            .filter(|s| include_custom || !s.custom)
            .map(|s| s.image.clone())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<DiskImage> {
        let images = self.images.read().expect("catalog lock poisoned");
        images
            .iter()
            .find(|s| s.image.id == id)
            .map(|s| s.image.clone())
    }

    /// Register a custom image. Fails with the conflicting name if one exists.
    pub fn create(&self, params: &CreateDiskImageParams) -> Result<CreateDiskImageResponse, String> {
        let mut images = self.images.write().expect("catalog lock poisoned");
        if images.iter().any(|s| s.image.name == params.name.as_str()) {
            return Err(params.name.clone());
        }

        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("00000000-0000-4000-8000-{seq:012x}");
        let now = Utc::now();
        let upload_url = format!("https://uploads.invalid/disk-images/{id}?signature=stub");
        let os = params.os.clone().unwrap_or_else(|| "linux".to_owned());
        let region = params.region.clone().unwrap_or_default();

        let image = DiskImage {
            id: id.as_str().into(),
            name: params.name.as_str().into(),
            version: params.version.clone(),
            state: "pending".to_owned(),
            initial_user: params.initial_user.clone(),
            distribution: params.distribution.clone(),
            os: Some(os.clone()),
            description: String::new(),
            label: params.name.clone(),
            disk_image_url: Some(upload_url.clone()),
            disk_image_size_bytes: Some(params.image_size_bytes),
            logo_url: None,
            created_at: Some(now),
            created_by: None,
            distribution_default: false,
        };
        images.push(StoredImage {
            image,
            custom: true,
        });

        Ok(CreateDiskImageResponse {
            id,
            name: params.name.clone(),
            distribution: params.distribution.clone(),
            version: params.version.clone(),
            os,
            region,
            status: "pending".to_owned(),
            initial_user: params.initial_user.clone(),
            disk_image_url: upload_url,
            disk_image_size_bytes: Some(params.image_size_bytes),
            logo_url: String::new(),
            image_size: params.image_size_bytes,
            created_at: Some(now),
            created_by: None,
            distribution_default: false,
        })
    }

    /// Remove a custom image. Stock images cannot be deleted.
    pub fn delete(&self, id: &str) -> Result<(), DeleteError> {
        let mut images = self.images.write().expect("catalog lock poisoned");
        let idx = images
            .iter()
            .position(|s| s.image.id == id)
            .ok_or(DeleteError::NotFound)?;
        if !images[idx].custom {
            return Err(DeleteError::NotCustom);
        }
        images.remove(idx);
        Ok(())
    }

    fn authorized(&self, req: &tiny_http::Request) -> bool {
        let Some(ref key) = self.api_key else {
            return true;
        };
        let expected = format!("Bearer {key}");
        req.headers()
            .iter()
            .any(|h| h.field.equiv("Authorization") && h.value.as_str() == expected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteError {
    NotFound,
    NotCustom,
}

/// A handful of stock images for local development.
pub fn stock_images() -> Vec<DiskImage> {
    let entries = [
        ("b1e5c2a0-0001-4000-8000-000000000001", "ubuntu-focal", "20.04", "ubuntu", false),
        ("b1e5c2a0-0001-4000-8000-000000000002", "ubuntu-jammy", "22.04", "ubuntu", true),
        ("b1e5c2a0-0001-4000-8000-000000000003", "debian-11", "11", "debian", false),
        ("b1e5c2a0-0001-4000-8000-000000000004", "debian-12", "12", "debian", true),
        ("b1e5c2a0-0001-4000-8000-000000000005", "rocky-9", "9.3", "rocky", true),
        ("b1e5c2a0-0001-4000-8000-000000000006", "k3s-v1.28", "1.28.2", "k3s", false),
        ("b1e5c2a0-0001-4000-8000-000000000007", "talos-v1.6", "1.6.0", "talos", false),
    ];
    entries
        .into_iter()
        .map(|(id, name, version, distribution, default)| DiskImage {
            id: id.into(),
            name: name.into(),
            version: version.to_owned(),
            state: "available".to_owned(),
            initial_user: Some(distribution.to_owned()),
            distribution: distribution.to_owned(),
            os: Some("linux".to_owned()),
            description: String::new(),
            label: name.to_owned(),
            disk_image_url: None,
            disk_image_size_bytes: None,
            logo_url: None,
            created_at: None,
            created_by: None,
            distribution_default: default,
        })
        .collect()
}

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid header")
}

fn respond_json(req: tiny_http::Request, code: u16, json: impl Into<Vec<u8>>) {
    let _ = req.respond(
        Response::from_data(json.into())
            .with_status_code(StatusCode(code))
            .with_header(json_header()),
    );
}

fn respond_value(req: tiny_http::Request, code: u16, value: &impl serde::Serialize) {
    match serde_json::to_vec(value) {
        Ok(body) => respond_json(req, code, body),
        Err(e) => respond_api_err(req, 500, "internal_error", &e.to_string()),
    }
}

fn respond_api_err(req: tiny_http::Request, code: u16, api_code: &str, reason: &str) {
    let body = serde_json::json!({ "code": api_code, "reason": reason });
    respond_json(req, code, body.to_string());
}

fn read_body(req: &mut tiny_http::Request) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    if req.as_reader().read_to_end(&mut body).is_ok() {
        Some(body)
    } else {
        None
    }
}

/// Split a request URL into its path and whether `type=custom` was requested.
pub fn parse_list_query(url: &str) -> (&str, bool) {
    match url.split_once('?') {
        Some((path, query)) => {
            let custom = query
                .split('&')
                .any(|pair| pair == "type=custom");
            (path, custom)
        }
        None => (url, false),
    }
}

/// First required create field that is empty, if any.
fn missing_required(params: &CreateDiskImageParams) -> Option<&'static str> {
    [
        ("name", &params.name),
        ("distribution", &params.distribution),
        ("version", &params.version),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
}

fn handle_create(catalog: &Catalog, mut req: tiny_http::Request) {
    let Some(body) = read_body(&mut req) else {
        respond_api_err(req, 500, "internal_error", "read error");
        return;
    };
    let params: CreateDiskImageParams = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!("POST {DISK_IMAGES}: {e}");
            respond_api_err(req, 400, "parameter_invalid", &e.to_string());
            return;
        }
    };
    if let Some(field) = missing_required(&params) {
        warn!("POST {DISK_IMAGES}: empty {field}");
        respond_api_err(
            req,
            400,
            "parameter_invalid",
            &format!("{field} must not be empty"),
        );
        return;
    }
    match catalog.create(&params) {
        Ok(created) => {
            info!("created {} ({})", created.name, created.id);
            respond_value(req, 200, &created);
        }
        Err(name) => respond_api_err(
            req,
            409,
            "disk_image_name_taken",
            &format!("a disk image named {name} already exists"),
        ),
    }
}

fn handle_keyed(catalog: &Catalog, req: tiny_http::Request, method: &Method, id: &str) {
    match *method {
        Method::Get => match catalog.get(id) {
            Some(image) => respond_value(req, 200, &image),
            None => respond_api_err(
                req,
                404,
                "database_disk_image_not_found",
                "The requested disk image could not be found",
            ),
        },
        Method::Delete => match catalog.delete(id) {
            Ok(()) => {
                info!("deleted {id}");
                respond_json(req, 200, r#"{"result":"success"}"#);
            }
            Err(DeleteError::NotFound) => respond_api_err(
                req,
                404,
                "database_disk_image_not_found",
                "The requested disk image could not be found",
            ),
            Err(DeleteError::NotCustom) => respond_api_err(
                req,
                403,
                "disk_image_not_custom",
                "Only custom disk images can be deleted",
            ),
        },
        _ => respond_api_err(req, 405, "method_not_allowed", "method not allowed"),
    }
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(catalog: &Catalog, req: tiny_http::Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    let (path, include_custom) = parse_list_query(&url);

    if path == "/health" && method == Method::Get {
        respond_json(req, 200, r#"{"status":"ok"}"#);
        return;
    }
    if !path.starts_with(DISK_IMAGES) {
        respond_api_err(req, 404, "not_found", "not found");
        return;
    }
    if !catalog.authorized(&req) {
        respond_api_err(req, 401, "authentication_failed", "Invalid API key");
        return;
    }

    match path.strip_prefix(DISK_IMAGES) {
        Some("" | "/") => match method {
            Method::Get => respond_value(req, 200, &catalog.list(include_custom)),
            Method::Post => handle_create(catalog, req),
            _ => respond_api_err(req, 405, "method_not_allowed", "method not allowed"),
        },
        Some(rest) => match rest.strip_prefix('/') {
            Some(id) if !id.is_empty() && !id.contains('/') => {
                handle_keyed(catalog, req, &method, id);
            }
            _ => respond_api_err(req, 404, "not_found", "not found"),
        },
        None => respond_api_err(req, 404, "not_found", "not found"),
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(catalog: &Arc<Catalog>, addr: &str) -> std::io::Result<()> {
    let server = Server::http(addr).map_err(std::io::Error::other)?;
    for request in server.incoming_requests() {
        handle_request(catalog, request);
    }
    Ok(())
}

/// A test helper that starts a diskimg-server on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}`. Drop the `TestServer` to stop
/// the server (via `Server::unblock`).
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub catalog: Arc<Catalog>,
    server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server over `catalog`. Binds to `127.0.0.1:0` (random port).
    pub fn start(catalog: Catalog) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let catalog = Arc::new(catalog);
        let cat = Arc::clone(&catalog);
        let srv = Arc::clone(&server);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                handle_request(&cat, request);
            }
        });

        Self {
            url,
            port,
            catalog,
            server,
            _handle: handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}
