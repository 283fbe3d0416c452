//! JSON HTTP API for the device web UI.
//!
//! | Method | Path | Action |
//! |--------|------|--------|
//! | `GET` | `/wifi` | known networks (no keys) |
//! | `POST` | `/wifi` | add `{ssid, password, priority?, use_for_sync?}` |
//! | `DELETE` | `/wifi` | forget `{ssid}` |
//! | `GET` | `/wifilist` | scan, SSID → observed network |
//!
//! Every successful add or delete re-renders the supplicant config.
//!
//! Request handling lives in [`WifiService`] and does not touch sockets;
//! [`ApiServer`] feeds it from a `tiny_http` server thread.

mod server;

pub use server::ApiServer;

use crate::config::ConfigError;
use crate::scan::{CommandRunner, ScanError, Scanner};
use crate::store::{SettingsStore, StoreError};
use crate::wifi::{NetworkList, NetworkRecord, SupplicantConfig};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tiny_http::Method;

/// Allowed methods on `/wifi`.
const WIFI_METHODS: &str = "GET, POST, DELETE";

/// Allowed methods on `/wifilist`.
const WIFILIST_METHODS: &str = "GET";

/// A handled request, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    /// True when `body` is JSON.
    pub json: bool,
    /// `Allow` header for 405 responses.
    pub allow: Option<&'static str>,
    /// `Location` header for redirects.
    pub location: Option<&'static str>,
}

impl ApiResponse {
    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            body,
            json: true,
            allow: None,
            location: None,
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            json: false,
            allow: None,
            location: None,
        }
    }

    fn redirect(location: &'static str) -> Self {
        Self {
            location: Some(location),
            ..Self::text(302, format!("See {}", location))
        }
    }
}

/// API errors, mapped onto HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed body or invalid network settings.
    BadRequest(String),
    /// Unknown path or network.
    NotFound,
    /// Method not supported on this path.
    MethodNotAllowed(&'static str),
    /// Settings store failure.
    Store(StoreError),
    /// `wpa_cli` failure.
    Scan(ScanError),
    /// Writing the supplicant config failed.
    Io(std::io::Error),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::Store(_) | Self::Io(_) => 500,
            Self::Scan(_) => 502,
        }
    }

    fn into_response(self) -> ApiResponse {
        let mut response = ApiResponse::text(self.status(), self.to_string());
        if let Self::MethodNotAllowed(allow) = self {
            response.allow = Some(allow);
        }
        response
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            Self::NotFound => write!(f, "Not Found"),
            Self::MethodNotAllowed(_) => write!(f, "Method Not Allowed"),
            Self::Store(e) => write!(f, "Settings error: {}", e),
            Self::Scan(e) => write!(f, "Scan failed: {}", e),
            Self::Io(e) => write!(f, "Cannot write supplicant config: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Scan(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Invalid(e) => Self::BadRequest(e.to_string()),
            e => Self::Store(e),
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        Self::Scan(e)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// `POST /wifi` body.
#[derive(Deserialize)]
struct AddRequest {
    ssid: String,
    password: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    use_for_sync: bool,
}

/// `DELETE /wifi` body.
#[derive(Deserialize)]
struct DeleteRequest {
    ssid: String,
}

/// Known network as shown to the UI.
#[derive(Serialize)]
struct KnownNetwork<'a> {
    ssid: &'a str,
    priority: i32,
    use_for_sync: bool,
}

/// Owns the network list and scanner and answers API requests.
pub struct WifiService<S: SettingsStore, R: CommandRunner> {
    networks: NetworkList<S>,
    scanner: Scanner<R>,
    supplicant: SupplicantConfig,
    supplicant_path: Option<PathBuf>,
}

impl<S: SettingsStore, R: CommandRunner> WifiService<S, R> {
    /// Create a service.
    ///
    /// `supplicant_path` of `None` writes to the default supplicant path.
    pub fn new(
        networks: NetworkList<S>,
        scanner: Scanner<R>,
        supplicant: SupplicantConfig,
        supplicant_path: Option<PathBuf>,
    ) -> Self {
        Self {
            networks,
            scanner,
            supplicant,
            supplicant_path,
        }
    }

    /// The known-network list.
    pub fn networks(&self) -> &NetworkList<S> {
        &self.networks
    }

    /// Handle one request. `url` may carry a query string, which is ignored.
    pub fn handle(&mut self, method: &Method, url: &str, body: &str) -> ApiResponse {
        let path = url.split('?').next().unwrap_or(url);
        let result = match path {
            "/" if *method == Method::Get => return ApiResponse::redirect("/wifi"),
            "/wifi" | "/wifi/" => match method {
                Method::Get => self.list_known(),
                Method::Post => self.add(body),
                Method::Delete => self.delete(body),
                _ => Err(ApiError::MethodNotAllowed(WIFI_METHODS)),
            },
            "/wifilist" | "/wifilist/" => match method {
                Method::Get => self.scan(),
                _ => Err(ApiError::MethodNotAllowed(WIFILIST_METHODS)),
            },
            _ => Err(ApiError::NotFound),
        };

        result.unwrap_or_else(|e| {
            if e.status() >= 500 {
                warn!("{} {} failed: {}", method, path, e);
            }
            e.into_response()
        })
    }

    fn list_known(&self) -> Result<ApiResponse, ApiError> {
        let known: Vec<KnownNetwork<'_>> = self
            .networks
            .iter()
            .map(|r| KnownNetwork {
                ssid: &r.name,
                priority: r.priority,
                use_for_sync: r.use_for_sync,
            })
            .collect();
        Ok(ApiResponse::json(200, to_json(&known)?))
    }

    fn add(&mut self, body: &str) -> Result<ApiResponse, ApiError> {
        let request: AddRequest =
            serde_json::from_str(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let record = NetworkRecord::new(request.ssid, request.password, request.priority)?
            .with_use_for_sync(request.use_for_sync);
        let name = record.name.clone();

        self.networks.add(record)?;
        self.write_supplicant_config()?;

        info!("Network {:?} added via API", name);
        Ok(ApiResponse::text(201, "Created"))
    }

    fn delete(&mut self, body: &str) -> Result<ApiResponse, ApiError> {
        let request: DeleteRequest =
            serde_json::from_str(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

        if !self.networks.delete(&request.ssid)? {
            return Err(ApiError::NotFound);
        }
        self.write_supplicant_config()?;

        info!("Network {:?} deleted via API", request.ssid);
        Ok(ApiResponse::text(204, ""))
    }

    fn scan(&self) -> Result<ApiResponse, ApiError> {
        let networks = self.scanner.scan()?;
        Ok(ApiResponse::json(200, to_json(&networks)?))
    }

    fn write_supplicant_config(&self) -> Result<(), ApiError> {
        self.networks
            .write_supplicant_config(&self.supplicant, self.supplicant_path.as_deref())?;
        Ok(())
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Store(StoreError::Serialize(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ScanOptions;
    use crate::store::MemoryStore;
    use std::env;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Answers `scan` with `OK` and `scan_results` with fixed output.
    struct FixedRunner {
        results: Option<String>,
    }

    impl CommandRunner for FixedRunner {
        fn run(&self, _program: &str, args: &[&str]) -> Result<String, ScanError> {
            match (args.last(), &self.results) {
                (Some(&"scan"), _) => Ok("OK\n".into()),
                (Some(&"scan_results"), Some(out)) => Ok(out.clone()),
                _ => Err(ScanError::ExitStatus {
                    command: args.join(" "),
                    code: Some(255),
                }),
            }
        }
    }

    fn unique_conf_path() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        env::temp_dir().join(format!("zerostick-api-{}-{}.conf", std::process::id(), id))
    }

    fn service(
        results: Option<&str>,
    ) -> (WifiService<MemoryStore, FixedRunner>, PathBuf) {
        let path = unique_conf_path();
        let scanner = Scanner::with_runner(
            FixedRunner {
                results: results.map(str::to_string),
            },
            "wlan0",
        )
        .with_options(ScanOptions {
            settle_delay: Duration::ZERO,
            poll_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
        });
        let service = WifiService::new(
            NetworkList::new(MemoryStore::new()),
            scanner,
            SupplicantConfig::default(),
            Some(path.clone()),
        );
        (service, path)
    }

    const ADD_HOME: &str = r#"{"ssid":"Home","password":"supersecret","priority":10}"#;

    // ==================== /wifi Tests ====================

    #[test]
    fn test_list_empty() {
        let (mut svc, _) = service(None);
        let response = svc.handle(&Method::Get, "/wifi", "");
        assert_eq!(response.status, 200);
        assert!(response.json);
        assert_eq!(response.body, "[]");
    }

    #[test]
    fn test_add_then_list() {
        let (mut svc, path) = service(None);

        let response = svc.handle(&Method::Post, "/wifi", ADD_HOME);
        assert_eq!(response.status, 201);

        let response = svc.handle(&Method::Get, "/wifi?refresh=1", "");
        assert_eq!(response.status, 200);
        let list: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(list[0]["ssid"], "Home");
        assert_eq!(list[0]["priority"], 10);
        assert!(!response.body.contains("supersecret"));
        assert!(!response.body.contains("encrypted_password"));

        // Supplicant config rendered alongside
        let conf = fs::read_to_string(&path).unwrap();
        assert!(conf.contains("ssid\"Home\""));
        assert!(conf.contains("priority=10"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_add_invalid() {
        let (mut svc, _) = service(None);

        let response = svc.handle(&Method::Post, "/wifi", "{not json");
        assert_eq!(response.status, 400);

        let response = svc.handle(&Method::Post, "/wifi", r#"{"ssid":"Home","password":"short"}"#);
        assert_eq!(response.status, 400);
        assert!(svc.networks().is_empty());
    }

    #[test]
    fn test_add_empty_password_rejected() {
        let (mut svc, path) = service(None);

        let response = svc.handle(&Method::Post, "/wifi", r#"{"ssid":"Cafe","password":""}"#);
        assert_eq!(response.status, 400);
        assert!(svc.networks().is_empty());
        assert_eq!(svc.networks().store().writes(), 0);
        // Nothing rendered for a refused network
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_record_maps_to_bad_request() {
        let error = ApiError::from(StoreError::Invalid(ConfigError::SsidEmpty));
        assert_eq!(error.status(), 400);
        let error = ApiError::from(StoreError::Corrupt("x".into()));
        assert_eq!(error.status(), 500);
    }

    #[test]
    fn test_delete() {
        let (mut svc, path) = service(None);
        svc.handle(&Method::Post, "/wifi", ADD_HOME);

        let response = svc.handle(&Method::Delete, "/wifi", r#"{"ssid":"Home"}"#);
        assert_eq!(response.status, 204);
        assert!(svc.networks().is_empty());

        let conf = fs::read_to_string(&path).unwrap();
        assert!(!conf.contains("network={"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_delete_unknown() {
        let (mut svc, _) = service(None);
        let response = svc.handle(&Method::Delete, "/wifi", r#"{"ssid":"Nope"}"#);
        assert_eq!(response.status, 404);
        assert_eq!(svc.networks().store().writes(), 0);
    }

    #[test]
    fn test_method_not_allowed() {
        let (mut svc, _) = service(None);
        let response = svc.handle(&Method::Put, "/wifi", "");
        assert_eq!(response.status, 405);
        assert_eq!(response.allow, Some("GET, POST, DELETE"));

        let response = svc.handle(&Method::Post, "/wifilist", "");
        assert_eq!(response.status, 405);
        assert_eq!(response.allow, Some("GET"));
    }

    // ==================== /wifilist Tests ====================

    #[test]
    fn test_scan_list() {
        let (mut svc, _) = service(Some(
            "bssid / frequency / signal level / flags / ssid\n\
             aa:bb:cc:dd:ee:ff\t2412\t-40\t[WPA2-PSK-CCMP][ESS]\tMy Home Net\n\
             aa:bb:cc:dd:ee:00\t2412\t-60\t[ESS]\tOpen\n",
        ));
        let response = svc.handle(&Method::Get, "/wifilist", "");
        assert_eq!(response.status, 200);

        let map: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(map["My Home Net"]["bssid"], "aa:bb:cc:dd:ee:ff");
        assert!(map.get("Open").is_none());
    }

    #[test]
    fn test_scan_failure_is_bad_gateway() {
        let (mut svc, _) = service(None);
        let response = svc.handle(&Method::Get, "/wifilist", "");
        assert_eq!(response.status, 502);
    }

    // ==================== Routing Tests ====================

    #[test]
    fn test_root_redirects() {
        let (mut svc, _) = service(None);
        let response = svc.handle(&Method::Get, "/", "");
        assert_eq!(response.status, 302);
        assert_eq!(response.location, Some("/wifi"));
    }

    #[test]
    fn test_unknown_path() {
        let (mut svc, _) = service(None);
        assert_eq!(svc.handle(&Method::Get, "/stats", "").status, 404);
    }

    #[test]
    fn test_persist_failure_is_server_error() {
        let path = unique_conf_path();
        let scanner = Scanner::with_runner(FixedRunner { results: None }, "wlan0");
        let mut svc = WifiService::new(
            NetworkList::new(MemoryStore::new().fail_writes()),
            scanner,
            SupplicantConfig::default(),
            Some(path),
        );
        let response = svc.handle(&Method::Post, "/wifi", ADD_HOME);
        assert_eq!(response.status, 500);
    }
}
