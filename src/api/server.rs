//! `tiny_http` front for [`WifiService`].

use super::{ApiResponse, WifiService};
use crate::scan::CommandRunner;
use crate::store::SettingsStore;
use log::{error, info, warn};
use std::io::{Cursor, Read};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server};
use zeroize::Zeroize;

/// Largest request body accepted.
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// HTTP API server.
///
/// Runs in a background thread that owns the [`WifiService`], so requests
/// are handled one at a time.
pub struct ApiServer {
    /// Server thread handle.
    handle: Option<thread::JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl ApiServer {
    /// Start the API server.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - IP address to bind to (use `None` for 0.0.0.0)
    /// * `port` - Port to listen on
    /// * `service` - Request handler, moved into the server thread
    ///
    /// # Returns
    ///
    /// A handle to the running server. Drop it to stop the server.
    pub fn start<S, R>(
        bind_addr: Option<IpAddr>,
        port: u16,
        service: WifiService<S, R>,
    ) -> Result<Self, std::io::Error>
    where
        S: SettingsStore + Send + 'static,
        R: CommandRunner + Send + 'static,
    {
        let addr = match bind_addr {
            Some(ip) => format!("{}:{}", ip, port),
            None => format!("0.0.0.0:{}", port),
        };

        let server = Server::http(&addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, format!("{}", e)))?;

        info!("WiFi API listening on http://{}/wifi", addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::spawn(move || {
            Self::run_server(server, service, shutdown_clone);
        });

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Block until the server thread exits.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_server<S, R>(server: Server, mut service: WifiService<S, R>, shutdown: Arc<AtomicBool>)
    where
        S: SettingsStore,
        R: CommandRunner,
    {
        loop {
            // Acquire pairs with the Release store in stop()
            if shutdown.load(Ordering::Acquire) {
                info!("WiFi API shutting down");
                break;
            }

            match server.recv_timeout(Duration::from_millis(100)) {
                Ok(Some(request)) => Self::serve(&mut service, request),
                Ok(None) => {
                    // Timeout, check shutdown flag and continue
                }
                Err(e) => {
                    error!("Server error: {}", e);
                    break;
                }
            }
        }
    }

    fn serve<S, R>(service: &mut WifiService<S, R>, mut request: Request)
    where
        S: SettingsStore,
        R: CommandRunner,
    {
        let mut body = String::new();
        if let Err(e) = request
            .as_reader()
            .take(MAX_BODY_BYTES)
            .read_to_string(&mut body)
        {
            let response = Response::from_string(format!("Bad Request: {}", e)).with_status_code(400);
            if let Err(e) = request.respond(response) {
                warn!("Failed to send response: {}", e);
            }
            return;
        }

        let method = request.method().clone();
        let url = request.url().to_string();
        let api_response = service.handle(&method, &url, &body);
        // Body may carry a passphrase
        body.zeroize();

        if let Err(e) = request.respond(to_http(api_response)) {
            warn!("Failed to send response: {}", e);
        }
    }

    /// Stop the server.
    ///
    /// Note: May take up to 100ms due to polling interval.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn to_http(api: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let content_type = if api.json {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    };

    let mut response = Response::from_string(api.body).with_status_code(api.status);
    let headers = [
        Some(("Content-Type", content_type)),
        api.allow.map(|v| ("Allow", v)),
        api.location.map(|v| ("Location", v)),
    ];
    for (name, value) in headers.into_iter().flatten() {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response = response.with_header(header);
        }
    }
    response
}
