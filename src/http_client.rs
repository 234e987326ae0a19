use thiserror::Error;

pub const TCP_TIMEOUT_MS: u64 = 10_000;

// Forecast payloads with alerts run tens of kilobytes.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// A completed GET: whatever status the server sent, plus the body.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Transport-level failure. Codes are negative so they never collide
/// with an HTTP status.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connection failed")]
    Connect,
    #[error("request send failed")]
    SendHeader,
    #[error("response too large")]
    TooLarge,
    #[error("response is not utf-8")]
    Encoding,
    #[error("read failed")]
    Read,
}

impl HttpError {
    pub fn code(&self) -> i32 {
        match self {
            HttpError::Connect => -1,
            HttpError::SendHeader => -2,
            HttpError::TooLarge => -8,
            HttpError::Encoding => -9,
            HttpError::Read => -11,
        }
    }
}

#[cfg(target_os = "espidf")]
pub use device::get;

#[cfg(target_os = "espidf")]
mod device {
    use super::*;
    use crate::config::HttpMode;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use log::{info, warn};

    /// Blocking GET against `host` with the scheme picked by `mode`.
    /// Certificate verification only engages in the full HTTPS mode;
    /// the no-verify mode leans on the TLS config skipping the check
    /// when no bundle is attached.
    pub fn get(host: &str, uri: &str, mode: HttpMode) -> Result<HttpResponse, HttpError> {
        let config = Configuration {
            timeout: Some(std::time::Duration::from_millis(TCP_TIMEOUT_MS)),
            use_global_ca_store: mode == HttpMode::HttpsWithCertVerif,
            crt_bundle_attach: match mode {
                HttpMode::HttpsWithCertVerif => Some(esp_idf_sys::esp_crt_bundle_attach),
                _ => None,
            },
            ..Default::default()
        };

        let connection = EspHttpConnection::new(&config).map_err(|e| {
            warn!("HTTP connection setup failed: {}", e);
            HttpError::Connect
        })?;

        use embedded_svc::http::client::Client;
        use embedded_svc::http::Method;
        let mut client = Client::wrap(connection);

        let url = format!("{}://{}{}", mode.scheme(), host, uri);
        let request = client
            .request(Method::Get, &url, &[("Accept", "application/json")])
            .map_err(|e| {
                warn!("HTTP request failed: {}", e);
                HttpError::Connect
            })?;
        let mut response = request.submit().map_err(|e| {
            warn!("HTTP send failed: {}", e);
            HttpError::SendHeader
        })?;

        let status = response.status();
        info!("HTTP GET {}{} -> status {}", mode.scheme(), host, status);

        let mut body: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = response.read(&mut buf).map_err(|e| {
                warn!("HTTP read failed: {}", e);
                HttpError::Read
            })?;
            if n == 0 {
                break;
            }
            if body.len() + n > MAX_BODY_BYTES {
                return Err(HttpError::TooLarge);
            }
            body.extend_from_slice(&buf[..n]);
        }

        let body = String::from_utf8(body).map_err(|_| HttpError::Encoding)?;
        Ok(HttpResponse { status, body })
    }
}
