//! HTTP Client Factory
//!
//! Builds the `reqwest::Client` used by diagnosis clients, applying the
//! request timeout and optional proxy from [`ClientConfig`].

use std::time::Duration;

use crate::types::{ClientConfig, VisionError, VisionResult};

/// Build a `reqwest::Client` for the given configuration.
///
/// - `proxy_url = Some(url)` -> route all traffic through the proxy
/// - `proxy_url = None` -> explicitly disable proxies, ignoring env vars
pub fn build_http_client(config: &ClientConfig) -> VisionResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(config.timeout_secs.clamp(1, 10)));

    match config.proxy_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let proxy = reqwest::Proxy::all(url).map_err(|e| VisionError::InvalidRequest {
                message: format!("Invalid proxy URL '{}': {}", url, e),
            })?;
            builder = builder.proxy(proxy);
        }
        _ => {
            builder = builder.no_proxy();
        }
    }

    builder.build().map_err(|e| VisionError::Other {
        message: format!("Failed to build HTTP client: {}", e),
    })
}
