//! # Redirect Origin Resolution
//!
//! Works out which origin the hosted checkout page should send the customer
//! back to.

use serde::{Deserialize, Serialize};

/// Origin used when nothing else is known
pub const DEFAULT_FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Configured origins, consulted after the request headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Public URL of the application (e.g. "https://shop.example.com")
    pub public_url: Option<String>,
    /// Last-resort origin
    pub fallback_origin: String,
}

impl OriginConfig {
    pub fn new(public_url: Option<String>, fallback_origin: impl Into<String>) -> Self {
        Self {
            public_url: public_url.filter(|u| !u.trim().is_empty()),
            fallback_origin: fallback_origin.into(),
        }
    }

    /// Resolve an origin from the request's `Origin` and `Host` headers.
    ///
    /// Precedence: `Origin` → scheme-inferred `Host` → public URL → fallback.
    pub fn resolve(&self, origin_header: Option<&str>, host_header: Option<&str>) -> String {
        let resolved = non_blank(origin_header)
            .map(str::to_string)
            .or_else(|| non_blank(host_header).map(origin_from_host))
            .or_else(|| self.public_url.clone())
            .unwrap_or_else(|| self.fallback_origin.clone());
        resolved.trim().trim_end_matches('/').to_string()
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self::new(None, DEFAULT_FALLBACK_ORIGIN)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != "null")
}

/// `http://` for loopback/local hosts, `https://` for everything else
pub fn origin_from_host(host: &str) -> String {
    let scheme = if is_local_host(host) { "http" } else { "https" };
    format!("{}://{}", scheme, host)
}

/// Whether a `Host` header value points at the local machine or network
pub fn is_local_host(host: &str) -> bool {
    let name = strip_port(host).to_ascii_lowercase();
    if name == "localhost" || name.ends_with(".localhost") || name.ends_with(".local") {
        return true;
    }
    match name.parse::<std::net::IpAddr>() {
        Ok(ip) => ip.is_loopback() || ip.is_unspecified(),
        Err(_) => false,
    }
}

fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        // [::1]:3000
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
