use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Application-level constants
pub const APP_NAME: &str = "notealign";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PORT: u16 = 8088;

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info,tower_http=info")
}

/// Server bind address, overridable via NOTEALIGN_HOST / NOTEALIGN_PORT.
/// Invalid overrides fall back to the defaults.
pub fn bind_addr() -> SocketAddr {
    let host = std::env::var("NOTEALIGN_HOST")
        .ok()
        .and_then(|v| v.parse::<IpAddr>().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let port = std::env::var("NOTEALIGN_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    SocketAddr::new(host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_notealign() {
        assert_eq!(APP_NAME, "notealign");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn default_filter_scopes_to_app() {
        assert!(default_log_filter().starts_with("notealign="));
    }
}
