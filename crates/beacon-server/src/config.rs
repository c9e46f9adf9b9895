//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the Beacon control-plane server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Path prefix reserved for the signaling relay; requests under it are
    /// exempt from the access gate (default `"/signal"`).
    pub signaling_path: String,
    /// Credential to seed at startup so a fresh deployment is reachable.
    /// `None` skips seeding.
    pub bootstrap_api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            signaling_path: "/signal".into(),
            bootstrap_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
    }

    #[test]
    fn default_port_is_zero() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_signaling_path() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.signaling_path, "/signal");
    }

    #[test]
    fn default_has_no_bootstrap_key() {
        let cfg = ServerConfig::default();
        assert!(cfg.bootstrap_api_key.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig {
            host: "0.0.0.0".into(),
            port: 9090,
            signaling_path: "/relay".into(),
            bootstrap_api_key: Some("bk_dev".into()),
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.signaling_path, cfg.signaling_path);
        assert_eq!(back.bootstrap_api_key, cfg.bootstrap_api_key);
    }
}
