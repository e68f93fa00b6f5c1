//! Configuration for the frame tap.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default local-channel endpoint.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/vtap.sock";

/// Which export backend a tap instance uses for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local Unix-socket channel with the VCAM wire protocol.
    Channel,
    /// NDI video-over-IP sender.
    Ndi,
}

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Export backend, chosen once at open.
    pub backend: Backend,
    /// Local-channel settings.
    pub channel: ChannelConfig,
    /// NDI settings.
    pub ndi: NdiConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Local-channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Unix-socket path the receiver listens on.
    pub socket_path: PathBuf,
}

/// NDI sender settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NdiConfig {
    /// Stream name visible on the network.
    pub stream_name: String,
    /// Let the library clock outgoing video to the frame rate.
    pub clock_video: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Ndi,
            channel: ChannelConfig::default(),
            ndi: NdiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
        }
    }
}

impl Default for NdiConfig {
    fn default() -> Self {
        Self {
            stream_name: "vtap".into(),
            clock_video: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl TapConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = TapConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("socket_path"));
        assert!(text.contains("stream_name"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = TapConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: TapConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.backend, Backend::Ndi);
        assert_eq!(parsed.channel.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
        assert!(parsed.ndi.clock_video);
    }

    #[test]
    fn backend_parses_lowercase() {
        let cfg: TapConfig = toml::from_str("backend = \"channel\"").unwrap();
        assert_eq!(cfg.backend, Backend::Channel);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = TapConfig::load(Path::new("/nonexistent/vtap.toml"));
        assert_eq!(cfg.ndi.stream_name, "vtap");
    }
}
