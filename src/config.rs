use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub models_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub cors_origins: Option<String>,
    pub instagram_cache_ttl: Duration,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            models_dir: PathBuf::from("./models"),
            static_dir: None,
            cors_origins: None,
            instagram_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unparseable values
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(p) => p.parse().unwrap_or_else(|_| {
                warn!("[ai-or-human] Invalid PORT value, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        let models_dir = lookup("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.models_dir);

        let static_dir = lookup("STATIC_DIR").map(PathBuf::from);

        let cors_origins = lookup("CORS_ORIGINS");

        let instagram_cache_ttl = match lookup("INSTAGRAM_CACHE_TTL_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!(
                        "[ai-or-human] Invalid INSTAGRAM_CACHE_TTL_SECS value, defaulting to {}",
                        DEFAULT_CACHE_TTL_SECS
                    );
                    defaults.instagram_cache_ttl
                }
            },
            None => defaults.instagram_cache_ttl,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v.parse().unwrap_or_else(|_| {
                warn!(
                    "[ai-or-human] Invalid MAX_UPLOAD_BYTES value, defaulting to {}",
                    DEFAULT_MAX_UPLOAD_BYTES
                );
                DEFAULT_MAX_UPLOAD_BYTES
            }),
            None => defaults.max_upload_bytes,
        };

        Self {
            port,
            models_dir,
            static_dir,
            cors_origins,
            instagram_cache_ttl,
            max_upload_bytes,
        }
    }
}
