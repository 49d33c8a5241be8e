//! Server settings from the environment.
//!
//! | Variable                       | Default   |
//! |--------------------------------|-----------|
//! | `HOST`                         | `0.0.0.0` |
//! | `PORT`                         | `8080`    |
//! | `ADMIN_NAME`                   | `admin`   |
//! | `NOTIFICATION_RETENTION_HOURS` | `720`     |
//! | `CLEANUP_INTERVAL_MINUTES`     | `30`      |
//! | `BROADCAST_CAPACITY`           | `256`     |

use std::time::Duration;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Name of the admin account created at startup.
    pub admin_name: String,
    /// Notifications older than this are purged.
    pub notification_retention: Duration,
    pub cleanup_interval: Duration,
    pub broadcast_capacity: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_name: "admin".to_string(),
            notification_retention: Duration::from_secs(720 * 3600),
            cleanup_interval: Duration::from_secs(30 * 60),
            broadcast_capacity: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults
    /// with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str, default: u64| -> u64 {
            match lookup(key) {
                Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                    log::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
                    default
                }),
                None => default,
            }
        };

        let seconds = |key: &str, default: u64, unit: u64| -> Duration {
            let secs = parsed(key, default).checked_mul(unit).unwrap_or_else(|| {
                log::warn!("{} is too large, using {}", key, default);
                default * unit
            });
            Duration::from_secs(secs)
        };

        let port = u16::try_from(parsed("PORT", u64::from(defaults.port))).unwrap_or_else(|_| {
            log::warn!("PORT out of range, using {}", defaults.port);
            defaults.port
        });
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            admin_name: lookup("ADMIN_NAME")
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(defaults.admin_name),
            notification_retention: seconds("NOTIFICATION_RETENTION_HOURS", 720, 3600),
            cleanup_interval: seconds("CLEANUP_INTERVAL_MINUTES", 30, 60).max(Duration::from_secs(60)),
            broadcast_capacity: usize::try_from(parsed("BROADCAST_CAPACITY", 256))
                .unwrap_or(defaults.broadcast_capacity)
                .max(1),
        }
    }
}
