use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory to expose. `None` falls back to the executable's own
    /// directory at startup.
    pub root_dir: Option<PathBuf>,
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl Config {
    /// Loads the configuration from `FILELINK_*` environment variables,
    /// with defaults matching a plain `FileLink` invocation: every
    /// interface, port 80.
    pub fn load() -> Self {
        Self {
            root_dir: std::env::var_os("FILELINK_ROOT").map(PathBuf::from),
            bind_addr: parse_env("FILELINK_ADDR", IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: parse_env("FILELINK_PORT", 80),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring unparsable {name}={raw}");
                default
            }
        },
        Err(_) => default,
    }
}
