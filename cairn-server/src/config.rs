//! Server configuration, read once from the environment at startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;
/// Director password used when `DM_PASSWORD` is not set.
pub const DEFAULT_DM_PASSWORD: &str = "dm123";
/// Directory served at `/` when it exists.
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: SocketAddr,
    /// Password gating director logins.
    pub dm_password: String,
    /// Static asset directory; hosting is skipped if it does not exist.
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Read configuration from `PORT`, `DM_PASSWORD`, and `CAIRN_STATIC_DIR`,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let dm_password =
            std::env::var("DM_PASSWORD").unwrap_or_else(|_| DEFAULT_DM_PASSWORD.to_string());
        let static_dir = std::env::var("CAIRN_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR));

        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            dm_password,
            static_dir,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            dm_password: DEFAULT_DM_PASSWORD.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}
