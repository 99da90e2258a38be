//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_LEVELS_PATH: &str = "levels/levels.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub levels_path: PathBuf,
}

impl ServerConfig {
    /// Read `SERVER_ADDR` and `LEVELS_PATH`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(
            std::env::var("SERVER_ADDR").ok(),
            std::env::var("LEVELS_PATH").ok(),
        )
    }

    pub fn from_vars(addr: Option<String>, levels_path: Option<String>) -> anyhow::Result<Self> {
        let addr: SocketAddr = addr
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()?;
        let levels_path: PathBuf = levels_path
            .unwrap_or_else(|| DEFAULT_LEVELS_PATH.into())
            .into();
        Ok(Self { addr, levels_path })
    }
}
