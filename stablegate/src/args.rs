use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Stable Diffusion gateway
#[derive(Debug, Parser)]
#[command(name = "stablegate", about = "HTTP gateway for a streaming Stable Diffusion generation service")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "stablegate.toml", env = "STABLEGATE_CONFIG")]
    pub config: PathBuf,

    /// Override the configured listen address
    #[arg(long, env = "STABLEGATE_LISTEN")]
    pub listen: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["stablegate"]).unwrap();
        assert_eq!(args.config, PathBuf::from("stablegate.toml"));
        assert!(args.listen.is_none());
    }

    #[test]
    fn listen_override() {
        let args = Args::try_parse_from(["stablegate", "-c", "/etc/sg.toml", "--listen", "127.0.0.1:9000"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/sg.toml"));
        assert_eq!(args.listen, Some(SocketAddr::from(([127, 0, 0, 1], 9000))));
    }
}
