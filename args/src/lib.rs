// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Argument parsing and launch configuration for the firewall access
//! daemon.
//!
//! [`CmdArgs`] parses the command line; [`LaunchConfiguration`] is the
//! validated form the rest of the process consumes.  The configuration
//! names the model dataset source, so the model manager a process uses
//! is decided here and nowhere else.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use clap::Parser;
use tracing::Level;

/// Default gRPC listen address.
pub const DEFAULT_GRPC_ADDRESS: &str = "[::1]:50051";

/// Default directory scanned for model datasets.
pub const DEFAULT_MODEL_DIR: &str = "/etc/fwspace/models";

/// Where the management server listens: a TCP endpoint or a local
/// Unix socket.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GrpcAddress {
    /// ip:port endpoint
    Tcp(SocketAddr),
    /// filesystem path of a unix socket
    UnixSocket(String),
}

/// Configuration for the management gRPC server.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConfigServerSection {
    /// Listen address of the query API
    pub address: GrpcAddress,
}

/// Configuration for the model manager.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModelsConfigSection {
    /// Directory holding one YAML dataset per model handle
    pub dataset_dir: PathBuf,
}

/// Configuration for the tracing / logging service.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TracingConfigSection {
    /// Maximum log level, one of error|warn|info|debug|trace
    pub level: String,
}

impl TracingConfigSection {
    /// The validated maximum level.
    #[must_use]
    pub fn level(&self) -> Level {
        Level::from_str(&self.level).unwrap_or(Level::INFO)
    }
}

/// The configuration of the daemon, computed from the command line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LaunchConfiguration {
    /// Management server section.
    pub config_server: ConfigServerSection,
    /// Model manager section.
    pub models: ModelsConfigSection,
    /// Tracing section.
    pub tracing: TracingConfigSection,
}

/// Errors resulting from invalid command lines.
#[derive(Debug, thiserror::Error)]
pub enum InvalidCmdArguments {
    /// The gRPC address neither parses as TCP nor is an absolute path.
    #[error("unusable gRPC listen address: {0}")]
    InvalidGrpcAddress(String),
    /// The log level is not one tracing knows.
    #[error("\"{0}\" is not a valid log level.  Must be one of error|warn|info|debug|trace")]
    InvalidLogLevel(String),
}

impl TryFrom<CmdArgs> for LaunchConfiguration {
    type Error = InvalidCmdArguments;

    fn try_from(value: CmdArgs) -> Result<Self, InvalidCmdArguments> {
        if Level::from_str(&value.log_level).is_err() {
            return Err(InvalidCmdArguments::InvalidLogLevel(value.log_level));
        }
        Ok(LaunchConfiguration {
            config_server: ConfigServerSection {
                address: value
                    .grpc_address()
                    .map_err(InvalidCmdArguments::InvalidGrpcAddress)?,
            },
            models: ModelsConfigSection {
                dataset_dir: value.model_dir.clone(),
            },
            tracing: TracingConfigSection {
                level: value.log_level.clone(),
            },
        })
    }
}

#[derive(Parser, serde::Serialize)]
#[command(name = "fwspaced", version)]
#[command(about = "Firewall access-domain query daemon", long_about = None)]
pub struct CmdArgs {
    /// Listen address for the query API
    #[arg(
        long,
        value_name = "ADDRESS",
        default_value = DEFAULT_GRPC_ADDRESS,
        help = "Where the query API listens: ip:port, or a socket path with --grpc-unix-socket"
    )]
    grpc_address: String,

    /// Switch the listen address to a unix socket
    #[arg(long, help = "Interpret --grpc-address as a unix socket path")]
    grpc_unix_socket: bool,

    #[arg(
        long,
        value_name = "DIR",
        default_value = DEFAULT_MODEL_DIR,
        help = "Directory with one YAML firewall rule dataset per model handle"
    )]
    model_dir: PathBuf,

    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        help = "Maximum log level in [error, warn, info, debug, trace]"
    )]
    log_level: String,
}

impl CmdArgs {
    /// Resolve the listen address for the management server.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the address is
    /// neither a TCP socket address nor an absolute socket path.
    pub fn grpc_address(&self) -> Result<GrpcAddress, String> {
        if !self.grpc_unix_socket {
            return self
                .grpc_address
                .parse::<SocketAddr>()
                .map(GrpcAddress::Tcp)
                .map_err(|e| format!("cannot listen on '{}': {e}", self.grpc_address));
        }
        // unix socket mode requires an absolute path
        if Path::new(&self.grpc_address).is_absolute() {
            Ok(GrpcAddress::UnixSocket(self.grpc_address.clone()))
        } else {
            Err(format!(
                "unix socket path '{}' must be absolute when --grpc-unix-socket is given",
                self.grpc_address
            ))
        }
    }

    /// Directory scanned for model datasets.
    #[must_use]
    pub fn model_dir(&self) -> &PathBuf {
        &self.model_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> CmdArgs {
        CmdArgs::try_parse_from(std::iter::once("fwspaced").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = LaunchConfiguration::try_from(parse(&[])).unwrap();
        assert_eq!(
            config.config_server.address,
            GrpcAddress::Tcp("[::1]:50051".parse().unwrap())
        );
        assert_eq!(config.models.dataset_dir, PathBuf::from(DEFAULT_MODEL_DIR));
        assert_eq!(config.tracing.level(), Level::INFO);
    }

    #[test]
    fn test_tcp_grpc_address() {
        let config =
            LaunchConfiguration::try_from(parse(&["--grpc-address", "127.0.0.1:7443"])).unwrap();
        assert_eq!(
            config.config_server.address,
            GrpcAddress::Tcp("127.0.0.1:7443".parse().unwrap())
        );
    }

    #[test]
    fn test_unix_socket_grpc_address() {
        let args = parse(&[
            "--grpc-address",
            "/run/fwspace/mgmt.sock",
            "--grpc-unix-socket",
        ]);
        assert_eq!(
            args.grpc_address().unwrap(),
            GrpcAddress::UnixSocket("/run/fwspace/mgmt.sock".to_string())
        );

        // a relative path is rejected
        let args = parse(&["--grpc-address", "mgmt.sock", "--grpc-unix-socket"]);
        assert!(args.grpc_address().is_err());
    }

    #[test]
    fn test_bad_tcp_address_is_rejected() {
        let err = LaunchConfiguration::try_from(parse(&["--grpc-address", "nonsense"]))
            .unwrap_err();
        assert!(matches!(err, InvalidCmdArguments::InvalidGrpcAddress(_)));
    }

    #[test]
    fn test_bad_log_level_is_rejected() {
        let err =
            LaunchConfiguration::try_from(parse(&["--log-level", "shouty"])).unwrap_err();
        assert!(matches!(err, InvalidCmdArguments::InvalidLogLevel(level) if level == "shouty"));
    }

    #[test]
    fn test_log_levels_parse() {
        for (name, level) in [
            ("error", Level::ERROR),
            ("warn", Level::WARN),
            ("info", Level::INFO),
            ("debug", Level::DEBUG),
            ("trace", Level::TRACE),
        ] {
            let config = LaunchConfiguration::try_from(parse(&["--log-level", name])).unwrap();
            assert_eq!(config.tracing.level(), level);
        }
    }
}
