//! Service configuration.
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! relay can be configured entirely from a container's environment:
//!
//! | Flag | Environment | Default |
//! |---|---|---|
//! | `--host` | `CALLBACK_RELAY_HOST` | `0.0.0.0` |
//! | `--port` | `CALLBACK_RELAY_PORT` | `8010` |
//! | `--log-level` | `CALLBACK_RELAY_LOG_LEVEL` | `info` |
//! | `--store-backend` | `CALLBACK_RELAY_STORE_BACKEND` | `fs` |
//! | `--data-dir` | `CALLBACK_RELAY_DATA_DIR` | `./data` |
//! | `--test-namespace` | `CALLBACK_RELAY_TEST_NAMESPACE` | `false` |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::store::StoreBackend;
use crate::types::NamespaceMode;

pub const DEFAULT_PORT: u16 = 8010;

#[derive(Debug, Clone, Parser)]
#[command(name = "callback-relay")]
#[command(about = "Idempotent relay for payment and telecom provider callbacks", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind.
    #[arg(long, env = "CALLBACK_RELAY_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "CALLBACK_RELAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Log level for this service when `RUST_LOG` is unset.
    #[arg(long, env = "CALLBACK_RELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "CALLBACK_RELAY_STORE_BACKEND", value_enum, default_value_t = StoreBackend::Fs)]
    pub store_backend: StoreBackend,

    /// Root directory of the `fs` backend.
    #[arg(long, env = "CALLBACK_RELAY_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Write to the `_test` namespaces instead of production.
    #[arg(long, env = "CALLBACK_RELAY_TEST_NAMESPACE")]
    pub test_namespace: bool,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn namespace_mode(&self) -> NamespaceMode {
        if self.test_namespace {
            NamespaceMode::Test
        } else {
            NamespaceMode::Production
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> String {
        format!(
            "callback_relay={level},tower_http={level}",
            level = self.log_level
        )
    }
}
