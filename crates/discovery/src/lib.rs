//! Client for the ENS-keyed x402 service discovery registry.
//!
//! The registry maps `.eth` names to service records (endpoint, payment
//! scheme, network, capabilities). This crate validates input locally, talks
//! JSON over HTTP to the registry's REST API and maps its answers, including
//! structured error bodies, into typed results.
//!
//! ```no_run
//! use ens_discovery::{ClientConfig, RegistryClient, ServiceListFilters};
//!
//! # async fn run() -> Result<(), ens_discovery::DiscoveryError> {
//! let client = RegistryClient::new(ClientConfig::new("https://registry.example.com"))?;
//!
//! let resolution = client.resolve_ens_name("weather-api.eth").await?;
//! println!("{} -> {}", resolution.ens_name, resolution.service.endpoint);
//!
//! let base = client
//!     .list_services(&ServiceListFilters::new().network("eip155:8453").active(true))
//!     .await?;
//! println!("{} active services on Base", base.total);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod ens;
pub mod error;
pub mod transport;
pub mod types;

pub use client::RegistryClient;
pub use config::ClientConfig;
pub use ens::{compute_ens_node, normalize_ens_name, validate_ens_name};
pub use error::{ApiError, DiscoveryError, ErrorKind, Result};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use types::*;
