//! DDC/CI transaction engine and display registry.
//!
//! This crate drives the [`ddc_protocol`] frame codec over an abstract raw
//! transport, hiding the bus's unreliability from callers:
//!
//! - [`transport`] - The [`DdcTransport`] trait the platform layer implements
//! - [`engine`] - Per-display serialized get/set transactions with settle
//!   delays and retry/backoff
//! - [`registry`] - Display enumeration and handle resolution
//! - [`config`] - Tunable protocol timings with documented defaults
//! - [`errors`] - The error taxonomy surfaced to callers
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use ddc_engine::{DisplayRegistry, EngineConfig, TransactionEngine};
//! use ddc_protocol::FeatureCode;
//!
//! # async fn example(transport: Arc<dyn ddc_engine::DdcTransport>) -> Result<(), ddc_engine::DdcError> {
//! let registry = DisplayRegistry::new(transport.clone());
//! let engine = TransactionEngine::new(transport, EngineConfig::default());
//!
//! for monitor in registry.discover()? {
//!     let value = engine.get(monitor.id, FeatureCode::BRIGHTNESS).await?;
//!     println!("{}: brightness {}/{}", monitor.id, value.current, value.maximum);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod registry;
pub mod transport;

#[cfg(all(feature = "i2c-linux", target_os = "linux"))]
pub mod i2c;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig};
pub use engine::TransactionEngine;
pub use errors::DdcError;
pub use registry::{DisplayRegistry, MonitorDescriptor};
pub use transport::{DdcTransport, DisplayHandle, DisplayInfo};

#[cfg(all(feature = "i2c-linux", target_os = "linux"))]
pub use i2c::I2cDevTransport;
