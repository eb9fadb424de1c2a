//! Domain layer — pure types, command builders, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod command;
pub mod config;
pub mod error;
pub mod outcome;
pub mod target;

pub use command::RemoteCommandSpec;
pub use config::{DumpConfig, DumpSettings, validate_config_key, validate_config_value};
pub use error::{ConfigError, PortError, ResolveError};
pub use outcome::{DumpOutcome, FailureKind};
pub use target::{DumpRequest, DumpTarget, GuestOs, ProcessSelector, UnitMetadata, UnitRef};
