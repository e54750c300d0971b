//! Brand monitoring dashboard core
//!
//! Turns a flat secret store into the runtime configuration of an external
//! multi-agent brand monitoring API, hands that API its config and
//! service-account files, and normalizes its connection-test payloads into
//! health reports.
//!
//! # Flow
//! 1. [`SecretSet`] is loaded from a `secrets.toml` file or the environment.
//! 2. [`ConfigCompiler`] validates it and builds a [`RuntimeConfig`].
//! 3. [`MonitoringSystem::bootstrap`] stages the credentials and YAML config
//!    files and constructs the external API through an [`ApiFactory`].
//! 4. [`MonitoringSystem::initialize`] brings the API up and removes the
//!    staged files.
//! 5. Connection tests go through the [`HealthAggregator`]; monitoring runs
//!    produce [`MonitoringResult`]s that can be exported as JSON or CSV.

pub mod api;
pub mod artifacts;
pub mod client;
pub mod compiler;
pub mod config;
pub mod error;
pub mod export;
pub mod health;
pub mod result;
pub mod secrets;
pub mod system;

pub use api::{ApiFactory, BrandMonitoringApi, MonitoringMode, MonitoringRequest, SearchDepth, WorkflowView};
pub use client::{RemoteApiFactory, RemoteMonitoringApi};
pub use compiler::{Compilation, ConfigCompiler, Diagnostic, DiagnosticLevel};
pub use config::{RuntimeConfig, SettingsView};
pub use error::{ApiError, ConfigError, Error, HealthCheckError, InitError, MonitoringError, Result};
pub use export::ExportFormat;
pub use health::{HealthAggregator, HealthReport, ProviderStatusPayload, SystemHealth};
pub use result::MonitoringResult;
pub use secrets::{SecretKey, SecretKind, SecretLength, SecretSet, SecretStatus, SecretsDebugInfo};
pub use system::{MonitoringSystem, Session, SystemOverview};
