//! helmpack Client - collaborators invoked by helmpack
//!
//! helmpack never reimplements chart rendering or image transfer. This
//! crate puts each external tool behind a trait:
//!
//! - [`ChartTool`]: fetch, dependency update, render, package and push
//!   charts (`helm`)
//! - [`ContainerRuntime`]: pull, save, load, tag, push and remove images
//!   (`docker`)
//! - [`RegistryApi`]: registry management API, for diagnostics
//!
//! The [`mock`] module provides in-memory implementations for tests.

pub mod chart_tool;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mock;
mod process;
pub mod registry;
pub mod runtime;

pub use chart_tool::{ChartTool, HelmCli, parse_packaged_path};
pub use config::{ClientConfig, DEFAULT_PROJECT, DEFAULT_RELEASE_NAME};
pub use credentials::{PASSWORD_ENV, RegistryCredentials, USER_ENV};
pub use error::{ClientError, Result};
pub use mock::{MockChartTool, MockRuntime};
pub use registry::{RegistryApi, SystemInfo, registry_host};
pub use runtime::{ContainerRuntime, DockerCli, ImageHandle, parse_load_output};
