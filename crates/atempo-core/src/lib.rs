//! Atempo Core - scaffold orchestration for framework projects
//!
//! This library turns a `(framework, version)` request into a working project
//! directory. It is used by the `atempo` CLI binary but has no terminal UI of
//! its own beyond the console step logger.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - template resolution, version validation,
//!   placeholder substitution, asset copying, process execution
//! - **Layer 2: Stages** - installer, post-install orchestrator, finalizer
//! - **Layer 3: Pipeline** - [`Pipeline`] drives the stages in order and owns
//!   the collaborators (step logger, project registry, compose generator)
//!
//! # Example Usage
//!
//! ```ignore
//! use atempo_core::{default_registry, ConsoleStepLogger, Options, Pipeline, YamlComposeGenerator};
//!
//! let options = Options::from_env()?;
//! let report = Pipeline::new(
//!     options,
//!     Box::new(ConsoleStepLogger::new(false)),
//!     default_registry(),
//!     Box::new(YamlComposeGenerator),
//! )
//! .run("laravel", "11")
//! .await?;
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod finalize;
pub mod framework;
pub mod installer;
pub mod pipeline;
pub mod post_install;
pub mod registry;
pub mod runtime;
pub mod steps;
pub mod templates;

// Re-export main types for convenience
pub use compose::{ComposeGenerator, YamlComposeGenerator};
pub use config::Options;
pub use error::{ScaffoldError, ScaffoldWarning};
pub use framework::{profile, profiles, FrameworkProfile};
pub use pipeline::{Pipeline, RunReport};
pub use registry::{default_registry, HomelessRegistry, JsonFileRegistry, ProjectRegistry};
pub use runtime::{DockerProbe, SystemDocker};
pub use steps::{ConsoleStepLogger, Outcome, Step, StepLogger, StepStatus};
pub use templates::{Metadata, TemplateResolver, Variables};
