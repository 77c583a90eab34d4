//! Lifecycle management, commit driving, and diagnostics for contrib-canvas.
//!
//! The `painter` binary schedules pattern commits; the `doctor` binary
//! inspects and repairs the working copy. Both share the configuration,
//! logging, and repository-management layers in this library.

pub mod config;
pub mod doctor;
pub mod driver;
pub mod inspect;
pub mod lifecycle;
pub mod logging;
pub mod pacing;

pub use config::{CanvasConfig, ConfigError, PacingConfig};
pub use doctor::Doctor;
pub use driver::CommitDriver;
pub use lifecycle::RepoManager;
pub use pacing::PacingPolicy;
