//! Configuration, planning, and the backend seam for weft.
//!
//! `weft.toml` deserializes into [`Config`], [`Plan::from_config`]
//! validates it into a [`Plan`], and [`Emitter`] implementations turn the
//! plan into files. The backend crates implement the trait; this crate
//! never depends on them.

#![warn(missing_docs)]

pub mod config;
pub mod emitter;
pub mod error;
pub mod plan;

pub use config::{Config, GithubConfig, ManifestMode, SourcehutConfig};
pub use emitter::registry::{EmitterInfo, EmitterRegistry, EmitterRegistryBuilder};
pub use emitter::{EmitError, EmitResult, Emitter, OutputFile};
pub use error::{ConfigError, Result};
pub use plan::{ConstraintSetPlan, FeaturePlan, JobPlan, PackagePlan, Plan};
