pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, MergeCliConfig};
pub use config::BatchConfig;

pub use adapters::{DocxRenderer, LocalStorage};
pub use core::batch::{BatchEngine, BatchReport, ProfileOutcome};
pub use core::merge::ProfileStore;
pub use domain::model::Profile;
pub use utils::error::{CvError, Result};
