pub mod batch;
pub mod compress;
pub mod fields;
pub mod merge;
pub mod photo;
pub mod text;
pub mod validate;

pub use crate::domain::model::{EducationEntry, ExperienceEntry, PhotoLayout, Profile};
pub use crate::domain::ports::{DocumentRenderer, ImageCodec, Storage};
pub use crate::utils::error::Result;
