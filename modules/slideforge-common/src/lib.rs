pub mod config;
pub mod ids;
pub mod image;
pub mod job;

pub use config::{AppConfig, ConfigError, StateStoreKind};
pub use ids::new_job_id;
pub use image::{ImageError, ImageFormat};
pub use job::{Aspect, CiSet, JobInput, JobState, JobStatus, JobStep, Sources};
