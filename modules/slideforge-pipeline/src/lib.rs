pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod provision;
pub mod schema;
pub mod types;
pub mod validate;

pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use provision::{ProvisioningContext, ProvisioningSupervisor};
pub use schema::StructuredOutput;
pub use types::{FileResearchOutput, Outline, PlannerOutput, ValidatorOutput, WebResearchOutput};
