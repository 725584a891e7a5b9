pub mod discovery;
pub mod driver;
pub mod relocate;
pub mod report;

pub use crate::domain::model::{CandidateFile, ProcessingOutcome, RunReport};
pub use crate::domain::ports::Publisher;
pub use crate::utils::error::Result;
