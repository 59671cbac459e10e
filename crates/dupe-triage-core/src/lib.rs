pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod progress;
pub mod scanner;
pub mod storage;

pub use config::AppConfig;
pub use engine::{PassResult, StatusCounts, TriageEngine};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use storage::models::Status;
