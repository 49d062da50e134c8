//! The report engine: data materialization, report lifecycle, scheduling,
//! and email dispatch.

pub mod error;
pub mod materializer;
pub mod metrics;
pub mod scheduler;
pub mod service;

pub use error::EngineError;
pub use materializer::Materializer;
pub use metrics::DatapointCounter;
pub use scheduler::Scheduler;
pub use service::{MailDefaults, ReportEngine};
