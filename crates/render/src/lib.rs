//! Rendering-engine integration.
//!
//! The engine depends on rendering behavior it does not define, so the
//! capability set is a trait ([`RenderingDriver`]) and the jsreport client
//! is one implementation of it; tests substitute in-memory drivers.

pub mod driver;
pub mod entities;
pub mod error;
pub mod jsreport;

pub use driver::{CreatedReport, RenderedContent, RenderingDriver};
pub use error::RenderError;
pub use jsreport::JsReportClient;
