//! Report analysis.
//!
//! Loading of individual retry reports and their aggregation into a
//! single run summary.

pub mod aggregator;
pub mod loader;

pub use aggregator::*;
pub use loader::*;
