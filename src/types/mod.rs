//! Shared data structures for well tracking and report generation
//!
//! - `catalog`: users and the location → cluster → well hierarchy, plus the
//!   append-only well-state history
//! - `report`: reports, their derived calculation, and per-user permissions

mod catalog;
mod report;

pub use catalog::*;
pub use report::*;
