//! Core logic shared by every backend
//!
//! - [`query`] - Typed transaction filters rendered by each backend
//! - [`patch`] - JSON merge patch for metadata updates
//! - [`export`] - Download and export cycles

pub mod export;
pub mod patch;
pub mod query;
