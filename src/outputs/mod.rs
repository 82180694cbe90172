//! Rendering and persisting search results.
//!
//! - [`report`]: plain-text scrap reports grouped by category or by section
//! - [`json`]: writes the raw records to a dated JSON file

pub mod json;
pub mod report;
