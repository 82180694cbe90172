//! Record pipeline stages downstream of extraction.
//!
//! # Submodules
//!
//! - [`classify`]: Assigns each record its [`crate::models::Category`]
//! - [`dedup`]: Drops records already seen in the same invocation
//! - [`paginate`]: Drives page fetches for one term and decides when to stop
//! - [`merge`]: Combines and ranks the results of several terms

pub mod classify;
pub mod dedup;
pub mod merge;
pub mod paginate;
