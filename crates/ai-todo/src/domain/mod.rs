//! Domain facades for task management.
//!
//! These facades combine storage operations and AI calls with the
//! application's rules.

mod enrich;
mod tasks;

pub use enrich::{today, EnrichRequest, Enrichment, EnrichmentAdapter};
pub use tasks::TasksDomain;
