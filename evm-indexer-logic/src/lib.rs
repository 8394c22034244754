pub mod broker;
pub mod cache;
pub mod cursor;
pub mod enrichment;
pub mod error;
pub mod indexer;
pub mod jobs;
pub mod metrics;
pub mod node;
pub mod settings;
pub mod store;
#[cfg(test)]
pub mod test_utils;
pub mod utils;
pub mod worker;
