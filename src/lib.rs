pub mod api;
pub mod config;
pub mod errors;
pub mod store;
#[cfg(feature = "test-utilities")]
pub mod testing;
pub mod types;
