pub mod classifier;
pub mod collector;
pub mod discord;
pub mod quota;
pub mod scanner;
pub mod sources;
pub mod status;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;
