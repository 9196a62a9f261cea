pub mod app;
pub mod engine;
pub mod error;
pub mod models;
pub mod processor;
pub mod report;
pub mod server;
pub mod stats;
pub mod store;

// Re-export the main entry points for convenience
pub use app::SalesRefundApp;
pub use engine::MatchingEngine;
pub use error::MatcherError;
pub use store::TransactionStore;
