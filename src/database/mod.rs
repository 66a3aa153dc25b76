pub mod connection;
pub mod memory;
pub mod mongo;
pub mod store;

pub use store::ScoringStore;
