//! Persistence gateway for the order/payment core.
//!
//! Exposes the storage traits the orchestrator works against, plus two
//! implementations: an in-memory store for tests and the default server
//! wiring, and a PostgreSQL store using row-level transactions.
//!
//! All reads/writes of one orchestrator step happen against these traits;
//! conflicting concurrent writes surface as [`StoreError::VersionConflict`]
//! or [`StoreError::PaymentAlreadyExists`] rather than silently winning.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{BasketStore, MarketStore};
