//! DB-first cache-aside data access for scored stocks.
//!
//! The repository checks the persistent cache first, refetches from the
//! configured provider when stale or missing, and serves stale data when the
//! provider fails. It is the only component with shared mutable state; the
//! scoring and sector engines it drives are pure.

pub mod config;
pub mod repository;
pub mod store;

pub use config::{build_provider, ProviderKind, RepositoryConfig};
pub use repository::StockRepository;
pub use store::SqlCacheStore;
