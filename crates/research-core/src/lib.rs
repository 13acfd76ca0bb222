pub mod cache;
pub mod error;
pub mod traits;
pub mod types;

pub use cache::{CacheKey, CachedPayload, DataType, PeriodType};
pub use error::ResearchError;
pub use traits::{CacheStore, FundamentalsProvider};
pub use types::*;
