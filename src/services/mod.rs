pub mod cache;
pub mod filter;
pub mod pagination;
pub mod stats;

pub use cache::StatsCache;
pub use filter::{ListParams, SwapFilter};
pub use pagination::{SwapLister, SwapPage};
pub use stats::StatsAggregator;
