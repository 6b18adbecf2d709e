pub mod stats;
pub mod swap;

pub use stats::{ChainStats, CurrencyStats, StatsSnapshot, TimeframeStats};
pub use swap::SwapRecord;
