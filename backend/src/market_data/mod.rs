pub mod bar_series;
pub mod expiry;
pub mod polygon;
pub mod reference;

// Re-export the Bar types for convenient access (e.g. `use crate::market_data::Bar`).
pub use bar_series::{Bar, BarSeries, BarSeriesBuilder, BarSeriesError};
pub use expiry::ExpiryBucket;
pub use polygon::{CandleSource, PolygonClient};
pub use reference::{ContractType, MarketDataApi};
