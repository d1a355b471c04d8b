pub mod binance;
pub mod caching;
pub mod fixed;
pub mod routing;
pub mod util;

pub use binance::BinanceRateProvider;
pub use caching::CachingRateProvider;
pub use fixed::FixedRateProvider;
pub use routing::RoutingRateProvider;
