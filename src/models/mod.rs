pub mod candle;
pub mod direction;
pub mod snapshot;
pub mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use direction::*;
pub use snapshot::IndicatorSnapshot;
pub use timeframe::Timeframe;
