//! Domain types for TrendCycle

pub mod bar;
pub mod timeframe;

pub use bar::{Bar, BarError, BarSeries};
pub use timeframe::{Timeframe, UnknownTimeframe};
