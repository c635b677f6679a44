//! Classifiers and detectors that run on an `IndicatorFrame`.

pub mod cycle;
pub mod signals;
pub mod trend;

pub use cycle::{classify_cycle, Bias, CyclePhase, DEFAULT_REFERENCE_YEAR};
pub use signals::{detect_signals, Signal, SignalConditions, SignalKind, SignalThresholds};
pub use trend::{classify_trend, TrendLabel};
