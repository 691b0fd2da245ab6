//! Check modes and the strategies that compute their metrics.

pub mod catalog;
pub mod strategy;

pub use catalog::{Catalog, CounterMatch, Mode, ModeSpec, QueryTemplate};
pub use strategy::{evaluate, Clock, EvalContext, MetricRequest, Strategy, SystemClock};
