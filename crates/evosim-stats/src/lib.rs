//! Evosim Stats
//!
//! Turns one scored creature set into an immutable [`GenerationRecord`]:
//!
//! - **Histogram**: creatures grouped by bit-identical fitness
//! - **Demographics**: creatures grouped by morphology class (`n<nodes>m<muscles>`)
//! - **Percentiles**: deciles plus finer 1-9 / 91-99 tails
//! - **Summary**: best, median and worst creature
//!
//! Records are computed once per scoring round and never recomputed.

mod error;
mod percentile;
mod record;
mod validate;

pub use error::{Error, Result};
pub use percentile::PercentileTable;
pub use record::{Demographics, GenerationRecord, Histogram, HistogramBucket};
pub use validate::{ensure_population_size, rank_order};
