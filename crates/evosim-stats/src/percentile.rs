//! Fitness percentile table.

use std::collections::BTreeMap;

use serde::Serialize;

/// Fitness at selected percentiles of a rank-ordered population.
///
/// Percentile 0 is the worst creature and 100 the best. Deciles come from
/// `index = min(n * (10 - p/10) / 10, n - 1)`. The tails use two separate
/// formulas: 91-99 index `floor(n * (100 - p) / 100)`, 1-9 index
/// `floor(n * (1 - p/100))`, both clamped to `[0, n - 1]`. The tails are not
/// a refinement of the decile rule; they are computed independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PercentileTable(BTreeMap<u8, f64>);

impl PercentileTable {
    /// Build the table from fitness values ordered best first.
    ///
    /// Returns an empty table for an empty slice.
    pub fn from_ordered(fitness: &[f64]) -> Self {
        let n = fitness.len();
        let mut table = BTreeMap::new();
        if n == 0 {
            return Self(table);
        }
        let at = |index: usize| fitness[index.min(n - 1)];

        for i in 0..=10usize {
            let p = (100 - i * 10) as u8;
            table.insert(p, at(n * i / 10));
        }

        for i in 1..10usize {
            table.insert((100 - i) as u8, at(n * i / 100));

            let lower = (n as f64 * (1.0 - i as f64 / 100.0)).floor();
            table.insert(i as u8, at(lower.max(0.0) as usize));
        }

        Self(table)
    }

    /// Fitness at percentile `p`, if the table has that entry.
    pub fn get(&self, p: u8) -> Option<f64> {
        self.0.get(&p).copied()
    }

    /// Decile entries, from p = 0 up to p = 100.
    pub fn deciles(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.0
            .iter()
            .filter(|(p, _)| *p % 10 == 0)
            .map(|(p, f)| (*p, *f))
    }

    /// All entries in ascending percentile order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.0.iter().map(|(p, f)| (*p, *f))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
