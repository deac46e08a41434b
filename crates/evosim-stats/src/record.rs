//! Generation records.

use std::collections::{BTreeMap, HashMap};

use evosim_protocol::{CreatureRecord, MorphologyClass};
use serde::Serialize;

use crate::error::Result;
use crate::percentile::PercentileTable;
use crate::validate::rank_order;

/// One histogram bucket: every creature with exactly this fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub fitness: f64,
    pub count: usize,
}

/// Fitness histogram with exact-match buckets, in first-seen order.
///
/// Continuous fitness values rarely collide, so this is close to one bucket
/// per creature unless the engine quantizes fitness.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Histogram(Vec<HistogramBucket>);

impl Histogram {
    pub fn from_fitness(values: impl IntoIterator<Item = f64>) -> Self {
        let mut buckets: Vec<HistogramBucket> = Vec::new();
        let mut index: HashMap<u64, usize> = HashMap::new();

        for fitness in values {
            match index.get(&bucket_key(fitness)) {
                Some(&i) => buckets[i].count += 1,
                None => {
                    index.insert(bucket_key(fitness), buckets.len());
                    buckets.push(HistogramBucket { fitness, count: 1 });
                }
            }
        }

        Self(buckets)
    }

    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.0
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> usize {
        self.0.iter().map(|b| b.count).sum()
    }
}

// Same-value grouping: +0.0 and -0.0 share a bucket, as do all NaNs.
fn bucket_key(fitness: f64) -> u64 {
    if fitness == 0.0 {
        0
    } else if fitness.is_nan() {
        f64::NAN.to_bits()
    } else {
        fitness.to_bits()
    }
}

/// Population counts per morphology class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Demographics(BTreeMap<MorphologyClass, usize>);

impl Demographics {
    pub fn from_creatures<'a>(creatures: impl IntoIterator<Item = &'a CreatureRecord>) -> Self {
        let mut counts = BTreeMap::new();
        for creature in creatures {
            *counts.entry(creature.morphology()).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn get(&self, class: &MorphologyClass) -> usize {
        self.0.get(class).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MorphologyClass, usize)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

/// Immutable snapshot of one scoring round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub population: usize,
    pub histogram: Histogram,
    pub demographics: Demographics,
    pub percentiles: PercentileTable,
    pub best: CreatureRecord,
    pub median: CreatureRecord,
    pub worst: CreatureRecord,
}

impl GenerationRecord {
    /// Compute the record for a scored creature set.
    ///
    /// The set is put in rank order first, so best is rank 0 and worst is
    /// rank `n - 1` regardless of the order the engine sent.
    pub fn compute(generation: usize, creatures: &[CreatureRecord]) -> Result<Self> {
        let ordered = rank_order(creatures)?;
        let n = ordered.len();

        let fitness: Vec<f64> = ordered.iter().filter_map(|c| c.fitness).collect();

        Ok(Self {
            generation,
            population: n,
            histogram: Histogram::from_fitness(fitness.iter().copied()),
            demographics: Demographics::from_creatures(ordered.iter().copied()),
            percentiles: PercentileTable::from_ordered(&fitness),
            best: ordered[0].clone(),
            median: ordered[n / 2].clone(),
            worst: ordered[n - 1].clone(),
        })
    }
}
