//! Invariant checks on engine output.

use evosim_protocol::CreatureRecord;

use crate::error::{Error, Result};

/// Order a scored creature set by rank, best first.
///
/// Fails unless every creature carries a fitness and the ranks form a
/// permutation of `0..n`.
pub fn rank_order(creatures: &[CreatureRecord]) -> Result<Vec<&CreatureRecord>> {
    if creatures.is_empty() {
        return Err(Error::EmptyPopulation);
    }

    let n = creatures.len();
    let mut slots: Vec<Option<&CreatureRecord>> = vec![None; n];

    for creature in creatures {
        let (Some(_), Some(rank)) = (creature.fitness, creature.rank) else {
            return Err(Error::MissingScore { id: creature.id });
        };
        if rank >= n {
            return Err(Error::InvalidRanks(format!(
                "creature {} has rank {rank} in a population of {n}",
                creature.id
            )));
        }
        if let Some(holder) = slots[rank] {
            return Err(Error::InvalidRanks(format!(
                "rank {rank} held by both creature {} and creature {}",
                holder.id, creature.id
            )));
        }
        slots[rank] = Some(creature);
    }

    // n distinct ranks below n fill every slot.
    Ok(slots.into_iter().flatten().collect())
}

/// Check that a transition kept the population size.
pub fn ensure_population_size(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::PopulationSizeChanged { expected, actual });
    }
    Ok(())
}
