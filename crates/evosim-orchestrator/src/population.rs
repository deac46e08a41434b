//! Display state of the current creature set.

use evosim_anim::{GridLayout, SurfaceSize};
use evosim_protocol::{CreatureId, CreatureRecord};
use serde::Serialize;

/// The current generation's creatures plus how they are laid out.
///
/// Until the population is sorted each creature sits in the grid cell of
/// its id; afterwards it sits in the cell of its rank. After the cull
/// display, creatures flagged `willDie` are shown as removed.
#[derive(Debug, Clone, Default)]
pub struct Population {
    creatures: Vec<CreatureRecord>,
    sorted: bool,
    culled: bool,
}

/// One occupied grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayCell {
    pub id: CreatureId,
    pub cell: usize,
    pub removed: bool,
}

impl Population {
    /// A freshly installed set, laid out by id.
    pub fn fresh(creatures: Vec<CreatureRecord>) -> Self {
        Self {
            creatures,
            sorted: false,
            culled: false,
        }
    }

    pub fn records(&self) -> &[CreatureRecord] {
        &self.creatures
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn is_culled(&self) -> bool {
        self.culled
    }

    pub(crate) fn mark_sorted(&mut self) {
        self.sorted = true;
    }

    pub(crate) fn mark_culled(&mut self) {
        self.culled = true;
    }

    /// `(id, rank)` for every creature; unranked creatures keep their id.
    pub fn id_rank_pairs(&self) -> impl Iterator<Item = (CreatureId, usize)> + '_ {
        self.creatures
            .iter()
            .map(|c| (c.id, c.rank.unwrap_or_else(|| c.id.index())))
    }

    fn layout_key(&self, creature: &CreatureRecord) -> usize {
        match (self.sorted, creature.rank) {
            (true, Some(rank)) => rank,
            _ => creature.id.index(),
        }
    }

    /// Grid cell of every creature under the current display state.
    pub fn cells(&self) -> Vec<DisplayCell> {
        self.creatures
            .iter()
            .map(|c| DisplayCell {
                id: c.id,
                cell: self.layout_key(c),
                removed: self.culled && c.will_die == Some(true),
            })
            .collect()
    }

    pub fn layout(&self, surface: SurfaceSize) -> GridLayout {
        GridLayout::for_surface(self.creatures.len(), surface)
    }

    /// The creature shown in grid cell `cell`.
    pub fn creature_in_cell(&self, cell: usize) -> Option<&CreatureRecord> {
        self.creatures.iter().find(|c| self.layout_key(c) == cell)
    }

    /// The creature under pixel `(x, y)` on `surface`.
    pub fn creature_at(&self, x: f64, y: f64, surface: SurfaceSize) -> Option<&CreatureRecord> {
        let cell = self.layout(surface).cell_at(x, y, surface)?;
        self.creature_in_cell(cell)
    }

    pub fn get(&self, id: CreatureId) -> Option<&CreatureRecord> {
        self.creatures.iter().find(|c| c.id == id)
    }
}

/// Text lines shown next to a previewed creature.
pub fn creature_info(creature: &CreatureRecord) -> Vec<String> {
    let mut lines = vec![
        format!("Creature {}", creature.id),
        format!("Class {}", creature.morphology()),
    ];
    if let Some(rank) = creature.rank {
        lines.push(format!("Ranked #{}", rank + 1));
    }
    if let Some(fitness) = creature.fitness {
        lines.push(format!("Fitness: {fitness:.4}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scored(id: u32, rank: usize, will_die: bool) -> CreatureRecord {
        let mut c = CreatureRecord::new(CreatureId(id));
        c.fitness = Some(10.0 - rank as f64);
        c.rank = Some(rank);
        c.will_die = Some(will_die);
        c
    }

    fn reversed(n: u32) -> Population {
        Population::fresh(
            (0..n)
                .map(|id| scored(id, (n - 1 - id) as usize, id < n / 2))
                .collect(),
        )
    }

    #[test]
    fn laid_out_by_id_until_sorted() {
        let mut population = reversed(4);
        let cells: Vec<usize> = population.cells().iter().map(|c| c.cell).collect();
        assert_eq!(cells, vec![0, 1, 2, 3]);

        population.mark_sorted();
        let cells: Vec<usize> = population.cells().iter().map(|c| c.cell).collect();
        assert_eq!(cells, vec![3, 2, 1, 0]);
    }

    #[test]
    fn cull_marks_doomed_cells() {
        let mut population = reversed(4);
        population.mark_sorted();
        assert!(population.cells().iter().all(|c| !c.removed));

        population.mark_culled();
        let removed: Vec<CreatureId> = population
            .cells()
            .iter()
            .filter(|c| c.removed)
            .map(|c| c.id)
            .collect();
        assert_eq!(removed, vec![CreatureId(0), CreatureId(1)]);
    }

    #[test]
    fn hit_test_follows_layout_key() {
        let surface = SurfaceSize::new(300.0, 300.0);
        let mut population = reversed(4);
        // 2x2 grid on a square surface with 100px spacing; cell 0 spans 50..150 on both axes.
        let first = population.creature_at(100.0, 100.0, surface).unwrap();
        assert_eq!(first.id, CreatureId(0));

        population.mark_sorted();
        let first = population.creature_at(100.0, 100.0, surface).unwrap();
        assert_eq!(first.rank, Some(0));
        assert_eq!(first.id, CreatureId(3));

        assert!(population.creature_at(5.0, 5.0, surface).is_none());
    }

    #[test]
    fn info_lines() {
        let mut creature = CreatureRecord::new(CreatureId(7));
        creature.nodes = vec![json!({}); 4];
        creature.muscles = vec![json!({}); 5];
        assert_eq!(creature_info(&creature), vec!["Creature 7", "Class n4m5"]);

        creature.rank = Some(0);
        creature.fitness = Some(12.345_67);
        assert_eq!(
            creature_info(&creature),
            vec!["Creature 7", "Class n4m5", "Ranked #1", "Fitness: 12.3457"]
        );
    }
}
