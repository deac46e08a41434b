//! Evosim integration test support
//!
//! [`MockEngine`] stands in for the simulation engine on an in-process
//! [`EngineLink`]. It generates random morphologies, scores them with random
//! fitness, ranks them best first and breeds the surviving half, all from a
//! seeded RNG so runs are reproducible.

use evosim_protocol::{Command, CreatureId, CreatureRecord, Request, Response};
use evosim_rpc::EngineLink;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::{json, Value};
use tracing::debug;

/// Scripted engine behaviour.
#[derive(Debug)]
pub struct MockEngine {
    rng: StdRng,
    size: usize,
    population: Vec<CreatureRecord>,
    echo_ids: bool,
    rank_collision: bool,
}

impl MockEngine {
    pub fn new(seed: u64, size: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            size,
            population: Vec::new(),
            echo_ids: true,
            rank_collision: false,
        }
    }

    /// Answer without `requestId`, forcing per-tag FIFO correlation.
    #[must_use]
    pub fn without_echo(mut self) -> Self {
        self.echo_ids = false;
        self
    }

    /// Give the two best creatures the same rank in every scored set.
    #[must_use]
    pub fn with_rank_collision(mut self) -> Self {
        self.rank_collision = true;
        self
    }

    /// Run the engine on a new task and return the orchestrator side.
    pub fn spawn(mut self) -> EngineLink {
        let (link, mut endpoint) = EngineLink::channel(16);
        tokio::spawn(async move {
            while let Some(request) = endpoint.recv().await {
                let response = self.handle(&request);
                if !endpoint.post(response).await {
                    break;
                }
            }
        });
        link
    }

    /// Produce the response to one request.
    pub fn handle(&mut self, request: &Request) -> Response {
        let tag = request.tag();
        debug!(id = %request.id, %tag, "Mock engine request");

        let response = match &request.command {
            Command::Init { .. } => Response::ack(tag),
            Command::Start => {
                self.population = (0..self.size).map(|id| self.random_creature(id)).collect();
                Response::with_creatures(tag, self.population.clone())
            }
            Command::Simulate => Response::with_creatures(tag, self.score()),
            Command::Reproduce => {
                self.population = self.breed();
                Response::with_creatures(tag, self.population.clone())
            }
        };

        if self.echo_ids {
            response.echoing(request.id)
        } else {
            response
        }
    }

    fn random_creature(&mut self, id: usize) -> CreatureRecord {
        let nodes = self.rng.gen_range(3..=6);
        let muscles = self.rng.gen_range(nodes..=nodes * 2);
        let mut creature = CreatureRecord::new(CreatureId(id as u32));
        creature.nodes = (0..nodes).map(|_| self.random_node()).collect();
        creature.muscles = (0..muscles)
            .map(|_| json!({ "strength": self.rng.gen::<f64>() }))
            .collect();
        creature
    }

    fn random_node(&mut self) -> Value {
        json!({ "x": self.rng.gen_range(-1.0..1.0), "y": self.rng.gen_range(0.0..1.0) })
    }

    /// Score, rank best first and mark the bottom half to die.
    fn score(&mut self) -> Vec<CreatureRecord> {
        for creature in &mut self.population {
            creature.fitness = Some(self.rng.gen_range(-5.0..50.0));
        }
        self.population.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let n = self.population.len();
        for (rank, creature) in self.population.iter_mut().enumerate() {
            creature.rank = Some(rank);
            creature.will_die = Some(rank >= n / 2);
        }
        if self.rank_collision && n > 1 {
            self.population[1].rank = Some(0);
        }
        self.population.clone()
    }

    /// Every survivor has two children; ids restart at zero.
    fn breed(&mut self) -> Vec<CreatureRecord> {
        let survivors: Vec<CreatureRecord> = self
            .population
            .iter()
            .filter(|c| c.will_die != Some(true))
            .cloned()
            .collect();
        if survivors.is_empty() {
            return (0..self.size).map(|id| self.random_creature(id)).collect();
        }

        (0..self.size)
            .map(|id| {
                let parent = &survivors[(id / 2) % survivors.len()];
                let mut child = CreatureRecord::new(CreatureId(id as u32));
                child.nodes = parent.nodes.clone();
                child.muscles = parent.muscles.clone();
                if self.rng.gen_bool(0.1) {
                    let node = self.random_node();
                    child.nodes.push(node);
                }
                child
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evosim_protocol::RequestId;

    fn request(id: u64, command: Command) -> Request {
        Request::new(RequestId(id), command)
    }

    #[test]
    fn scored_set_is_ranked_best_first() {
        let mut engine = MockEngine::new(7, 50);
        engine.handle(&request(0, Command::Start));
        let scored = engine.handle(&request(1, Command::Simulate)).creatures.unwrap();

        assert_eq!(scored.len(), 50);
        for (rank, pair) in scored.windows(2).enumerate() {
            assert_eq!(pair[0].rank, Some(rank));
            assert!(pair[0].fitness >= pair[1].fitness);
        }
        assert_eq!(scored.iter().filter(|c| c.will_die == Some(true)).count(), 25);
    }

    #[test]
    fn breeding_keeps_size_and_resets_ids() {
        let mut engine = MockEngine::new(7, 51);
        engine.handle(&request(0, Command::Start));
        engine.handle(&request(1, Command::Simulate));
        let bred = engine.handle(&request(2, Command::Reproduce)).creatures.unwrap();

        assert_eq!(bred.len(), 51);
        assert!(bred.iter().enumerate().all(|(i, c)| c.id == CreatureId(i as u32)));
        assert!(bred.iter().all(|c| !c.is_scored()));
    }

    #[test]
    fn echo_can_be_disabled() {
        let mut engine = MockEngine::new(1, 3);
        assert_eq!(
            engine.handle(&request(9, Command::Start)).request_id,
            Some(RequestId(9))
        );

        let mut engine = MockEngine::new(1, 3).without_echo();
        assert_eq!(engine.handle(&request(9, Command::Start)).request_id, None);
    }
}
