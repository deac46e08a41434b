//! The orchestrator context: generation state machine plus everything it owns.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use evosim_anim::{FrameTicker, SortTransition, SurfaceSize, WatchPlayback};
use evosim_protocol::{Command, CommandTag, CreatureId, CreatureRecord};
use evosim_rpc::{EngineLink, Multiplexer};
use evosim_stats::{ensure_population_size, Error as InvariantError, GenerationRecord};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, PhaseEntered, SortProgress, StatsReady, Subscriptions};
use crate::phase::Phase;
use crate::population::Population;
use crate::preview::{play_generation, BodyFactory, Pacing, PreviewSession};
use crate::surface::SurfaceBarrier;

/// Point-in-time view of the orchestrator for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub phase: Phase,
    pub generation: usize,
    pub population: usize,
    pub history: usize,
    /// Engine command currently awaiting its response.
    pub in_flight: Option<CommandTag>,
    pub sorted: bool,
    pub culled: bool,
}

/// Owns the generation history, the current creature set and the phase.
///
/// Transitions take `&mut self`, so at most one is ever in flight. A
/// transition that fails, or whose future is dropped mid-request, puts the
/// phase and generation index back where it found them and leaves nothing
/// in flight. An autoplay cycle dropped while breeding rests in
/// `ResultsReview`, since its score is already recorded.
pub struct Orchestrator {
    rpc: Multiplexer,
    config: OrchestratorConfig,
    phase: Phase,
    generation: usize,
    history: Vec<Arc<GenerationRecord>>,
    population: Population,
    in_flight: Option<CommandTag>,
    events: EventBus,
    surface: SurfaceBarrier,
    status: watch::Sender<Status>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("population", &self.population.len())
            .field("history", &self.history.len())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(rpc: Multiplexer, config: OrchestratorConfig) -> Self {
        let surface = SurfaceBarrier::new(config.surface);
        let population = Population::default();
        let status = watch::Sender::new(Status {
            phase: Phase::Init,
            generation: 0,
            population: 0,
            history: 0,
            in_flight: None,
            sorted: false,
            culled: false,
        });

        Self {
            rpc,
            config,
            phase: Phase::Init,
            generation: 0,
            history: Vec::new(),
            population,
            in_flight: None,
            events: EventBus::new(),
            surface,
            status,
        }
    }

    /// Start a multiplexer on `link` and wrap it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(link: EngineLink, config: OrchestratorConfig) -> Self {
        let rpc = Multiplexer::spawn(link, config.rpc.clone());
        Self::new(rpc, config)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Every generation record so far, oldest first. Append-only.
    pub fn history(&self) -> &[Arc<GenerationRecord>] {
        &self.history
    }

    pub fn creatures(&self) -> &[CreatureRecord] {
        self.population.records()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn rpc(&self) -> &Multiplexer {
        &self.rpc
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> Subscriptions {
        self.events.subscribe()
    }

    /// Watch status snapshots; a new one is published on every change.
    pub fn status(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface.current()
    }

    pub fn surface_barrier_mut(&mut self) -> &mut SurfaceBarrier {
        &mut self.surface
    }

    /// Resize the drawing surface through the two-phase barrier.
    pub async fn resize(&mut self, size: SurfaceSize) -> SurfaceSize {
        self.surface.resize(size).await
    }

    /// Handshake with the engine. `Init -> AwaitingStart`.
    pub async fn init(&mut self) -> Result<()> {
        self.require(Phase::Init, "Init")?;
        let key = self.config.access_key.clone();
        self.round_trip(Command::Init { key }).await?;
        self.enter(Phase::AwaitingStart);
        Ok(())
    }

    /// Create generation zero. `AwaitingStart -> Gen0Review`.
    pub async fn start(&mut self) -> Result<()> {
        self.require(Phase::AwaitingStart, "AwaitingStart")?;
        let creatures = self.fetch(Command::Start).await?;
        if creatures.is_empty() {
            return Err(self.reject(InvariantError::EmptyPopulation));
        }

        info!(creatures = creatures.len(), "Generation 0 created");
        self.population = Population::fresh(creatures);
        self.generation = 0;
        self.enter(Phase::Gen0Review);
        Ok(())
    }

    /// `Gen0Review -> ResultsPending`.
    pub fn confirm_gen0(&mut self) -> Result<()> {
        self.require(Phase::Gen0Review, "Gen0Review")?;
        self.generation = 0;
        self.enter(Phase::ResultsPending);
        Ok(())
    }

    /// Score the population. `ResultsPending -> ResultsReview`.
    pub async fn simulate(&mut self) -> Result<Arc<GenerationRecord>> {
        self.require(Phase::ResultsPending, "ResultsPending")?;
        let creatures = self.fetch(Command::Simulate).await?;
        let record = self.install_scored(creatures)?;
        self.enter(Phase::ResultsReview);
        Ok(record)
    }

    /// Animate the population from id order to rank order.
    /// `ResultsReview -> Sorting -> Sorted`.
    pub async fn sort(&mut self) -> Result<()> {
        self.require(Phase::ResultsReview, "ResultsReview")?;

        let layout = self.population.layout(self.surface.current());
        let mut transition = SortTransition::new(
            layout,
            self.population.id_rank_pairs(),
            self.config.sort_duration,
        );
        let mut sorting = self.checkpoint();
        sorting.enter(Phase::Sorting);

        let mut ticker = FrameTicker::new(sorting.config.frame_interval);
        loop {
            let elapsed = ticker.tick().await;
            let Some(step) = transition.advance(elapsed) else {
                break;
            };
            trace!(progress = step.progress, "Sort frame");
            sorting.events.sort_progress(SortProgress {
                step,
                positions: Arc::new(transition.positions()),
            });
            if step.completed {
                break;
            }
        }

        sorting.population.mark_sorted();
        sorting.enter(Phase::Sorted);
        sorting.commit();
        Ok(())
    }

    /// Show which creatures will die. `Sorted -> Culled`; no engine call.
    pub fn cull(&mut self) -> Result<()> {
        self.require(Phase::Sorted, "Sorted")?;
        self.population.mark_culled();
        self.enter(Phase::Culled);
        Ok(())
    }

    /// Breed the next generation. `Culled -> BreedingPending -> BreedingReview`.
    ///
    /// On failure the machine goes back to `Culled`.
    pub async fn reproduce(&mut self) -> Result<()> {
        self.require(Phase::Culled, "Culled")?;
        self.breed().await?;
        self.enter(Phase::BreedingReview);
        Ok(())
    }

    /// `BreedingReview -> ResultsPending` for the next generation.
    pub fn confirm_breeding(&mut self) -> Result<()> {
        self.require(Phase::BreedingReview, "BreedingReview")?;
        self.generation = self.history.len();
        self.enter(Phase::ResultsPending);
        Ok(())
    }

    /// Play every creature in turn while the engine scores the generation.
    /// `ResultsPending | BreedingReview -> Watching -> ResultsReview`.
    ///
    /// The score request goes out first; playback runs alongside it and
    /// the result is installed once both are done.
    pub async fn watch<F: BodyFactory>(&mut self, factory: &F) -> Result<Arc<GenerationRecord>> {
        let confirms_breeding = match self.phase {
            Phase::ResultsPending => false,
            Phase::BreedingReview => true,
            actual => return Err(Error::phase("ResultsPending or BreedingReview", actual)),
        };

        let mut watching = self.checkpoint();
        if confirms_breeding {
            let next = watching.history.len();
            watching.generation = next;
        }

        let bodies: Vec<F::Body> = watching
            .population
            .records()
            .iter()
            .map(|c| factory.build(c))
            .collect();
        let ids: Vec<CreatureId> = watching.population.records().iter().map(|c| c.id).collect();
        let playback = WatchPlayback::new(bodies, watching.config.watch_trial);

        watching.enter(Phase::Watching);
        watching.set_in_flight(Some(CommandTag::Simulate));

        let rpc = watching.rpc.clone();
        let surface = watching.surface.current();
        let pacing = watching.pacing();
        let events = watching.events.clone();
        let (scored, ()) = tokio::join!(
            rpc.creatures(Command::Simulate),
            play_generation(playback, ids, surface, pacing, events),
        );
        watching.set_in_flight(None);

        let creatures = scored.map_err(|e| watching.rpc_failed(CommandTag::Simulate, e))?;
        let record = watching.install_scored(creatures)?;
        watching.enter(Phase::ResultsReview);
        watching.commit();
        Ok(record)
    }

    /// One unattended generation: score, then breed.
    /// `ResultsPending | BreedingReview -> ResultsPending`.
    ///
    /// The sort and cull displays are skipped. Breeding is not requested
    /// until the score response is installed, and the cycle returns only
    /// after the bred population is installed.
    pub async fn autoplay_cycle(&mut self) -> Result<Arc<GenerationRecord>> {
        if self.phase == Phase::BreedingReview {
            self.confirm_breeding()?;
        }
        let record = self.simulate().await?;
        self.breed().await?;
        self.generation = self.history.len();
        self.enter(Phase::ResultsPending);
        Ok(record)
    }

    /// Preview session for the creature with `id`.
    pub fn preview<F: BodyFactory>(
        &self,
        id: CreatureId,
        factory: &F,
    ) -> Option<PreviewSession<F::Body>> {
        let creature = self.population.get(id)?;
        Some(self.session_for(creature, factory))
    }

    /// Preview session for the creature under pixel `(x, y)`.
    pub fn preview_at<F: BodyFactory>(
        &self,
        x: f64,
        y: f64,
        factory: &F,
    ) -> Option<PreviewSession<F::Body>> {
        let surface = self.surface.current();
        let creature = self.population.creature_at(x, y, surface)?;
        Some(self.session_for(creature, factory))
    }

    fn session_for<F: BodyFactory>(
        &self,
        creature: &CreatureRecord,
        factory: &F,
    ) -> PreviewSession<F::Body> {
        PreviewSession::new(
            creature,
            factory.build(creature),
            self.surface.current(),
            self.pacing(),
        )
    }

    fn pacing(&self) -> Pacing {
        Pacing {
            frame_interval: self.config.frame_interval,
            sim_step: self.config.sim_step,
            max_catch_up_steps: self.config.max_catch_up_steps,
        }
    }

    /// Request and install the next generation from the current phase.
    /// On failure the machine returns to that phase.
    async fn breed(&mut self) -> Result<()> {
        let mut breeding = self.checkpoint();
        breeding.enter(Phase::BreedingPending);

        let bred = breeding.fetch(Command::Reproduce).await?;
        ensure_population_size(breeding.population.len(), bred.len())
            .map_err(|e| breeding.reject(e))?;

        debug!(creatures = bred.len(), "Installed bred generation");
        breeding.population = Population::fresh(bred);
        breeding.commit();
        Ok(())
    }

    /// Validate a scored set, record it, and make it current.
    ///
    /// Nothing is touched unless every check passes.
    fn install_scored(&mut self, creatures: Vec<CreatureRecord>) -> Result<Arc<GenerationRecord>> {
        ensure_population_size(self.population.len(), creatures.len())
            .map_err(|e| self.reject(e))?;
        let record = GenerationRecord::compute(self.generation, &creatures)
            .map(Arc::new)
            .map_err(|e| self.reject(e))?;

        info!(
            generation = record.generation,
            population = record.population,
            best = record.best.fitness,
            median = record.median.fitness,
            worst = record.worst.fitness,
            "Generation scored"
        );

        self.history.push(Arc::clone(&record));
        self.population = Population::fresh(creatures);
        self.events.stats_ready(StatsReady {
            record: Arc::clone(&record),
        });
        Ok(record)
    }

    async fn round_trip(&mut self, command: Command) -> Result<()> {
        let tag = command.tag();
        let rpc = self.rpc.clone();
        let mut request = self.checkpoint();
        request.set_in_flight(Some(tag));
        let result = rpc.send(command).await;
        drop(request);
        result.map(drop).map_err(|e| self.rpc_failed(tag, e))
    }

    async fn fetch(&mut self, command: Command) -> Result<Vec<CreatureRecord>> {
        let tag = command.tag();
        let rpc = self.rpc.clone();
        let mut request = self.checkpoint();
        request.set_in_flight(Some(tag));
        let result = rpc.creatures(command).await;
        drop(request);
        result.map_err(|e| self.rpc_failed(tag, e))
    }

    fn checkpoint(&mut self) -> Checkpoint<'_> {
        Checkpoint {
            resume_phase: self.phase,
            resume_generation: self.generation,
            committed: false,
            orchestrator: self,
        }
    }

    fn rpc_failed(&self, tag: CommandTag, e: evosim_rpc::Error) -> Error {
        error!(%tag, phase = %self.phase, error = %e, "Engine request failed");
        e.into()
    }

    fn reject(&self, e: InvariantError) -> Error {
        error!(phase = %self.phase, error = %e, "Rejected engine creature set");
        e.into()
    }

    fn require(&self, expected: Phase, name: &'static str) -> Result<()> {
        if self.phase != expected {
            return Err(Error::phase(name, self.phase));
        }
        Ok(())
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, generation = self.generation, "Phase transition");
        self.phase = phase;
        self.events.phase_entered(PhaseEntered {
            phase,
            generation: self.generation,
        });
        self.publish();
    }

    fn set_in_flight(&mut self, tag: Option<CommandTag>) {
        self.in_flight = tag;
        self.publish();
    }

    fn publish(&self) {
        self.status.send_replace(Status {
            phase: self.phase,
            generation: self.generation,
            population: self.population.len(),
            history: self.history.len(),
            in_flight: self.in_flight,
            sorted: self.population.is_sorted(),
            culled: self.population.is_culled(),
        });
    }
}

/// Puts the phase and generation index back when dropped uncommitted, and
/// always clears the in-flight request.
struct Checkpoint<'a> {
    orchestrator: &'a mut Orchestrator,
    resume_phase: Phase,
    resume_generation: usize,
    committed: bool,
}

impl Checkpoint<'_> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl Deref for Checkpoint<'_> {
    type Target = Orchestrator;

    fn deref(&self) -> &Orchestrator {
        &*self.orchestrator
    }
}

impl DerefMut for Checkpoint<'_> {
    fn deref_mut(&mut self) -> &mut Orchestrator {
        &mut *self.orchestrator
    }
}

impl Drop for Checkpoint<'_> {
    fn drop(&mut self) {
        let orchestrator = &mut *self.orchestrator;
        orchestrator.in_flight = None;
        if self.committed
            || (orchestrator.phase == self.resume_phase
                && orchestrator.generation == self.resume_generation)
        {
            orchestrator.publish();
            return;
        }

        debug!(from = %orchestrator.phase, to = %self.resume_phase, "Rolling back transition");
        orchestrator.generation = self.resume_generation;
        orchestrator.enter(self.resume_phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{orchestrator, ready, CrawlerFactory, Fault};
    use evosim_anim::GridLayout;
    use std::time::Duration;

    #[tokio::test]
    async fn handshake_and_gen0() {
        let mut orchestrator = orchestrator(6, Fault::None);
        let mut phases = orchestrator.events().subscribe_phase();

        orchestrator.init().await.unwrap();
        assert_eq!(orchestrator.phase(), Phase::AwaitingStart);
        orchestrator.start().await.unwrap();
        assert_eq!(orchestrator.phase(), Phase::Gen0Review);
        assert_eq!(orchestrator.creatures().len(), 6);

        orchestrator.confirm_gen0().unwrap();
        assert_eq!(orchestrator.generation(), 0);

        let seen: Vec<Phase> = std::iter::from_fn(|| phases.try_recv().ok())
            .map(|e| e.phase)
            .collect();
        assert_eq!(
            seen,
            vec![Phase::AwaitingStart, Phase::Gen0Review, Phase::ResultsPending]
        );
    }

    #[tokio::test]
    async fn out_of_order_transition_is_rejected() {
        let mut orchestrator = orchestrator(4, Fault::None);
        let err = orchestrator.simulate().await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPhase {
                expected: "ResultsPending",
                actual: Phase::Init
            }
        ));
        assert!(matches!(orchestrator.cull(), Err(Error::InvalidPhase { .. })));
        assert_eq!(orchestrator.phase(), Phase::Init);
    }

    #[tokio::test]
    async fn simulate_records_generation() {
        let mut orchestrator = ready(6, Fault::None).await;
        let mut stats = orchestrator.events().subscribe_stats();

        let record = orchestrator.simulate().await.unwrap();
        assert_eq!(orchestrator.phase(), Phase::ResultsReview);
        assert_eq!(record.best.rank, Some(0));
        assert_eq!(record.best.id, CreatureId(5));
        assert_eq!(record.worst.rank, Some(5));
        assert_eq!(record.histogram.total(), 6);
        assert_eq!(orchestrator.history().len(), 1);
        assert!(!orchestrator.population().is_sorted());

        let event = stats.try_recv().unwrap();
        assert!(Arc::ptr_eq(&event.record, &record));
    }

    #[tokio::test(start_paused = true)]
    async fn full_generation_cycle() {
        let mut orchestrator = ready(6, Fault::None).await;
        orchestrator.simulate().await.unwrap();

        let mut sort = orchestrator.events().subscribe_sort();
        orchestrator.sort().await.unwrap();
        assert_eq!(orchestrator.phase(), Phase::Sorted);
        assert!(orchestrator.population().is_sorted());

        let frames: Vec<SortProgress> = std::iter::from_fn(|| sort.try_recv().ok()).collect();
        assert_eq!(frames.iter().filter(|f| f.step.completed).count(), 1);
        assert!(frames.last().unwrap().step.completed);

        let layout = GridLayout::for_surface(6, orchestrator.surface());
        for (id, point) in frames[0].positions.iter() {
            assert_eq!(*point, layout.cell(id.index()));
        }
        for (id, point) in frames.last().unwrap().positions.iter() {
            assert_eq!(*point, layout.cell(5 - id.index()));
        }

        orchestrator.cull().unwrap();
        let removed = orchestrator
            .population()
            .cells()
            .iter()
            .filter(|c| c.removed)
            .count();
        assert_eq!(removed, 3);

        orchestrator.reproduce().await.unwrap();
        assert_eq!(orchestrator.phase(), Phase::BreedingReview);
        assert_eq!(orchestrator.creatures().len(), 6);
        assert!(!orchestrator.population().is_culled());

        orchestrator.confirm_breeding().unwrap();
        assert_eq!(orchestrator.phase(), Phase::ResultsPending);
        assert_eq!(orchestrator.generation(), 1);

        let record = orchestrator.simulate().await.unwrap();
        assert_eq!(record.generation, 1);
        assert_eq!(orchestrator.history().len(), 2);
    }

    #[tokio::test]
    async fn invalid_ranks_leave_history_untouched() {
        let mut orchestrator = ready(6, Fault::DuplicateRanks).await;
        let before: Vec<CreatureRecord> = orchestrator.creatures().to_vec();

        let err = orchestrator.simulate().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Invariant(evosim_stats::Error::InvalidRanks(_))
        ));
        assert_eq!(orchestrator.phase(), Phase::ResultsPending);
        assert!(orchestrator.history().is_empty());
        assert_eq!(orchestrator.creatures(), &before[..]);
    }

    #[tokio::test(start_paused = true)]
    async fn shrinking_breed_reverts_to_culled() {
        let mut orchestrator = ready(6, Fault::ShrinkOnBreed).await;
        orchestrator.simulate().await.unwrap();
        orchestrator.sort().await.unwrap();
        orchestrator.cull().unwrap();

        let err = orchestrator.reproduce().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Invariant(evosim_stats::Error::PopulationSizeChanged {
                expected: 6,
                actual: 5
            })
        ));
        assert_eq!(orchestrator.phase(), Phase::Culled);
        assert!(orchestrator.population().is_culled());
    }

    #[tokio::test]
    async fn engine_loss_keeps_phase() {
        let mut orchestrator = ready(6, Fault::HangUpOnSimulate).await;
        let err = orchestrator.simulate().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rpc(evosim_rpc::Error::EngineUnavailable(_))
        ));
        assert_eq!(orchestrator.phase(), Phase::ResultsPending);
        assert!(orchestrator.status().borrow().in_flight.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_breed_returns_to_culled() {
        let mut orchestrator = ready(6, Fault::IgnoreReproduce).await;
        orchestrator.simulate().await.unwrap();
        orchestrator.sort().await.unwrap();
        orchestrator.cull().unwrap();

        let waited = tokio::time::timeout(Duration::from_secs(5), orchestrator.reproduce()).await;
        assert!(waited.is_err());
        assert_eq!(orchestrator.phase(), Phase::Culled);
        assert!(orchestrator.population().is_culled());
        assert!(orchestrator.status().borrow().in_flight.is_none());
        assert_eq!(orchestrator.rpc().pending_count(), 0);

        // The same control is accepted again.
        let retried = tokio::time::timeout(Duration::from_secs(5), orchestrator.reproduce()).await;
        assert!(retried.is_err());
        assert_eq!(orchestrator.phase(), Phase::Culled);
        assert_eq!(orchestrator.rpc().pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_sort_returns_to_review() {
        let mut orchestrator = ready(6, Fault::None).await;
        orchestrator.simulate().await.unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(50), orchestrator.sort()).await;
        assert!(waited.is_err());
        assert_eq!(orchestrator.phase(), Phase::ResultsReview);
        assert!(!orchestrator.population().is_sorted());

        orchestrator.sort().await.unwrap();
        assert_eq!(orchestrator.phase(), Phase::Sorted);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_watch_restores_breeding_review() {
        let mut orchestrator = ready(4, Fault::HangUpOnRescore).await;
        orchestrator.simulate().await.unwrap();
        orchestrator.sort().await.unwrap();
        orchestrator.cull().unwrap();
        orchestrator.reproduce().await.unwrap();
        assert_eq!(orchestrator.generation(), 0);

        let err = orchestrator.watch(&CrawlerFactory).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rpc(evosim_rpc::Error::EngineUnavailable(_))
        ));
        assert_eq!(orchestrator.phase(), Phase::BreedingReview);
        assert_eq!(orchestrator.generation(), 0);
        assert_eq!(orchestrator.history().len(), 1);

        let status = orchestrator.status().borrow().clone();
        assert_eq!(status.phase, Phase::BreedingReview);
        assert_eq!(status.generation, 0);
        assert_eq!(status.in_flight, None);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_scores_while_playing() {
        let mut orchestrator = ready(4, Fault::None).await;
        let mut previews = orchestrator.events().subscribe_preview();

        let record = orchestrator.watch(&CrawlerFactory).await.unwrap();
        assert_eq!(orchestrator.phase(), Phase::ResultsReview);
        assert_eq!(record.population, 4);
        assert!(!orchestrator.population().is_sorted());

        let watched: Vec<usize> = std::iter::from_fn(|| previews.try_recv().ok())
            .filter_map(|u| u.watch.map(|w| w.index))
            .collect();
        assert_eq!(watched.first(), Some(&0));
        assert_eq!(watched.last(), Some(&3));
    }

    #[tokio::test]
    async fn watch_requires_resting_phase() {
        let mut orchestrator = orchestrator(4, Fault::None);
        let err = orchestrator.watch(&CrawlerFactory).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPhase { actual: Phase::Init, .. }));
    }

    #[tokio::test]
    async fn autoplay_cycle_advances_generation() {
        let mut orchestrator = ready(6, Fault::None).await;

        orchestrator.autoplay_cycle().await.unwrap();
        assert_eq!(orchestrator.phase(), Phase::ResultsPending);
        assert_eq!(orchestrator.generation(), 1);

        let record = orchestrator.autoplay_cycle().await.unwrap();
        assert_eq!(record.generation, 1);
        assert_eq!(orchestrator.generation(), 2);
        assert_eq!(orchestrator.history().len(), 2);
    }

    #[tokio::test]
    async fn status_snapshot_follows_transitions() {
        let mut orchestrator = ready(6, Fault::None).await;
        let status = orchestrator.status();
        orchestrator.simulate().await.unwrap();

        let snapshot = status.borrow().clone();
        assert_eq!(snapshot.phase, Phase::ResultsReview);
        assert_eq!(snapshot.history, 1);
        assert_eq!(snapshot.population, 6);
        assert_eq!(snapshot.in_flight, None);
    }

    #[tokio::test]
    async fn preview_picks_creature_under_pointer() {
        let orchestrator = ready(6, Fault::None).await;
        let layout = GridLayout::for_surface(6, orchestrator.surface());
        let (x, y) = layout.to_pixels(layout.cell(4), orchestrator.surface());
        let (_, vs) = layout.spacing(orchestrator.surface());

        // Hit boxes sit half a cell above the drawn cell anchor.
        let session = orchestrator
            .preview_at(x, y - vs / 2.0, &CrawlerFactory)
            .unwrap();
        assert_eq!(session.id(), CreatureId(4));
        assert!(orchestrator.preview(CreatureId(99), &CrawlerFactory).is_none());
    }
}
