//! The `Sim` struct and its run loop.

use std::any::TypeId;
use std::sync::Arc;

use abm_core::{
    ActorId, Event, PlanId, PluginId, ReplicationId, ScenarioId, SimClock, SimConfig, SimRng,
    SubscriptionId,
};
use abm_event::{EventBus, EventContext, EventLabel, EventLabeler};
use abm_plan::{PlanMode, PlanOwner, PlanQueue};
use abm_plugin::{DataManager, DataManagerRegistry};
use tracing::{debug, info, trace, warn};

use crate::output::{OutputRecord, OutputSink};
use crate::partitions::Partitions;
use crate::{NoopObserver, RunSummary, SimError, SimObserver, SimResult, StopReason};

/// A deferred unit of work.  Runs once, with the clock at its time.
pub type PlanFn = Box<dyn FnOnce(&mut Sim) -> SimResult<()>>;

/// Priority of report start plans: before anything else at the same time.
pub(crate) const REPORT_START_PRIORITY: i32 = i32::MIN;
/// Priority of actor start plans: after reports, before ordinary plans.
pub(crate) const ACTOR_START_PRIORITY: i32 = i32::MIN + 1;

// ── Sim ───────────────────────────────────────────────────────────────────────

/// One simulation run.
///
/// `Sim` owns every piece of run state: clock, plan queue, event bus, data
/// managers, partitions and the run's RNG.  Nothing is global, so any
/// number of runs can coexist, one per thread.
///
/// Create via [`SimBuilder`][crate::SimBuilder]; plugin initializers see it
/// through [`PluginContext`][crate::PluginContext], plans and event handlers
/// receive `&mut Sim` directly.
pub struct Sim {
    pub(crate) config:        SimConfig,
    pub(crate) clock:         SimClock,
    pub(crate) plans:         PlanQueue<PlanFn>,
    pub(crate) events:        EventBus<Sim>,
    pub(crate) data_managers: DataManagerRegistry,
    pub(crate) partitions:    Partitions,
    pub(crate) rng:           SimRng,
    output:                   Option<Arc<dyn OutputSink>>,
    /// Owner of the plan currently executing; inherited by plans it adds.
    owner:                    PlanOwner,
    next_actor:               u32,
    started:                  bool,
    halted:                   bool,
    executed:                 u64,
}

impl Sim {
    pub(crate) fn new(config: SimConfig, output: Option<Arc<dyn OutputSink>>) -> Self {
        Self {
            rng: SimRng::new(config.seed),
            config,
            clock: SimClock::new(),
            plans: PlanQueue::new(0.0),
            events: EventBus::new(),
            data_managers: DataManagerRegistry::new(),
            partitions: Partitions::default(),
            output,
            owner: PlanOwner::Kernel,
            next_actor: 0,
            started: false,
            halted: false,
            executed: 0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn scenario(&self) -> ScenarioId {
        self.config.scenario
    }

    pub fn replication(&self) -> ReplicationId {
        self.config.replication
    }

    /// The run's random number generator.
    pub fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // ── Plans ─────────────────────────────────────────────────────────────

    /// Schedule `plan` at `time` with default priority.
    ///
    /// The plan inherits the owner of the code scheduling it.  Plans added
    /// while a report runs are passive; all others are active.
    pub fn add_plan(
        &mut self,
        time: f64,
        plan: impl FnOnce(&mut Sim) -> SimResult<()> + 'static,
    ) -> SimResult<PlanId> {
        let mode = match self.owner {
            PlanOwner::Report(_) => PlanMode::Passive,
            _ => PlanMode::Active,
        };
        self.add_plan_with(time, 0, mode, plan)
    }

    /// Schedule a plan that never keeps the simulation alive on its own.
    pub fn add_passive_plan(
        &mut self,
        time: f64,
        plan: impl FnOnce(&mut Sim) -> SimResult<()> + 'static,
    ) -> SimResult<PlanId> {
        self.add_plan_with(time, 0, PlanMode::Passive, plan)
    }

    /// Schedule with explicit priority (lower runs first among equal times)
    /// and mode.
    pub fn add_plan_with(
        &mut self,
        time: f64,
        priority: i32,
        mode: PlanMode,
        plan: impl FnOnce(&mut Sim) -> SimResult<()> + 'static,
    ) -> SimResult<PlanId> {
        let owner = self.owner;
        self.add_owned_plan(time, priority, owner, mode, plan)
    }

    /// Schedule on behalf of an explicit owner.
    pub fn add_owned_plan(
        &mut self,
        time: f64,
        priority: i32,
        owner: PlanOwner,
        mode: PlanMode,
        plan: impl FnOnce(&mut Sim) -> SimResult<()> + 'static,
    ) -> SimResult<PlanId> {
        let id = self.plans.schedule(time, priority, owner, mode, Box::new(plan))?;
        trace!(%id, time, priority, ?owner, ?mode, "plan scheduled");
        Ok(id)
    }

    /// Cancel a pending plan.  `false` if it already ran, was already
    /// cancelled, or never existed.
    pub fn cancel_plan(&mut self, id: PlanId) -> bool {
        self.plans.cancel(id)
    }

    pub fn is_plan_pending(&self, id: PlanId) -> bool {
        self.plans.is_pending(id)
    }

    /// Stop the run after the current plan returns.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub(crate) fn next_actor_id(&mut self) -> ActorId {
        let id = ActorId(self.next_actor);
        self.next_actor += 1;
        id
    }

    // ── Events ────────────────────────────────────────────────────────────

    /// Receive every event of type `E`.
    pub fn subscribe<E: Event>(
        &mut self,
        handler: impl Fn(&mut Sim, &E) -> SimResult<()> + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    /// Receive events of type `E` carrying exactly `label`.
    pub fn subscribe_labeled<E: Event>(
        &mut self,
        label: EventLabel,
        handler: impl Fn(&mut Sim, &E) -> SimResult<()> + 'static,
    ) -> SimResult<SubscriptionId> {
        Ok(self.events.subscribe_labeled(label, handler)?)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn add_event_labeler<E: Event>(&mut self, labeler: EventLabeler<E>) -> SimResult<()> {
        Ok(self.events.add_labeler(labeler)?)
    }

    /// Whether any handler would receive an `E` published now.
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.events.has_subscribers::<E>()
    }

    /// Deliver `event` synchronously.
    ///
    /// Partitions are brought up to date first, so every handler observes
    /// partitions that already reflect the event.  Handlers run depth-first;
    /// events they publish are fully delivered before this call continues.
    pub fn publish<E: Event>(&mut self, event: E) -> SimResult<()> {
        self.refresh_partitions(TypeId::of::<E>(), &event)?;
        abm_event::publish(self, event)
    }

    // ── Data managers ─────────────────────────────────────────────────────

    pub fn data_manager<D: DataManager>(&self) -> SimResult<&D> {
        Ok(self.data_managers.get::<D>()?)
    }

    pub fn data_manager_mut<D: DataManager>(&mut self) -> SimResult<&mut D> {
        Ok(self.data_managers.get_mut::<D>()?)
    }

    pub fn has_data_manager<D: DataManager>(&self) -> bool {
        self.data_managers.contains::<D>()
    }

    pub(crate) fn register_data_manager<D: DataManager>(
        &mut self,
        owner: PluginId,
        manager: D,
    ) -> SimResult<()> {
        self.data_managers.register(owner, manager)?;
        debug!(manager = std::any::type_name::<D>(), plugin = %owner, "data manager registered");
        Ok(())
    }

    // ── Output ────────────────────────────────────────────────────────────

    /// Hand a record to the output sink, stamped with this run's scenario,
    /// replication and the current time.  A no-op without a sink.
    pub fn release_output(&self, source: &'static str, values: Vec<String>) {
        if let Some(sink) = &self.output {
            sink.accept(OutputRecord {
                scenario: self.config.scenario,
                replication: self.config.replication,
                time: self.clock.now(),
                source,
                values,
            });
        }
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Execute plans until none remain, [`halt`](Self::halt) is called, or
    /// the next plan lies beyond the configured halt time.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        self.run_with(&mut NoopObserver)
    }

    pub fn run_with<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        if self.started {
            return Err(SimError::AlreadyStarted);
        }
        self.started = true;
        self.data_managers.seal();
        info!(
            seed = self.config.seed,
            scenario = %self.config.scenario,
            replication = %self.config.replication,
            pending = self.plans.len(),
            "run start"
        );
        observer.on_run_start(self.now());

        let stop = loop {
            if self.halted {
                break StopReason::Halted;
            }
            let Some(next) = self.plans.next_time() else {
                break StopReason::Exhausted;
            };
            if self.config.is_beyond_halt(next) {
                break StopReason::HaltTime;
            }
            let Some(plan) = self.plans.pop_next() else {
                break StopReason::Exhausted;
            };

            self.clock.advance_to(plan.time);
            observer.on_plan(plan.time, plan.owner);

            let outer = std::mem::replace(&mut self.owner, plan.owner);
            let result = (plan.payload)(self);
            self.owner = outer;
            if let Err(error) = result {
                warn!(time = plan.time, owner = ?plan.owner, %error, "plan failed; run aborted");
                return Err(error);
            }
            self.executed += 1;
        };

        if let Some(sink) = &self.output {
            sink.flush();
        }
        let summary = RunSummary {
            end_time:         self.now(),
            plans_executed:   self.executed,
            events_published: self.events.published(),
            stop,
        };
        info!(
            end_time = summary.end_time,
            plans = summary.plans_executed,
            events = summary.events_published,
            stop = ?summary.stop,
            "run end"
        );
        observer.on_run_end(&summary);
        Ok(summary)
    }
}

impl EventContext for Sim {
    type Error = SimError;

    fn event_bus(&self) -> &EventBus<Self> {
        &self.events
    }

    fn event_bus_mut(&mut self) -> &mut EventBus<Self> {
        &mut self.events
    }
}
