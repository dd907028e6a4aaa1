//! What a plugin initializer sees.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use abm_core::{ActorId, PluginId};
use abm_plan::{PlanMode, PlanOwner};
use abm_plugin::{DataManager, Plugin, PluginBuilder, PluginData};

use crate::sim::{ACTOR_START_PRIORITY, REPORT_START_PRIORITY};
use crate::{Sim, SimResult};

/// A plugin's initializer.  Shared across threads so one plugin list can
/// seed every run of an experiment.
pub type Initializer = Arc<dyn Fn(&mut PluginContext<'_>) -> SimResult<()> + Send + Sync>;

/// The plugin type the kernel consumes.
pub type SimPlugin = Plugin<Initializer>;

/// Sugar for setting a closure as a plugin's initializer.
///
/// ```rust,ignore
/// let plugin = Plugin::builder(PluginId::new("disease"))
///     .depends_on(AGENT_PROPERTIES)
///     .init(|ctx| { ctx.add_actor(|sim| seed_infections(sim))?; Ok(()) })
///     .build();
/// ```
pub trait PluginBuilderExt {
    fn init(
        self,
        initializer: impl Fn(&mut PluginContext<'_>) -> SimResult<()> + Send + Sync + 'static,
    ) -> Self;
}

impl PluginBuilderExt for PluginBuilder<Initializer> {
    fn init(
        self,
        initializer: impl Fn(&mut PluginContext<'_>) -> SimResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.initializer(Arc::new(initializer))
    }
}

/// The simulation as seen by one plugin's initializer.
///
/// Dereferences to [`Sim`], so everything a plan can do an initializer can
/// do as well; on top of that it can read its plugin's data and register
/// data managers, actors and reports.
pub struct PluginContext<'a> {
    sim:    &'a mut Sim,
    plugin: &'a SimPlugin,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(sim: &'a mut Sim, plugin: &'a SimPlugin) -> Self {
        Self { sim, plugin }
    }

    pub fn plugin_id(&self) -> PluginId {
        self.plugin.id()
    }

    /// This plugin's data of type `T`.
    pub fn plugin_data<T: PluginData>(&self) -> SimResult<Arc<T>> {
        Ok(self.plugin.require_data::<T>()?)
    }

    /// Register a data manager owned by this plugin.
    pub fn add_data_manager<D: DataManager>(&mut self, manager: D) -> SimResult<()> {
        let owner = self.plugin.id();
        self.sim.register_data_manager(owner, manager)
    }

    /// Register an actor: `start` runs at the current time, after report
    /// start plans.  Plans the actor schedules are active by default.
    pub fn add_actor(
        &mut self,
        start: impl FnOnce(&mut Sim) -> SimResult<()> + 'static,
    ) -> SimResult<ActorId> {
        let id = self.sim.next_actor_id();
        let now = self.sim.now();
        self.sim
            .add_owned_plan(now, ACTOR_START_PRIORITY, PlanOwner::Actor(id), PlanMode::Active, start)?;
        Ok(id)
    }

    /// Register a report: `start` runs at the current time before any actor
    /// starts, so its subscriptions see everything.  Plans the report
    /// schedules are passive by default and never extend the run.
    pub fn add_report(
        &mut self,
        start: impl FnOnce(&mut Sim) -> SimResult<()> + 'static,
    ) -> SimResult<ActorId> {
        let id = self.sim.next_actor_id();
        let now = self.sim.now();
        self.sim
            .add_owned_plan(now, REPORT_START_PRIORITY, PlanOwner::Report(id), PlanMode::Active, start)?;
        Ok(id)
    }
}

impl Deref for PluginContext<'_> {
    type Target = Sim;

    fn deref(&self) -> &Sim {
        self.sim
    }
}

impl DerefMut for PluginContext<'_> {
    fn deref_mut(&mut self) -> &mut Sim {
        self.sim
    }
}
