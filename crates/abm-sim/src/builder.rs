//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use abm_core::SimConfig;
use abm_plugin::resolve_load_order;
use tracing::{debug, info};

use crate::context::{PluginContext, SimPlugin};
use crate::output::OutputSink;
use crate::{Sim, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Inputs
///
/// | Method             | Default                                  |
/// |--------------------|------------------------------------------|
/// | `new(config)`      | required                                 |
/// | `.add_plugin(p)`   | no plugins (the run is empty)            |
/// | `.output(sink)`    | no sink; `release_output` is a no-op     |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(SimConfig::with_seed(42))
///     .add_plugin(agents_plugin(AgentsPluginData::new(1_000)))
///     .add_plugin(agent_properties_plugin(properties))
///     .add_plugin(disease_plugin())
///     .build()?;
/// let summary = sim.run()?;
/// ```
pub struct SimBuilder {
    config:  SimConfig,
    plugins: Vec<SimPlugin>,
    output:  Option<Arc<dyn OutputSink>>,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self { config, plugins: Vec::new(), output: None }
    }

    pub fn add_plugin(mut self, plugin: SimPlugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn add_plugins(mut self, plugins: impl IntoIterator<Item = SimPlugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    pub fn output(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.output = Some(sink);
        self
    }

    /// Resolve the plugin graph, then run every initializer in dependency
    /// order.
    ///
    /// Graph errors (duplicate ids, missing dependencies, cycles) are
    /// reported before any initializer runs.
    pub fn build(self) -> SimResult<Sim> {
        let order = resolve_load_order(&self.plugins)?;
        info!(
            plugins = ?order.iter().map(|&i| self.plugins[i].id().as_str()).collect::<Vec<_>>(),
            seed = self.config.seed,
            "plugin load order resolved"
        );

        let mut sim = Sim::new(self.config, self.output);
        for i in order {
            let plugin = &self.plugins[i];
            let Some(init) = plugin.initializer() else {
                continue;
            };
            debug!(plugin = %plugin.id(), "initializing");
            init(&mut PluginContext::new(&mut sim, plugin))?;
        }
        Ok(sim)
    }
}
