//! The SIR disease plugin.
//!
//! Every infectious agent makes contacts at exponentially distributed
//! intervals.  A contact picks a uniformly random other agent; a susceptible
//! contact is infected with probability `transmission`.  Recovery follows
//! after an exponentially distributed infectious period.

use std::sync::Arc;

use abm_sim::{
    agent_properties_plugin, agents_plugin, property_update_label, AgentIndex,
    AgentPropertiesPluginData, AgentsPluginData, DataManager, Label, LabelSet, Labeler, Partition,
    PartitionId, PluginBuilderExt, PluginData, PluginId, PropertyDefinition, PropertyId,
    PropertyUpdate, PropertyValue, Sim, SimPlugin, SimResult, ValueType, AGENT_PROPERTIES,
};
use tracing::debug;

pub const SIR: PluginId = PluginId::new("sir");

pub const STATE: PropertyId = PropertyId(0);
pub const AGE: PropertyId = PropertyId(1);

pub const SUSCEPTIBLE: u32 = 0;
pub const INFECTIOUS: u32 = 1;
pub const RECOVERED: u32 = 2;

pub const BY_STATE: PartitionId = PartitionId::new("by_state");

pub fn state(value: u32) -> LabelSet {
    LabelSet::exact([Label::Enum(value)])
}

#[derive(Clone, Debug)]
pub struct SirParameters {
    pub population:         u32,
    pub initial_infections: u32,
    /// Contacts per infectious agent per day.
    pub contact_rate:       f64,
    /// Probability a contact with a susceptible agent infects it.
    pub transmission:       f64,
    pub recovery_days:      f64,
}

impl PluginData for SirParameters {}

/// Running totals kept by the disease plugin.
#[derive(Default)]
pub struct SirStats {
    pub infections: u64,
    pub recoveries: u64,
}

impl DataManager for SirStats {}

/// Every plugin one scenario needs.
pub fn scenario(params: SirParameters) -> anyhow::Result<Vec<SimPlugin>> {
    let properties = (0..params.population)
        .fold(
            AgentPropertiesPluginData::builder()
                .define_property(
                    STATE,
                    PropertyDefinition::builder(ValueType::Enum { variants: 3 })
                        .default_value(PropertyValue::Enum(SUSCEPTIBLE))
                        .track_time(true)
                        .build()?,
                )
                .define_property(AGE, PropertyDefinition::builder(ValueType::Int).immutable().build()?),
            |b, i| b.set_value(AgentIndex(i), AGE, (i * 37 % 90) as i32),
        )
        .build()?;

    Ok(vec![
        agents_plugin(AgentsPluginData::new(params.population)),
        agent_properties_plugin(properties),
        sir_plugin(params),
        crate::report::report_plugin(),
    ])
}

fn sir_plugin(params: SirParameters) -> SimPlugin {
    SimPlugin::builder(SIR)
        .depends_on(AGENT_PROPERTIES)
        .add_data(params)
        .init(|ctx| {
            let params = ctx.plugin_data::<SirParameters>()?;
            ctx.add_data_manager(SirStats::default())?;
            ctx.add_partition(BY_STATE, Partition::new().with_labeler(Labeler::property(STATE)))?;
            ctx.subscribe_labeled(property_update_label(STATE), |sim: &mut Sim, e: &PropertyUpdate| {
                if e.current == PropertyValue::Enum(RECOVERED) {
                    sim.data_manager_mut::<SirStats>()?.recoveries += 1;
                }
                Ok(())
            })?;
            ctx.add_actor(move |sim| seed_infections(sim, params))?;
            Ok(())
        })
        .build()
}

fn seed_infections(sim: &mut Sim, params: Arc<SirParameters>) -> SimResult<()> {
    for _ in 0..params.initial_infections {
        let Some(agent) = sim.sample_partition(BY_STATE, &state(SUSCEPTIBLE), None)? else {
            break;
        };
        infect(sim, agent, Arc::clone(&params))?;
    }
    Ok(())
}

fn infect(sim: &mut Sim, agent: AgentIndex, params: Arc<SirParameters>) -> SimResult<()> {
    sim.set_property(agent, STATE, PropertyValue::Enum(INFECTIOUS))?;
    sim.data_manager_mut::<SirStats>()?.infections += 1;
    debug!(%agent, time = sim.now(), "infected");

    let recovery = sim.now() + sim.rng().exponential(params.recovery_days);
    sim.add_plan(recovery, move |sim| {
        sim.set_property(agent, STATE, PropertyValue::Enum(RECOVERED))
    })?;
    schedule_contact(sim, agent, params)
}

fn schedule_contact(sim: &mut Sim, agent: AgentIndex, params: Arc<SirParameters>) -> SimResult<()> {
    if params.contact_rate <= 0.0 {
        return Ok(());
    }
    let time = sim.now() + sim.rng().exponential(1.0 / params.contact_rate);
    sim.add_plan(time, move |sim| contact(sim, agent, params))?;
    Ok(())
}

fn contact(sim: &mut Sim, agent: AgentIndex, params: Arc<SirParameters>) -> SimResult<()> {
    if sim.property_value(agent, STATE)? != PropertyValue::Enum(INFECTIOUS) {
        return Ok(());
    }
    if let Some(other) = sim.sample_partition(BY_STATE, &LabelSet::any(), Some(agent))? {
        let susceptible = sim.partition_contains(BY_STATE, other, &state(SUSCEPTIBLE))?;
        if susceptible && sim.rng().gen_bool(params.transmission) {
            infect(sim, other, Arc::clone(&params))?;
        }
    }
    schedule_contact(sim, agent, params)
}
