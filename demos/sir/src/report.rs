//! Daily compartment counts.

use abm_sim::{
    Equality, Filter, LabelSet, PluginBuilderExt, PluginId, Sim, SimPlugin, SimResult,
};

use crate::model::{state, SirStats, AGE, BY_STATE, INFECTIOUS, RECOVERED, SIR, SUSCEPTIBLE};

pub const SOURCE: &str = "sir_daily";

/// Column order of the `values` released by the report.
pub const COLUMNS: [&str; 6] =
    ["susceptible", "infectious", "recovered", "infectious_65_plus", "infections", "recoveries"];

pub fn report_plugin() -> SimPlugin {
    SimPlugin::builder(PluginId::new("sir_report"))
        .depends_on(SIR)
        .init(|ctx| ctx.add_report(daily).map(|_| ()))
        .build()
}

fn daily(sim: &mut Sim) -> SimResult<()> {
    let elderly = Filter::property(AGE, Equality::GreaterThanEqual, 65);
    let infectious_elderly = sim.query_partition(BY_STATE, &state(INFECTIOUS), Some(&elderly))?.len();
    let stats = sim.data_manager::<SirStats>()?;
    let values = vec![
        sim.partition_count(BY_STATE, &state(SUSCEPTIBLE))?.to_string(),
        sim.partition_count(BY_STATE, &state(INFECTIOUS))?.to_string(),
        sim.partition_count(BY_STATE, &state(RECOVERED))?.to_string(),
        infectious_elderly.to_string(),
        stats.infections.to_string(),
        stats.recoveries.to_string(),
    ];
    sim.release_output(SOURCE, values);

    debug_assert_eq!(sim.partition_count(BY_STATE, &LabelSet::any())?, sim.population()?);
    sim.add_plan(sim.now() + 1.0, daily)?;
    Ok(())
}
