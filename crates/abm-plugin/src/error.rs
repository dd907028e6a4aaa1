use abm_core::PluginId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PluginError {
    #[error("plugin {0} registered more than once")]
    DuplicatePlugin(PluginId),

    #[error("plugin {plugin} depends on {dependency}, which is not registered")]
    MissingDependency { plugin: PluginId, dependency: PluginId },

    #[error("plugin dependency cycle: {}", fmt_cycle(.0))]
    DependencyCycle(Vec<PluginId>),

    #[error("data manager {0} registered more than once")]
    DuplicateDataManager(&'static str),

    #[error("data manager {0} is not registered")]
    UnknownDataManager(&'static str),

    #[error("data manager {0} registered after the simulation started")]
    DataManagerAfterStart(&'static str),

    #[error("plugin {plugin} has no plugin data of type {data}")]
    MissingPluginData { plugin: PluginId, data: &'static str },
}

fn fmt_cycle(cycle: &[PluginId]) -> String {
    cycle.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(" -> ")
}

pub type PluginResult<T> = Result<T, PluginError>;
