//! Dependency resolution.
//!
//! Kahn's algorithm with a registration-ordered ready set: among plugins
//! whose dependencies are all loaded, the one registered first loads next.
//! Two runs with the same plugin list therefore always initialise in the
//! same order.

use std::collections::BTreeSet;

use abm_core::PluginId;
use rustc_hash::FxHashMap;

use crate::error::{PluginError, PluginResult};
use crate::plugin::Plugin;

/// Positions into `plugins`, in the order their initializers must run.
///
/// Every configuration problem is reported here, before any initializer
/// could run.
pub fn resolve_load_order<I>(plugins: &[Plugin<I>]) -> PluginResult<Vec<usize>> {
    let mut position: FxHashMap<PluginId, usize> = FxHashMap::default();
    for (i, p) in plugins.iter().enumerate() {
        if position.insert(p.id(), i).is_some() {
            return Err(PluginError::DuplicatePlugin(p.id()));
        }
    }

    // dependents[d] = plugins that wait on plugin d.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); plugins.len()];
    let mut waiting: Vec<usize> = Vec::with_capacity(plugins.len());
    for (i, p) in plugins.iter().enumerate() {
        for dep in p.dependencies() {
            let Some(&d) = position.get(dep) else {
                return Err(PluginError::MissingDependency { plugin: p.id(), dependency: *dep });
            };
            dependents[d].push(i);
        }
        waiting.push(p.dependencies().len());
    }

    let mut ready: BTreeSet<usize> = (0..plugins.len()).filter(|&i| waiting[i] == 0).collect();
    let mut order = Vec::with_capacity(plugins.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            waiting[dependent] -= 1;
            if waiting[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < plugins.len() {
        return Err(PluginError::DependencyCycle(find_cycle(plugins, &position, &waiting)));
    }
    Ok(order)
}

/// Walk unresolved dependencies from the first stuck plugin until a plugin
/// repeats; the walk from that repeat is the cycle.
fn find_cycle<I>(
    plugins: &[Plugin<I>],
    position: &FxHashMap<PluginId, usize>,
    waiting: &[usize],
) -> Vec<PluginId> {
    let Some(start) = waiting.iter().position(|&w| w > 0) else {
        return Vec::new();
    };

    let mut path: Vec<usize> = Vec::new();
    let mut current = start;
    loop {
        if let Some(at) = path.iter().position(|&p| p == current) {
            let mut cycle: Vec<PluginId> = path[at..].iter().map(|&i| plugins[i].id()).collect();
            cycle.push(plugins[current].id());
            return cycle;
        }
        path.push(current);
        // Some dependency of a stuck plugin is itself stuck.
        let stuck = plugins[current]
            .dependencies()
            .iter()
            .filter_map(|d| position.get(d).copied())
            .find(|&d| waiting[d] > 0);
        match stuck {
            Some(d) => current = d,
            None => return path.iter().map(|&i| plugins[i].id()).collect(),
        }
    }
}
