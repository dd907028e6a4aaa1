//! `Plugin<I>` and its fluent builder.
//!
//! ```rust
//! use abm_core::PluginId;
//! use abm_plugin::{Plugin, PluginData};
//!
//! #[derive(Debug)]
//! struct Contacts { per_day: f64 }
//! impl PluginData for Contacts {}
//!
//! let plugin: Plugin<fn()> = Plugin::builder(PluginId::new("contacts"))
//!     .depends_on(PluginId::new("agents"))
//!     .add_data(Contacts { per_day: 4.0 })
//!     .build();
//! assert_eq!(plugin.data::<Contacts>().map(|c| c.per_day), Some(4.0));
//! ```

use std::sync::Arc;

use abm_core::PluginId;

use crate::data::{downcast, PluginData};
use crate::error::{PluginError, PluginResult};

/// One unit of simulation assembly.
pub struct Plugin<I> {
    id:           PluginId,
    dependencies: Vec<PluginId>,
    data:         Vec<Arc<dyn PluginData>>,
    initializer:  Option<I>,
}

impl<I: Clone> Clone for Plugin<I> {
    fn clone(&self) -> Self {
        Self {
            id:           self.id,
            dependencies: self.dependencies.clone(),
            data:         self.data.clone(),
            initializer:  self.initializer.clone(),
        }
    }
}

impl<I> std::fmt::Debug for Plugin<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("data", &self.data)
            .field("has_initializer", &self.initializer.is_some())
            .finish()
    }
}

impl<I> Plugin<I> {
    pub fn builder(id: PluginId) -> PluginBuilder<I> {
        PluginBuilder {
            plugin: Plugin {
                id,
                dependencies: Vec::new(),
                data: Vec::new(),
                initializer: None,
            },
        }
    }

    #[inline]
    pub fn id(&self) -> PluginId {
        self.id
    }

    pub fn dependencies(&self) -> &[PluginId] {
        &self.dependencies
    }

    pub fn initializer(&self) -> Option<&I> {
        self.initializer.as_ref()
    }

    /// The first plugin data item of type `T`, if any.
    pub fn data<T: PluginData>(&self) -> Option<Arc<T>> {
        self.data.iter().find_map(downcast::<T>)
    }

    /// Like [`data`](Self::data) but reports absence as an error.
    pub fn require_data<T: PluginData>(&self) -> PluginResult<Arc<T>> {
        self.data::<T>().ok_or(PluginError::MissingPluginData {
            plugin: self.id,
            data:   std::any::type_name::<T>(),
        })
    }
}

/// Fluent builder for [`Plugin`].
pub struct PluginBuilder<I> {
    plugin: Plugin<I>,
}

impl<I> PluginBuilder<I> {
    /// Add a dependency.  Repeats are ignored.
    pub fn depends_on(mut self, dependency: PluginId) -> Self {
        if !self.plugin.dependencies.contains(&dependency) {
            self.plugin.dependencies.push(dependency);
        }
        self
    }

    pub fn add_data(mut self, data: impl PluginData) -> Self {
        self.plugin.data.push(Arc::new(data));
        self
    }

    pub fn initializer(mut self, initializer: I) -> Self {
        self.plugin.initializer = Some(initializer);
        self
    }

    pub fn build(self) -> Plugin<I> {
        self.plugin
    }
}
