//! Plugin data — immutable, shareable initial state.
//!
//! Concrete plugin data types are snapshots produced by builders.  The kernel
//! stores them as `Arc<dyn PluginData>` and hands them back to the owning
//! plugin's initializer by concrete type.  Snapshots are `Send + Sync` so one
//! set of plugins can seed runs on several worker threads.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Upcasting support, implemented for every `Any + Send + Sync` type.
pub trait AnyData: Any + Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> AnyData for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marker for types usable as plugin data.
pub trait PluginData: AnyData + fmt::Debug {}

/// Recover a concrete snapshot from its erased form.
pub(crate) fn downcast<T: PluginData>(data: &Arc<dyn PluginData>) -> Option<Arc<T>> {
    Arc::clone(data).into_any().downcast::<T>().ok()
}
