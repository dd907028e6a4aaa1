//! Strongly typed, zero-cost identifier wrappers.
//!
//! Numeric ids are `Copy + Ord + Hash` so they can be used as map keys and
//! sorted collection elements without ceremony.  The inner integer is `pub`
//! to allow direct indexing into container `Vec`s, but callers should prefer
//! the `.index()` helper for clarity.
//!
//! Plugins and partitions are named rather than numbered: their ids wrap a
//! `&'static str` so error messages and logs stay readable.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID": the inner type's maximum.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

/// Generate a named ID wrapper around a `&'static str`.
macro_rules! named_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        $vis struct $name(pub &'static str);

        impl $name {
            #[inline(always)]
            pub const fn new(name: &'static str) -> Self {
                Self(name)
            }

            #[inline(always)]
            pub const fn as_str(self) -> &'static str {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.0)
            }
        }
    };
}

typed_id! {
    /// Dense index of a simulated agent.  Issued monotonically and never
    /// reused within a run.  Max ~4.3 billion agents.
    pub struct AgentIndex(u32);
}

typed_id! {
    /// Identifier of a per-agent property.
    pub struct PropertyId(u32);
}

typed_id! {
    /// Handle returned when a plan is scheduled; used for cancellation.
    pub struct PlanId(u64);
}

typed_id! {
    /// Identifier of an actor registered during plugin initialization.
    pub struct ActorId(u32);
}

typed_id! {
    /// Handle returned by the event bus for each subscription.
    pub struct SubscriptionId(u64);
}

typed_id! {
    /// Identifier of an event labeler registered with the event bus.
    pub struct EventLabelerId(u32);
}

typed_id! {
    /// Index of a scenario within an experiment.
    pub struct ScenarioId(u32);
}

typed_id! {
    /// Index of a replication of one scenario.
    pub struct ReplicationId(u32);
}

named_id! {
    /// Unique name of a plugin.
    pub struct PluginId;
}

named_id! {
    /// Unique name of a partition.
    pub struct PartitionId;
}
