//! `abm-plan` — the kernel's plan queue.
//!
//! # Crate layout
//!
//! | Module      | Contents                                               |
//! |-------------|--------------------------------------------------------|
//! | [`queue`]   | `PlanQueue<T>`, `Plan<T>`, `PlanOwner`, `PlanMode`     |
//! | [`error`]   | `PlanError`, `PlanResult<T>`                           |
//!
//! # Ordering
//!
//! Plans leave the queue in non-decreasing time.  Equal times are broken by
//! priority (lower first), then by the order in which they were scheduled:
//!
//! ```text
//! key = (time, priority, sequence)
//! ```
//!
//! The queue is payload-agnostic; the simulation stores its boxed plan
//! callbacks as `T`.

pub mod error;
pub mod queue;


pub use error::{PlanError, PlanResult};
pub use queue::{Plan, PlanMode, PlanOwner, PlanQueue};
