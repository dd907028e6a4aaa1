//! `abm-event` — the kernel's typed publish/subscribe bus.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`bus`]     | `EventBus<C>`, `EventContext`, `publish`                     |
//! | [`label`]   | `EventLabel`, `EventLabeler<E>`                              |
//! | [`error`]   | `EventError`, `EventResult<T>`                               |
//!
//! # Dispatch model
//!
//! ```text
//! publish(A)
//!   ├─ handler 1 (A)
//!   │    └─ publish(B)            ← B reaches all of its handlers …
//!   │         ├─ handler 1 (B)
//!   │         └─ handler 2 (B)
//!   └─ handler 2 (A)              ← … before A continues
//! ```
//!
//! Events form a call stack, not a queue.  The bus is generic over the
//! context type `C` handed to every handler; the simulation kernel
//! implements [`EventContext`] for its `Sim`, tests use a small struct.

pub mod bus;
pub mod error;
pub mod label;

#[cfg(test)]
mod tests;

pub use bus::{publish, EventBus, EventContext, Handler};
pub use error::{EventError, EventResult};
pub use label::{EventLabel, EventLabeler};
