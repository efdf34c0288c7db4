//! The isolated execution realm.
//!
//! [`RealmBuilder`] constructs a realm whose built-ins are owned by that
//! realm alone. The substrate gives every context an independent copy of the
//! standard intrinsics; the builder then removes the code-synthesis globals
//! (`eval`, the `Function` constructor), seals the constructor chains of the
//! function intrinsics so they cannot be walked back to a code-synthesis
//! capability, wires `console` into the host's `log` facade, and installs
//! guarded timer functions that fail closed on non-callable arguments.
//!
//! [`Bindings`] are merged last, by reference, overwriting any default of the
//! same name. They are the caller's escape hatch and are explicitly exempt
//! from the isolation guarantees.

mod bindings;
mod builder;
pub(crate) mod timers;

pub use bindings::{Binding, Bindings};
pub use builder::{Realm, RealmBuilder};
