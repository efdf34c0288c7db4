//! Evaluate untrusted JavaScript expressions inside a sealed realm.
//!
//! Every [`Session`] owns a fresh realm: an independent copy of the standard
//! built-ins with the code-synthesis globals (`eval`, the `Function`
//! constructor) removed, constructor chains sealed so they cannot be walked
//! back to a code-synthesis capability, `console` wired into the host's `log`
//! facade, and guarded `setTimeout`/`setInterval` that accept only callable
//! arguments. Expressions run under an implicit-return strict-mode wrapper,
//! so mutations they make land on realm-owned copies and die with the
//! session.
//!
//! Caller-supplied [`Bindings`] are merged into the realm last, overwriting
//! any default of the same name. Function bindings keep their host identity:
//! whatever a binding can reach, the evaluated expression can reach too, and
//! the isolation guarantees do not extend to it.
//!
//! ```
//! use sealed_eval::Session;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(None, None);
//! let value = session.evaluate("6 * 7")?;
//! assert_eq!(value.to_number(session.context_mut())?, 42.0);
//! # Ok(())
//! # }
//! ```

/// Result type alias using [`Fault`] as the default error type.
pub type Result<T, E = Fault> = core::result::Result<T, E>;

pub mod fault;
pub mod realm;
pub mod screen;
pub mod session;

pub use fault::Fault;
pub use realm::{Binding, Bindings, Realm, RealmBuilder};
pub use screen::{classify, CodeShape};
pub use session::{evaluate, EvalOptions, Session};

// Hosts build native bindings against the substrate's types; re-export it so
// they don't have to pin a matching version themselves.
pub use boa_engine;
