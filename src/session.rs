//! Sessions bind one realm to one evaluation policy.

use crate::realm::{Bindings, Realm, RealmBuilder};
use crate::{screen, Fault, Result};
use boa_engine::vm::RuntimeLimits;
use boa_engine::{Context, JsValue, Source};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const LOG_TARGET: &str = "   session";

/// Per-session evaluation policy. Fixed once the session exists.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalOptions {
    /// Permit expressions whose head is a function literal, optionally
    /// parenthesized and immediately applied. Off by default: a function
    /// body smuggles an arbitrary statement sequence past the
    /// expression screen.
    pub allow_function_forms: bool,

    /// Maximum call depth before evaluation faults with a `RuntimeLimit`
    /// error. Runaway recursion hits this instead of the host stack.
    pub recursion_limit: usize,

    /// Optional cap on loop iterations per evaluation.
    pub loop_iteration_limit: Option<u64>,

    /// Optional cap on the substrate's value stack.
    pub stack_size_limit: Option<usize>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            allow_function_forms: false,
            recursion_limit: 256,
            loop_iteration_limit: None,
            stack_size_limit: None,
        }
    }
}

/// One realm plus one evaluation policy.
///
/// Evaluations against a session are strictly sequential (`evaluate` takes
/// `&mut self`, and the realm is single-threaded by construction), and each
/// one runs to completion before the next begins. Mutations an expression
/// makes to realm state persist for the life of the session and die with it.
pub struct Session {
    realm: Realm,
    options: EvalOptions,
}

impl Session {
    /// Builds a fresh realm, applies the policy's execution limits, and
    /// merges `bindings` last so they overwrite any realm default of the
    /// same name.
    #[must_use]
    pub fn new(bindings: Option<Bindings>, options: Option<EvalOptions>) -> Self {
        let options = options.unwrap_or_default();
        let mut realm = RealmBuilder::new().build();

        let mut limits = RuntimeLimits::default();
        limits.set_recursion_limit(options.recursion_limit);
        if let Some(cap) = options.loop_iteration_limit {
            limits.set_loop_iteration_limit(cap);
        }
        if let Some(cap) = options.stack_size_limit {
            limits.set_stack_size_limit(cap);
        }
        realm.context_mut().set_runtime_limits(limits);

        if let Some(bindings) = bindings {
            log::debug!(target: LOG_TARGET, "merging {} caller bindings", bindings.len());
            bindings.merge(realm.context_mut());
        }
        Self { realm, options }
    }

    /// Evaluates one expression against the session's realm.
    ///
    /// The expression is screened (see [`classify`](crate::classify)), then
    /// run as the implicit return value of a strict-mode function body.
    /// Failures map onto the [`Fault`] taxonomy: unevaluable input is
    /// [`Fault::Argument`], malformed or screened-out input is
    /// [`Fault::Syntax`], and anything the realm raises during execution is
    /// [`Fault::Runtime`].
    pub fn evaluate(&mut self, code: &str) -> Result<JsValue> {
        if code.trim().is_empty() {
            return Err(Fault::Argument(
                "code must be a non-empty string of source text".to_owned(),
            ));
        }
        screen::screen(code, self.options.allow_function_forms)?;

        // The trailing newline keeps a line comment at the end of the input
        // from swallowing the closing brace.
        let wrapped = format!("(function () {{'use strict'; return {code}\n}})()");
        log::debug!(target: LOG_TARGET, "evaluating {} bytes", code.len());
        match self.realm.context_mut().eval(Source::from_bytes(&wrapped)) {
            Ok(value) => Ok(value),
            Err(err) => Err(Fault::from_js(&err, self.realm.context_mut())),
        }
    }

    /// Runs every timer callback that is due, in due order, and returns how
    /// many ran. Interval timers are rescheduled and fire at most once per
    /// call. The first callback that raises stops the run and surfaces as a
    /// fault; the rest of that drained batch is discarded with it.
    pub fn run_due_timers(&mut self) -> Result<usize> {
        let due = self.realm.timers.borrow_mut().take_due(Instant::now());
        let mut ran = 0;
        for (id, callback) in due {
            log::debug!(target: LOG_TARGET, "running timer {id}");
            if let Err(err) = callback.call(&JsValue::undefined(), &[], self.realm.context_mut()) {
                return Err(Fault::from_js(&err, self.realm.context_mut()));
            }
            ran += 1;
        }
        Ok(ran)
    }

    /// Number of timer callbacks still queued.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.realm.timers.borrow().len()
    }

    /// The session's evaluation policy.
    #[must_use]
    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Direct access to the realm's context, for converting evaluated
    /// values or installing further capabilities.
    pub fn context_mut(&mut self) -> &mut Context {
        self.realm.context_mut()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("realm", &self.realm)
            .field("options", &self.options)
            .finish()
    }
}

/// Builds a throwaway [`Session`] and evaluates once. The realm, and any
/// mutation the expression made to it, is discarded afterwards.
pub fn evaluate(
    code: &str,
    bindings: Option<Bindings>,
    options: Option<EvalOptions>,
) -> Result<JsValue> {
    Session::new(bindings, options).evaluate(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_mutations_persist_within_a_session_only() {
        let mut tainted = Session::new(None, None);
        let _ = tainted
            .evaluate("(Math.abs = function (x) { return 42 })")
            .expect("assignment expression evaluates");
        let hijacked = tainted.evaluate("Math.abs(-4)").expect("evaluates");
        assert_eq!(hijacked.to_number(tainted.context_mut()).ok(), Some(42.0));

        let mut clean = Session::new(None, None);
        let original = clean.evaluate("Math.abs(-4)").expect("evaluates");
        assert_eq!(original.to_number(clean.context_mut()).ok(), Some(4.0));
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_empty_input_is_an_argument_fault() {
        let mut session = Session::new(None, None);
        for code in ["", "   ", "\n\t"] {
            let fault = session.evaluate(code).unwrap_err();
            assert!(matches!(fault, Fault::Argument(_)), "{code:?} gave {fault:?}");
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_trailing_line_comment_does_not_break_the_wrapper() {
        let mut session = Session::new(None, None);
        let value = session.evaluate("1 + 1 // comment").expect("evaluates");
        assert_eq!(value.to_number(session.context_mut()).ok(), Some(2.0));
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_recursion_faults_and_the_session_survives() {
        let options = EvalOptions {
            allow_function_forms: true,
            ..EvalOptions::default()
        };
        let mut session = Session::new(None, Some(options));
        let fault = session
            .evaluate("(function () { function dive() { return dive() } return dive() })()")
            .unwrap_err();
        assert!(matches!(fault, Fault::Runtime { .. }), "got {fault:?}");

        let value = session.evaluate("1 + 1").expect("session still usable");
        assert_eq!(value.to_number(session.context_mut()).ok(), Some(2.0));
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_options_deserialize_with_defaults() {
        let options: EvalOptions =
            serde_json::from_str(r#"{"allow_function_forms": true}"#).expect("deserializes");
        assert!(options.allow_function_forms);
        assert_eq!(options.recursion_limit, 256);
        assert!(serde_json::from_str::<EvalOptions>(r#"{"unknown_knob": 1}"#).is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_one_shot_evaluation_discards_the_realm() {
        let value = evaluate("[1, 2, 3].length", None, None).expect("evaluates");
        let mut scratch = Session::new(None, None);
        assert_eq!(value.to_number(scratch.context_mut()).ok(), Some(3.0));
    }
}
