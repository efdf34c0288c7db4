//! The fault taxonomy surfaced by expression evaluation.

use boa_engine::{Context, JsError, JsNativeErrorKind};

/// A fault raised by [`Session::evaluate`](crate::Session::evaluate).
///
/// There is no local recovery anywhere in the crate: every fault is raised
/// synchronously to the immediate caller, and nothing other than these three
/// kinds crosses the realm boundary.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// The input was not evaluable source text (empty or all whitespace).
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The expression is malformed, or its syntactic shape was rejected
    /// before execution.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The expression raised during evaluation. The realm's error value is
    /// rendered into `message`; `kind` carries its JavaScript error kind
    /// (`TypeError`, `ReferenceError`, ...).
    #[error("evaluation fault: {message}")]
    Runtime {
        /// JavaScript error kind the realm raised.
        kind: String,
        /// Rendered error, including the kind prefix.
        message: String,
    },
}

impl Fault {
    /// Maps a realm error onto the taxonomy. Syntax errors keep their own
    /// variant so callers can tell "malformed input" from "input that ran
    /// and failed".
    pub(crate) fn from_js(err: &JsError, context: &mut Context) -> Self {
        match err.try_native(context) {
            Ok(native) => {
                let message = native.to_string();
                if matches!(native.kind, JsNativeErrorKind::Syntax) {
                    Self::Syntax(message)
                } else {
                    Self::Runtime {
                        kind: native.kind.to_string(),
                        message,
                    }
                }
            }
            // Opaque thrown values (e.g. `throw 42`) have no native kind.
            Err(_) => Self::Runtime {
                kind: "Error".to_owned(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boa_engine::Source;

    fn eval_fault(code: &str) -> Fault {
        let mut context = Context::default();
        let err = context
            .eval(Source::from_bytes(code))
            .expect_err("code under test must fault");
        Fault::from_js(&err, &mut context)
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_malformed_input_maps_to_syntax() {
        let fault = eval_fault("1 +");
        assert!(matches!(fault, Fault::Syntax(_)), "got {fault:?}");
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_type_error_keeps_its_kind() {
        let fault = eval_fault("null.missing");
        match fault {
            Fault::Runtime { kind, message } => {
                assert_eq!(kind, "TypeError");
                assert!(message.starts_with("TypeError"), "got {message}");
            }
            other => panic!("expected runtime fault, got {other:?}"),
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_unresolved_identifier_is_a_reference_fault() {
        let fault = eval_fault("definitelyNotDefined");
        match fault {
            Fault::Runtime { kind, .. } => assert_eq!(kind, "ReferenceError"),
            other => panic!("expected runtime fault, got {other:?}"),
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "evaluating against the realm is too slow under Miri")]
    fn test_opaque_thrown_value_maps_to_runtime() {
        let fault = eval_fault("(function () { throw 42; })()");
        assert!(matches!(fault, Fault::Runtime { .. }), "got {fault:?}");
    }
}
