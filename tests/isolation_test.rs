//! Integration tests for realm isolation: no code-synthesis capability, no
//! constructor-chain route out, no cross-session or host visibility of
//! realm mutations, and the binding exemption.

use std::sync::atomic::{AtomicUsize, Ordering};

use sealed_eval::boa_engine::value::JsVariant;
use sealed_eval::boa_engine::{JsValue, NativeFunction};
use sealed_eval::{evaluate, Bindings, Fault, Session};

fn assert_true(session: &mut Session, code: &str) {
    let value = session.evaluate(code).expect(code);
    assert!(
        matches!(value.variant(), JsVariant::Boolean(true)),
        "{code} gave {}",
        value.display()
    );
}

#[test]
fn test_code_synthesis_is_unreachable() {
    let mut session = Session::new(None, None);

    assert_true(&mut session, "typeof eval === 'undefined'");
    assert_true(&mut session, "typeof Function === 'undefined'");

    for code in [
        "eval('9 + 25')",
        "new Function('return 1')()",
        "Function('return 1')()",
    ] {
        let fault = session.evaluate(code).unwrap_err();
        assert!(matches!(fault, Fault::Runtime { .. }), "{code} gave {fault:?}");
    }
}

#[test]
fn test_constructor_chains_dead_end() {
    let mut session = Session::new(None, None);

    // Every route of the form value.constructor.constructor(...) must fault:
    // the function intrinsics' constructor links are sealed to undefined.
    for code in [
        "''.constructor.constructor('return 1')()",
        "[].constructor.constructor('return 1')()",
        "(5).constructor.constructor('return 1')()",
        "(true).constructor.constructor('return 1')()",
        "({}).constructor.constructor('return 1')()",
        "(/x/).constructor.constructor('return 1')()",
        "new Date().constructor.constructor('return 1')()",
        "new Uint8Array(0).constructor.constructor('return 1')()",
        "Math.abs.constructor('return 1')()",
        "JSON.stringify.constructor('return 1')()",
        "this.constructor.constructor('return 1')()",
        "Object.constructor.constructor('return 1')()",
    ] {
        let fault = session.evaluate(code).unwrap_err();
        assert!(matches!(fault, Fault::Runtime { .. }), "{code} gave {fault:?}");
    }

    // The ordinary constructor link for plain objects is untouched.
    assert_true(&mut session, "({}).constructor === Object");
}

#[test]
fn test_mutations_do_not_cross_sessions() {
    let mut tainted = Session::new(None, None);
    let _ = tainted
        .evaluate("(Math.abs = function () { return 'hijacked' })")
        .expect("assignment evaluates");
    assert_true(&mut tainted, "Math.abs(-4) === 'hijacked'");

    let mut clean = Session::new(None, None);
    assert_true(&mut clean, "Math.abs(-4) === 4");
}

#[test]
fn test_global_overwrites_stay_in_their_session() {
    let mut tainted = Session::new(None, None);
    let _ = tainted
        .evaluate("(setTimeout = 'not a function any more')")
        .expect("assignment evaluates");
    assert_true(&mut tainted, "setTimeout === 'not a function any more'");

    let mut clean = Session::new(None, None);
    assert_true(&mut clean, "typeof setTimeout === 'function'");
}

#[test]
fn test_one_shot_evaluations_share_nothing() {
    let _ = evaluate("(Math.marker = 'tainted')", None, None).expect("evaluates");
    let value = evaluate("typeof Math.marker", None, None).expect("evaluates");
    let mut scratch = Session::new(None, None);
    assert_eq!(
        value
            .to_string(scratch.context_mut())
            .expect("string conversion")
            .to_std_string_escaped(),
        "undefined"
    );
}

#[test]
fn test_data_bindings_shadow_realm_defaults() {
    let bindings = Bindings::new()
        .with("answer", 41)
        .with("Math", serde_json::json!({}));
    let mut session = Session::new(Some(bindings), None);

    assert_true(&mut session, "answer + 1 === 42");
    // The realm's Math lost the collision; the binding has no abs.
    assert_true(&mut session, "typeof Math.abs === 'undefined'");
}

#[test]
fn test_function_bindings_keep_host_identity() {
    static HOST_CALLS: AtomicUsize = AtomicUsize::new(0);

    let tick = NativeFunction::from_copy_closure(|_this, _args, _ctx| {
        let _ = HOST_CALLS.fetch_add(1, Ordering::Relaxed);
        Ok(JsValue::undefined())
    });
    let mut session = Session::new(Some(Bindings::new().with_function("hostTick", tick)), None);

    let _ = session.evaluate("hostTick()").expect("evaluates");
    let _ = session.evaluate("hostTick()").expect("evaluates");
    // The expression really did reach the host through the binding; this is
    // the documented exemption from the isolation guarantees.
    assert_eq!(HOST_CALLS.load(Ordering::Relaxed), 2);
}
