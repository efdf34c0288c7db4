//! Realm construction.

use super::timers;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsString, JsValue, NativeFunction, Source};
use core::fmt;

const LOG_TARGET: &str = "     realm";

/// Run once at construction. Seals the `constructor` property along the
/// prototype chains of the four function intrinsics (plain, generator, async,
/// async generator), then drops the code-synthesis globals. After this,
/// `value.constructor.constructor` resolves to `undefined` for every realm
/// value, so there is no route back to the `Function` constructor.
const SEAL_SCRIPT: &str = r#"
(function () {
    'use strict';
    var heads = [
        Object.getPrototypeOf(function () {}),
        Object.getPrototypeOf(function* () {}),
        Object.getPrototypeOf(async function () {}),
        Object.getPrototypeOf(async function* () {})
    ];
    for (var i = 0; i < heads.length; i++) {
        var proto = heads[i];
        while (proto !== null && proto !== Object.prototype) {
            if (Object.prototype.hasOwnProperty.call(proto, 'constructor')) {
                Object.defineProperty(proto, 'constructor', {
                    value: undefined,
                    writable: false,
                    enumerable: false,
                    configurable: false
                });
            }
            proto = Object.getPrototypeOf(proto);
        }
    }
    delete globalThis.eval;
    delete globalThis.Function;
})()
"#;

/// An isolated execution realm: a fresh copy of the standard built-ins with
/// the code-synthesis globals removed and guarded capabilities installed.
///
/// Realms are built by [`RealmBuilder`] and owned by a
/// [`Session`](crate::Session); expressions evaluated against a realm can
/// mutate it freely without touching any other realm or the host.
pub struct Realm {
    pub(crate) context: Context,
    pub(crate) timers: timers::TimerHandle,
}

impl Realm {
    /// Direct access to the underlying context, for hosts that want to
    /// convert or further inspect evaluated values.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("pending_timers", &self.timers.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Builds a [`Realm`].
#[derive(Debug, Default)]
pub struct RealmBuilder;

impl RealmBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Constructs the realm: fresh intrinsics, sealed constructor chains, no
    /// `eval`/`Function`, `console` forwarding to `log`, guarded timers.
    ///
    /// Construction cannot fault; the seal script is static and its
    /// evaluation is infallible on an untouched context.
    #[must_use]
    pub fn build(self) -> Realm {
        let mut context = Context::default();
        context
            .eval(Source::from_bytes(SEAL_SCRIPT))
            .expect("seal script evaluates on a fresh context");
        install_console(&mut context);
        let timers = timers::install(&mut context);
        log::debug!(target: LOG_TARGET, "realm constructed with sealed intrinsics");
        Realm { context, timers }
    }
}

/// Installs a `console` whose methods forward through the `log` facade, one
/// level per method. Arguments are rendered with the realm's display
/// conversion and joined with spaces.
fn install_console(context: &mut Context) {
    let console = ObjectInitializer::new(context)
        .function(console_fn(log::Level::Info), JsString::from("log"), 1)
        .function(console_fn(log::Level::Info), JsString::from("info"), 1)
        .function(console_fn(log::Level::Warn), JsString::from("warn"), 1)
        .function(console_fn(log::Level::Error), JsString::from("error"), 1)
        .function(console_fn(log::Level::Debug), JsString::from("debug"), 1)
        .build();
    let _ = context.register_global_property(
        JsString::from("console"),
        console,
        Attribute::all(),
    );
}

fn console_fn(level: log::Level) -> NativeFunction {
    NativeFunction::from_copy_closure(move |_this, args, _context| {
        let line = args
            .iter()
            .map(|arg| arg.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        log::log!(target: "   console", level, "{line}");
        Ok(JsValue::undefined())
    })
}
