//! Caller-supplied bindings merged into a realm.

use boa_engine::object::FunctionObjectBuilder;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsString, JsValue, NativeFunction};
use core::fmt;

const LOG_TARGET: &str = "  bindings";

/// A single value merged into the realm under a caller-chosen name.
pub enum Binding {
    /// Inert data, converted into realm-owned values at merge time.
    Data(serde_json::Value),

    /// A host function injected by reference. It keeps its host identity and
    /// powers, so everything reachable through it is reachable from the
    /// evaluated expression; the realm's isolation guarantees do not extend
    /// to it.
    Function(NativeFunction),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// An ordered set of caller bindings.
///
/// Bindings are merged into the realm after the builder's defaults, so a
/// binding wins any name collision; binding `Math` replaces the realm's
/// `Math` wholesale.
#[derive(Debug, Default)]
pub struct Bindings {
    entries: Vec<(String, Binding)>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a data binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.entries.push((name.into(), Binding::Data(value.into())));
    }

    /// Adds a host function binding.
    pub fn insert_function(&mut self, name: impl Into<String>, function: NativeFunction) {
        self.entries
            .push((name.into(), Binding::Function(function)));
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style [`insert_function`](Self::insert_function).
    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>, function: NativeFunction) -> Self {
        self.insert_function(name, function);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Merges every binding into the realm's global scope, in insertion
    /// order. Data bindings become realm-owned values; function bindings are
    /// wrapped as non-constructable functions around the host closure.
    pub(crate) fn merge(self, context: &mut Context) {
        for (name, binding) in self.entries {
            let value = match binding {
                Binding::Data(data) => JsValue::from_json(&data, context)
                    .expect("JSON data converts to realm values"),
                Binding::Function(function) => {
                    let object = FunctionObjectBuilder::new(context.realm(), function)
                        .name(JsString::from(name.as_str()))
                        .length(0)
                        .constructor(false)
                        .build();
                    JsValue::from(object)
                }
            };
            log::debug!(target: LOG_TARGET, "merged binding {name}");
            let _ = context.register_global_property(
                JsString::from(name.as_str()),
                value,
                Attribute::all(),
            );
        }
    }
}
