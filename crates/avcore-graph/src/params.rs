//! Component parameter sets (spec.md §4.8): named typed values with
//! optional range/option-list validation, plus read-only "readout" entries.

use crate::error::GraphError;
use std::collections::HashMap;
use std::sync::Arc;

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::String(_) => "string",
            ParamValue::Enum(_) => "enum",
        }
    }
}

/// Validation applied on `set`, beyond the type check.
#[derive(Debug, Clone)]
pub enum ParamValidation {
    None,
    IntRange(i64, i64),
    FloatRange(f64, f64),
    EnumOptions(Vec<String>),
}

struct ParamEntry {
    value: ParamValue,
    validation: ParamValidation,
    readout: bool,
}

type ChangeCallback = Arc<dyn Fn(&str, &ParamValue) + Send + Sync>;

/// A component's named parameters, addressed by key (the `parameterKey` half
/// of the `componentId.parameterKey` dotted path in spec.md §6).
pub struct ParamSet {
    entries: HashMap<String, ParamEntry>,
    on_change: Option<ChangeCallback>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            on_change: None,
        }
    }

    /// Registers a settable parameter with an initial value and validation rule.
    pub fn register(&mut self, key: impl Into<String>, initial: ParamValue, validation: ParamValidation) {
        self.entries.insert(
            key.into(),
            ParamEntry {
                value: initial,
                validation,
                readout: false,
            },
        );
    }

    /// Registers a read-only readout entry the component updates itself via
    /// [`ParamSet::update_readout`].
    pub fn register_readout(&mut self, key: impl Into<String>, initial: ParamValue) {
        self.entries.insert(
            key.into(),
            ParamEntry {
                value: initial,
                validation: ParamValidation::None,
                readout: true,
            },
        );
    }

    /// Registers the change callback fired after a successful `set` (not
    /// fired by `update_readout`, which is a component-internal write).
    pub fn set_change_callback(&mut self, callback: ChangeCallback) {
        self.on_change = Some(callback);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Validates type and range/options, then updates the value and fires
    /// the change callback. Fails on an unknown key, a read-only key, a
    /// type mismatch, or a value outside the registered range/options.
    pub fn set(&mut self, key: &str, value: ParamValue) -> Result<(), GraphError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| GraphError::UnknownParam(key.to_string()))?;
        if entry.readout {
            return Err(GraphError::ParamReadOnly(key.to_string()));
        }
        if entry.value.type_name() != value.type_name() {
            return Err(GraphError::ParamTypeMismatch {
                path: key.to_string(),
                expected: entry.value.type_name(),
                got: value.type_name(),
            });
        }
        let in_range = match (&entry.validation, &value) {
            (ParamValidation::None, _) => true,
            (ParamValidation::IntRange(lo, hi), ParamValue::Int(v)) => v >= lo && v <= hi,
            (ParamValidation::FloatRange(lo, hi), ParamValue::Float(v)) => v >= lo && v <= hi,
            (ParamValidation::EnumOptions(options), ParamValue::Enum(v)) => options.contains(v),
            _ => true,
        };
        if !in_range {
            return Err(GraphError::ParamOutOfRange {
                path: key.to_string(),
            });
        }
        entry.value = value;
        if let Some(cb) = &self.on_change {
            cb(key, &entry.value);
        }
        Ok(())
    }

    /// Updates a read-only readout entry. No type/range validation beyond
    /// matching the registered type, and never fires the change callback —
    /// this is the component publishing its own state, not a caller `set`.
    pub fn update_readout(&mut self, key: &str, value: ParamValue) -> Result<(), GraphError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| GraphError::UnknownParam(key.to_string()))?;
        if entry.value.type_name() != value.type_name() {
            return Err(GraphError::ParamTypeMismatch {
                path: key.to_string(),
                expected: entry.value.type_name(),
                got: value.type_name(),
            });
        }
        entry.value = value;
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for ParamSet {
    fn default() -> Self {
        Self::new()
    }
}
