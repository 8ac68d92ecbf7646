use indexmap::IndexMap;
use std::path::PathBuf;

use crate::settings::SettingsObject;
use crate::types::NdArray;
use crate::units::{Quantity, UnitExpr};

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// The runtime universe the codec layer dispatches over: everything JSON can
/// carry natively, plus the custom families that need a codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// Plain mapping; insertion order is preserved.
    Dict(IndexMap<String, Value>),

    // Custom families, each owned by one codec.
    Path(PathBuf),
    Bytes(Vec<u8>),
    Array(NdArray),
    Unit(UnitExpr),
    Quantity(Quantity),
    Settings(SettingsObject),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Path(_) => "path",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Unit(_) => "unit",
            Value::Quantity(_) => "quantity",
            Value::Settings(_) => "settings",
        }
    }

    /// Whether this value serializes without a codec.
    pub fn is_json_native(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::String(_)
                | Value::List(_)
                | Value::Dict(_)
        )
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Value::Path(v)
    }
}

impl From<NdArray> for Value {
    fn from(v: NdArray) -> Self {
        Value::Array(v)
    }
}

impl From<Quantity> for Value {
    fn from(v: Quantity) -> Self {
        Value::Quantity(v)
    }
}

impl From<UnitExpr> for Value {
    fn from(v: UnitExpr) -> Self {
        Value::Unit(v)
    }
}

impl From<SettingsObject> for Value {
    fn from(v: SettingsObject) -> Self {
        Value::Settings(v)
    }
}
