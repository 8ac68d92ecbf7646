use indexmap::IndexMap;

use crate::error::{CodecError, CodecResult};
use crate::resolve::{ClassRef, ClassSpec};
use crate::value::Value;

// ---------------------------------------------------------------------------
// SettingsObject
// ---------------------------------------------------------------------------

/// A structured settings object: an instance of a resolvable class exposing
/// exactly the fixed, named, ordered set of fields the class declares.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsObject {
    class: ClassRef,
    fields: IndexMap<String, Value>,
}

impl SettingsObject {
    /// Construct an instance of `spec`, validating the supplied fields
    /// against the class's declared field set. Fields are stored in the
    /// class's declaration order regardless of input order.
    pub fn new(spec: &ClassSpec, mut fields: IndexMap<String, Value>) -> CodecResult<Self> {
        let mut ordered = IndexMap::with_capacity(spec.fields.len());
        for name in &spec.fields {
            let value = fields.shift_remove(name).ok_or_else(|| {
                CodecError::MalformedDict(format!(
                    "settings class `{}` is missing field `{name}`",
                    spec.class
                ))
            })?;
            ordered.insert(name.clone(), value);
        }
        if let Some(extra) = fields.keys().next() {
            return Err(CodecError::MalformedDict(format!(
                "settings class `{}` has no field `{extra}`",
                spec.class
            )));
        }
        Ok(Self {
            class: spec.class.clone(),
            fields: ordered,
        })
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec() -> ClassSpec {
        ClassSpec::new(
            ClassRef::new("app.settings", "SolverSettings"),
            None,
            vec!["tolerance".into(), "max_steps".into()],
        )
    }

    #[test]
    fn fields_follow_declaration_order() {
        let mut fields = IndexMap::new();
        fields.insert("max_steps".to_string(), Value::Int(100));
        fields.insert("tolerance".to_string(), Value::Float(1e-6));
        let obj = SettingsObject::new(&spec(), fields).unwrap();
        let names: Vec<_> = obj.fields().keys().cloned().collect();
        assert_eq!(names, vec!["tolerance".to_string(), "max_steps".to_string()]);
    }

    #[test]
    fn missing_and_extra_fields_are_rejected() {
        let mut fields = IndexMap::new();
        fields.insert("tolerance".to_string(), Value::Float(1e-6));
        let err = SettingsObject::new(&spec(), fields).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDict(_)));

        let mut fields = IndexMap::new();
        fields.insert("tolerance".to_string(), Value::Float(1e-6));
        fields.insert("max_steps".to_string(), Value::Int(100));
        fields.insert("bogus".to_string(), Value::Null);
        let err = SettingsObject::new(&spec(), fields).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDict(_)));
    }
}
