//! Class resolution for class-identified wire dicts.
//!
//! The core never performs dynamic import or reflection: whoever assembles
//! the registry injects a [`ClassResolver`] mapping `(module, qualname)`
//! pairs to class descriptions, and the settings codec resolves through it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

// ---------------------------------------------------------------------------
// ClassRef / ClassSpec
// ---------------------------------------------------------------------------

/// A `(module, qualified name)` pair identifying a class on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassRef {
    pub module: String,
    pub qualname: String,
}

impl ClassRef {
    pub fn new(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            qualname: qualname.into(),
        }
    }
}

impl std::fmt::Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.qualname)
    }
}

/// Description of a resolvable class: its identity, optional base class, and
/// the fixed, ordered set of field names its instances carry. Resolver
/// tables are assembly-time configuration, so this round-trips through serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub class: ClassRef,
    #[serde(default)]
    pub base: Option<ClassRef>,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl ClassSpec {
    pub fn new(class: ClassRef, base: Option<ClassRef>, fields: Vec<String>) -> Self {
        Self { class, base, fields }
    }
}

// ---------------------------------------------------------------------------
// ClassResolver trait
// ---------------------------------------------------------------------------

/// Injected capability: look a class up by name pair.
pub trait ClassResolver: Send + Sync {
    /// Resolve `(module, qualname)` to its [`ClassSpec`], failing with
    /// [`CodecError::UnknownClass`] when the pair is not known.
    fn resolve(&self, module: &str, qualname: &str) -> CodecResult<ClassSpec>;

    /// Whether `class` is `base` or inherits from it, walking the base chain
    /// through this resolver. Unresolvable links propagate as errors.
    fn is_subclass(&self, class: &ClassRef, base: &ClassRef) -> CodecResult<bool> {
        let mut current = class.clone();
        loop {
            if current == *base {
                return Ok(true);
            }
            let spec = self.resolve(&current.module, &current.qualname)?;
            match spec.base {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MapClassResolver
// ---------------------------------------------------------------------------

/// Map-backed resolver, populated at assembly time.
#[derive(Debug, Clone, Default)]
pub struct MapClassResolver {
    classes: HashMap<ClassRef, ClassSpec>,
}

impl MapClassResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class(&mut self, spec: ClassSpec) -> &mut Self {
        self.classes.insert(spec.class.clone(), spec);
        self
    }
}

impl ClassResolver for MapClassResolver {
    fn resolve(&self, module: &str, qualname: &str) -> CodecResult<ClassSpec> {
        self.classes
            .get(&ClassRef::new(module, qualname))
            .cloned()
            .ok_or_else(|| CodecError::UnknownClass {
                module: module.to_string(),
                qualname: qualname.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver() -> MapClassResolver {
        let base = ClassRef::new("app.settings", "BaseSettings");
        let sub = ClassRef::new("app.settings", "SolverSettings");
        let mut r = MapClassResolver::new();
        r.register_class(ClassSpec::new(base.clone(), None, vec![]));
        r.register_class(ClassSpec::new(
            sub.clone(),
            Some(base),
            vec!["tolerance".into()],
        ));
        r
    }

    #[test]
    fn resolves_registered_classes() {
        let spec = resolver().resolve("app.settings", "SolverSettings").unwrap();
        assert_eq!(spec.fields, vec!["tolerance".to_string()]);
    }

    #[test]
    fn unknown_class_errors() {
        let err = resolver().resolve("app.settings", "Missing").unwrap_err();
        assert!(matches!(err, CodecError::UnknownClass { .. }));
    }

    #[test]
    fn class_specs_load_from_json_config() {
        let spec: ClassSpec = serde_json::from_str(
            r#"{"class": {"module": "app.settings", "qualname": "BaseSettings"}}"#,
        )
        .unwrap();
        assert_eq!(spec.class, ClassRef::new("app.settings", "BaseSettings"));
        assert!(spec.base.is_none());
        assert!(spec.fields.is_empty());
    }

    #[test]
    fn subclass_walks_base_chain() {
        let r = resolver();
        let base = ClassRef::new("app.settings", "BaseSettings");
        let sub = ClassRef::new("app.settings", "SolverSettings");
        assert!(r.is_subclass(&sub, &base).unwrap());
        assert!(r.is_subclass(&base, &base).unwrap());
        assert!(!r.is_subclass(&base, &sub).unwrap());
    }
}
