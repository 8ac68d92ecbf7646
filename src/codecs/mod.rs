pub mod bytes;
pub mod ndarray;
pub mod path;
pub mod quantity;
pub mod settings;

use serde_json::{Map, Value as Json};

use crate::error::{CodecError, CodecResult};
use crate::registry::{Decoder, Encoder};
use crate::resolve::ClassResolver;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Wire bookkeeping keys
// ---------------------------------------------------------------------------

/// Module of the class a class-identified dict reconstructs to.
pub const KEY_MODULE: &str = "__module__";
/// Qualified class name of a class-identified dict.
pub const KEY_CLASS: &str = "__class__";
/// Marker present on every codec-produced dict.
pub const KEY_IS_CUSTOM: &str = ":is_custom:";
/// Discriminator naming the unit registry a predicate-matched dict belongs to.
pub const KEY_UNIT_REGISTRY: &str = "pint_unit_registry";

// ---------------------------------------------------------------------------
// Codec trait
// ---------------------------------------------------------------------------

/// Bidirectional converter between one value family and its canonical dict.
///
/// For any value `v` the codec accepts, `from_dict(to_dict(v))` must equal
/// `v` in type and content. `to_dict` is pure and deterministic; `from_dict`
/// accepts exactly the shapes `to_dict` produces and fails atomically,
/// never returning a partially built value.
pub trait Codec: Send + Sync {
    /// Stable codec name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Whether this codec owns the runtime value.
    fn matches_value(&self, value: &Value) -> bool;

    /// Whether this codec owns the decoded dict. Fallible: probing a
    /// class-identified dict may need the resolver, and an unresolvable
    /// `__module__`/`__class__` pair is an error, not a non-match.
    fn matches_dict(
        &self,
        dict: &Map<String, Json>,
        resolver: &dyn ClassResolver,
    ) -> CodecResult<bool>;

    /// Encode `value` into its canonical dict. Nested non-native values are
    /// routed back through `enc`.
    fn to_dict(&self, value: &Value, enc: &Encoder<'_>) -> CodecResult<Map<String, Json>>;

    /// Decode a canonical dict back into the value it represents.
    fn from_dict(&self, dict: &Map<String, Json>, dec: &Decoder<'_>) -> CodecResult<Value>;
}

// ---------------------------------------------------------------------------
// Shared dict helpers
// ---------------------------------------------------------------------------

/// Stamp the class-identification keys onto a canonical dict.
pub(crate) fn insert_class_keys(dict: &mut Map<String, Json>, module: &str, class: &str) {
    dict.insert(KEY_MODULE.to_string(), Json::String(module.to_string()));
    dict.insert(KEY_CLASS.to_string(), Json::String(class.to_string()));
    dict.insert(KEY_IS_CUSTOM.to_string(), Json::Bool(true));
}

/// Read the class-identification keys, when both are present as strings.
pub(crate) fn class_keys(dict: &Map<String, Json>) -> Option<(&str, &str)> {
    let module = dict.get(KEY_MODULE)?.as_str()?;
    let class = dict.get(KEY_CLASS)?.as_str()?;
    Some((module, class))
}

/// Whether the dict carries exactly this codec's class identity.
pub(crate) fn has_exact_class(dict: &Map<String, Json>, module: &str, class: &str) -> bool {
    class_keys(dict) == Some((module, class))
}

/// Fetch a required string-valued key.
pub(crate) fn require_str<'a>(
    dict: &'a Map<String, Json>,
    key: &str,
    codec: &str,
) -> CodecResult<&'a str> {
    dict.get(key)
        .ok_or_else(|| CodecError::MalformedDict(format!("{codec} dict is missing `{key}`")))?
        .as_str()
        .ok_or_else(|| CodecError::MalformedDict(format!("{codec} dict key `{key}` is not a string")))
}
