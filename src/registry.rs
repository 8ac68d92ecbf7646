//! Ordered codec registry and dispatch.
//!
//! Dispatch is first-match-wins in registration order, so the order codecs
//! are registered in is part of the registry's observable behavior.
//! [`default_codecs`] fixes the order for the built-in stack; assembling
//! code that registers its own codecs owns their placement.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};
use tracing::{debug, trace};

use crate::codecs::Codec;
use crate::codecs::bytes::BytesCodec;
use crate::codecs::ndarray::NdArrayCodec;
use crate::codecs::path::PathCodec;
use crate::codecs::quantity::{QuantityCodec, UnitCodec};
use crate::codecs::settings::SettingsCodec;
use crate::error::{CodecError, CodecResult};
use crate::resolve::{ClassRef, ClassResolver};
use crate::units::UnitRegistry;
use crate::value::Value;

// ---------------------------------------------------------------------------
// DecodeLimits
// ---------------------------------------------------------------------------

/// Resource ceilings applied while decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeLimits {
    /// Largest array payload a decode may allocate, in bytes.
    #[serde(default = "default_max_array_bytes")]
    pub max_array_bytes: usize,
}

fn default_max_array_bytes() -> usize {
    1 << 30
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_array_bytes: default_max_array_bytes(),
        }
    }
}

// ---------------------------------------------------------------------------
// CodecRegistry
// ---------------------------------------------------------------------------

/// Ordered, append-only collection of codecs plus the injected resolver.
/// Built once at assembly time; read-only afterwards, so shared references
/// may be used from any number of threads.
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn Codec>>,
    resolver: Arc<dyn ClassResolver>,
    limits: DecodeLimits,
}

impl CodecRegistry {
    /// Empty registry around an injected class resolver.
    pub fn new(resolver: Arc<dyn ClassResolver>) -> Self {
        Self {
            codecs: Vec::new(),
            resolver,
            limits: DecodeLimits::default(),
        }
    }

    /// Registry preloaded with the built-in codec stack in its documented
    /// order: path, bytes, ndarray, settings, quantity, unit.
    pub fn with_default_codecs(
        resolver: Arc<dyn ClassResolver>,
        units: Arc<dyn UnitRegistry>,
        settings_base: ClassRef,
    ) -> Self {
        let mut registry = Self::new(resolver);
        for codec in default_codecs(units, settings_base) {
            registry.register(codec);
        }
        registry
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Append a codec. No uniqueness check is performed: when two codecs
    /// both match an input, the one registered first wins.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        trace!(codec = codec.name(), position = self.codecs.len(), "registering codec");
        self.codecs.push(codec);
    }

    pub fn resolver(&self) -> &dyn ClassResolver {
        self.resolver.as_ref()
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// First registered codec whose value predicate accepts `value`.
    pub fn select_by_value(&self, value: &Value) -> CodecResult<&dyn Codec> {
        for codec in &self.codecs {
            if codec.matches_value(value) {
                debug!(codec = codec.name(), kind = value.kind(), "value matched codec");
                return Ok(codec.as_ref());
            }
        }
        Err(CodecError::NoCodecFound(format!(
            "no registered codec accepts a value of kind `{}`",
            value.kind()
        )))
    }

    /// First registered codec whose dict predicate accepts `dict`.
    /// An unresolvable `__module__`/`__class__` pair inside a predicate
    /// aborts the scan with [`CodecError::UnknownClass`].
    pub fn select_by_dict(&self, dict: &Map<String, Json>) -> CodecResult<&dyn Codec> {
        match self.try_select_by_dict(dict)? {
            Some(codec) => Ok(codec),
            None => Err(CodecError::NoCodecFound(format!(
                "no registered codec accepts a dict with keys [{}]",
                dict.keys().cloned().collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    pub(crate) fn try_select_by_dict(
        &self,
        dict: &Map<String, Json>,
    ) -> CodecResult<Option<&dyn Codec>> {
        for codec in &self.codecs {
            if codec.matches_dict(dict, self.resolver.as_ref())? {
                debug!(codec = codec.name(), "dict matched codec");
                return Ok(Some(codec.as_ref()));
            }
        }
        Ok(None)
    }

    /// Encode a custom value into its canonical dict.
    pub fn encode(&self, value: &Value) -> CodecResult<Map<String, Json>> {
        let codec = self.select_by_value(value)?;
        codec.to_dict(value, &self.encoder())
    }

    /// Decode a canonical dict back into the value it represents.
    pub fn decode(&self, dict: &Map<String, Json>) -> CodecResult<Value> {
        let codec = self.select_by_dict(dict)?;
        codec.from_dict(dict, &self.decoder())
    }

    pub fn encoder(&self) -> Encoder<'_> {
        Encoder { registry: self }
    }

    pub fn decoder(&self) -> Decoder<'_> {
        Decoder { registry: self }
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field(
                "codecs",
                &self.codecs.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("limits", &self.limits)
            .finish()
    }
}

/// The built-in codec stack, in its fixed registration order.
pub fn default_codecs(
    units: Arc<dyn UnitRegistry>,
    settings_base: ClassRef,
) -> Vec<Arc<dyn Codec>> {
    vec![
        Arc::new(PathCodec),
        Arc::new(BytesCodec),
        Arc::new(NdArrayCodec),
        Arc::new(SettingsCodec::new(settings_base)),
        Arc::new(QuantityCodec::new(units.clone())),
        Arc::new(UnitCodec::new(units)),
    ]
}

// ---------------------------------------------------------------------------
// Encoder  (value -> JSON recursion context)
// ---------------------------------------------------------------------------

/// Recursion handle passed into `Codec::to_dict`: JSON-native values pass
/// through, custom values dispatch back into the registry.
pub struct Encoder<'a> {
    registry: &'a CodecRegistry,
}

impl Encoder<'_> {
    pub fn encode_value(&self, value: &Value) -> CodecResult<Json> {
        match value {
            Value::Null => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Int(i) => Ok(Json::Number(Number::from(*i))),
            Value::Float(f) => Number::from_f64(*f).map(Json::Number).ok_or_else(|| {
                CodecError::Encode(format!("non-finite float {f} is not JSON-representable"))
            }),
            Value::String(s) => Ok(Json::String(s.clone())),
            Value::List(items) => items
                .iter()
                .map(|item| self.encode_value(item))
                .collect::<CodecResult<Vec<_>>>()
                .map(Json::Array),
            Value::Dict(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.encode_value(item)?);
                }
                Ok(Json::Object(out))
            }
            custom => {
                let codec = self.registry.select_by_value(custom)?;
                Ok(Json::Object(codec.to_dict(custom, self)?))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder  (JSON -> value recursion context)
// ---------------------------------------------------------------------------

/// Recursion handle passed into `Codec::from_dict`: any nested object some
/// codec claims is decoded through it, all other JSON stays as-is.
pub struct Decoder<'a> {
    registry: &'a CodecRegistry,
}

impl Decoder<'_> {
    pub fn resolver(&self) -> &dyn ClassResolver {
        self.registry.resolver()
    }

    pub fn limits(&self) -> &DecodeLimits {
        self.registry.limits()
    }

    pub fn decode_value(&self, json: &Json) -> CodecResult<Value> {
        match json {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => decode_number(n),
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Array(items) => items
                .iter()
                .map(|item| self.decode_value(item))
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::List),
            Json::Object(map) => {
                if let Some(codec) = self.registry.try_select_by_dict(map)? {
                    return codec.from_dict(map, self);
                }
                let mut out = IndexMap::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.decode_value(item)?);
                }
                Ok(Value::Dict(out))
            }
        }
    }
}

pub(crate) fn decode_number(n: &Number) -> CodecResult<Value> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Int(i))
    } else if let Some(f) = n.as_f64() {
        Ok(Value::Float(f))
    } else {
        Err(CodecError::Decode(format!("number {n} is out of range")))
    }
}
