use serde_json::Value as Json;

use crate::error::CodecResult;
use crate::registry::CodecRegistry;
use crate::value::Value;

// ---------------------------------------------------------------------------
// JsonSerializer
// ---------------------------------------------------------------------------

/// Text-level surface of the codec layer: serialize whole [`Value`] trees to
/// JSON and back, with every custom value routed through the registry.
pub struct JsonSerializer {
    registry: CodecRegistry,
}

impl JsonSerializer {
    pub fn new(registry: CodecRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Lower a value tree to a JSON value.
    pub fn to_json(&self, value: &Value) -> CodecResult<Json> {
        self.registry.encoder().encode_value(value)
    }

    /// Lift a JSON value back into a value tree, decoding every nested
    /// object some codec claims.
    pub fn from_json(&self, json: &Json) -> CodecResult<Value> {
        self.registry.decoder().decode_value(json)
    }

    pub fn serialize(&self, value: &Value) -> CodecResult<String> {
        Ok(serde_json::to_string(&self.to_json(value)?)?)
    }

    pub fn deserialize(&self, text: &str) -> CodecResult<Value> {
        let json: Json = serde_json::from_str(text)?;
        self.from_json(&json)
    }
}
