use serde_json::{Map, Value as Json};

use crate::codecs::{Codec, has_exact_class, insert_class_keys, require_str};
use crate::error::{CodecError, CodecResult};
use crate::registry::{Decoder, Encoder};
use crate::resolve::ClassResolver;
use crate::value::Value;

const MODULE: &str = "builtins";
const CLASS: &str = "bytes";

/// Opaque byte sequences: `{"latin-1": "<string>"}`.
///
/// latin-1 is the lossless 8-bit text mapping: byte `n` is exactly the code
/// point U+00`nn`, so any byte sequence survives the trip through JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

/// Encode bytes as latin-1 text.
pub(crate) fn bytes_to_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| char::from(b)).collect()
}

/// Decode latin-1 text back to bytes. Code points above U+00FF cannot have
/// come from `bytes_to_latin1` and are rejected.
pub(crate) fn latin1_to_bytes(text: &str) -> CodecResult<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                CodecError::MalformedDict(format!(
                    "latin-1 payload contains non-latin-1 code point U+{:04X}",
                    u32::from(c)
                ))
            })
        })
        .collect()
}

impl Codec for BytesCodec {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn matches_value(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(_))
    }

    fn matches_dict(
        &self,
        dict: &Map<String, Json>,
        _resolver: &dyn ClassResolver,
    ) -> CodecResult<bool> {
        Ok(has_exact_class(dict, MODULE, CLASS))
    }

    fn to_dict(&self, value: &Value, _enc: &Encoder<'_>) -> CodecResult<Map<String, Json>> {
        let Value::Bytes(data) = value else {
            return Err(CodecError::Encode(format!(
                "bytes codec cannot encode `{}`",
                value.kind()
            )));
        };
        let mut dict = Map::new();
        dict.insert("latin-1".to_string(), Json::String(bytes_to_latin1(data)));
        insert_class_keys(&mut dict, MODULE, CLASS);
        Ok(dict)
    }

    fn from_dict(&self, dict: &Map<String, Json>, _dec: &Decoder<'_>) -> CodecResult<Value> {
        let text = require_str(dict, "latin-1", self.name())?;
        Ok(Value::Bytes(latin1_to_bytes(text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn latin1_covers_every_byte_value() {
        let all: Vec<u8> = (0..=255).collect();
        let text = bytes_to_latin1(&all);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(latin1_to_bytes(&text).unwrap(), all);
    }

    #[test]
    fn non_latin1_text_is_rejected() {
        let err = latin1_to_bytes("snowman \u{2603}").unwrap_err();
        assert!(matches!(err, CodecError::MalformedDict(_)));
    }
}
