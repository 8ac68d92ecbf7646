use serde_json::{Map, Value as Json};

use crate::codecs::{Codec, has_exact_class, insert_class_keys, require_str};
use crate::error::{CodecError, CodecResult};
use crate::registry::{Decoder, Encoder};
use crate::resolve::ClassResolver;
use crate::types::{DataType, NdArray, element_count};
use crate::value::Value;

const MODULE: &str = "numpy";
const CLASS: &str = "ndarray";

/// N-dimensional numeric arrays:
/// `{"dtype": "<string>", "shape": [<ints>], "bytes": <bytes dict>}`.
///
/// The payload is the flat row-major buffer, little-endian, carried as a
/// nested bytes dict so it rides through JSON as latin-1 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdArrayCodec;

impl Codec for NdArrayCodec {
    fn name(&self) -> &'static str {
        "ndarray"
    }

    fn matches_value(&self, value: &Value) -> bool {
        matches!(value, Value::Array(_))
    }

    fn matches_dict(
        &self,
        dict: &Map<String, Json>,
        _resolver: &dyn ClassResolver,
    ) -> CodecResult<bool> {
        Ok(has_exact_class(dict, MODULE, CLASS))
    }

    fn to_dict(&self, value: &Value, enc: &Encoder<'_>) -> CodecResult<Map<String, Json>> {
        let Value::Array(array) = value else {
            return Err(CodecError::Encode(format!(
                "ndarray codec cannot encode `{}`",
                value.kind()
            )));
        };
        let mut dict = Map::new();
        dict.insert(
            "dtype".to_string(),
            Json::String(array.dtype().name().to_string()),
        );
        dict.insert(
            "shape".to_string(),
            Json::Array(array.shape().iter().map(|&d| Json::from(d)).collect()),
        );
        let payload = Value::Bytes(array.to_bytes()?);
        dict.insert("bytes".to_string(), enc.encode_value(&payload)?);
        insert_class_keys(&mut dict, MODULE, CLASS);
        Ok(dict)
    }

    fn from_dict(&self, dict: &Map<String, Json>, dec: &Decoder<'_>) -> CodecResult<Value> {
        let dtype_name = require_str(dict, "dtype", self.name())?;
        let dtype = DataType::parse(dtype_name).ok_or_else(|| {
            CodecError::MalformedDict(format!("unknown dtype `{dtype_name}`"))
        })?;
        let shape = parse_shape(dict)?;

        // Size the implied allocation before touching the payload.
        let expected = element_count(&shape)?
            .checked_mul(dtype.byte_size())
            .ok_or_else(|| {
                CodecError::DecodeOverflow(format!("shape {shape:?} overflows"))
            })?;
        let max = dec.limits().max_array_bytes;
        if expected > max {
            return Err(CodecError::DecodeOverflow(format!(
                "array of dtype {dtype} with shape {shape:?} needs {expected} bytes, limit is {max}"
            )));
        }

        let payload = dict.get("bytes").ok_or_else(|| {
            CodecError::MalformedDict("ndarray dict is missing `bytes`".to_string())
        })?;
        let Value::Bytes(raw) = dec.decode_value(payload)? else {
            return Err(CodecError::MalformedDict(
                "ndarray dict key `bytes` does not hold a bytes payload".to_string(),
            ));
        };
        Ok(Value::Array(NdArray::from_bytes(dtype, shape, &raw)?))
    }
}

fn parse_shape(dict: &Map<String, Json>) -> CodecResult<Vec<usize>> {
    let shape = dict
        .get("shape")
        .ok_or_else(|| CodecError::MalformedDict("ndarray dict is missing `shape`".to_string()))?
        .as_array()
        .ok_or_else(|| {
            CodecError::MalformedDict("ndarray dict key `shape` is not a sequence".to_string())
        })?;
    shape
        .iter()
        .map(|dim| {
            dim.as_u64()
                .and_then(|d| usize::try_from(d).ok())
                .ok_or_else(|| {
                    CodecError::MalformedDict(format!(
                        "ndarray shape entry `{dim}` is not a non-negative integer"
                    ))
                })
        })
        .collect()
}
