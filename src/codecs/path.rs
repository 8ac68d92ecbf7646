use std::path::PathBuf;

use serde_json::{Map, Value as Json};

use crate::codecs::{Codec, has_exact_class, insert_class_keys, require_str};
use crate::error::{CodecError, CodecResult};
use crate::registry::{Decoder, Encoder};
use crate::resolve::ClassResolver;
use crate::value::Value;

// Class tags match the original wire format for filesystem paths.
const MODULE: &str = "pathlib";
const CLASS: &str = "Path";

/// Filesystem paths: `{"path": "<string>"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCodec;

impl Codec for PathCodec {
    fn name(&self) -> &'static str {
        "path"
    }

    fn matches_value(&self, value: &Value) -> bool {
        matches!(value, Value::Path(_))
    }

    fn matches_dict(
        &self,
        dict: &Map<String, Json>,
        _resolver: &dyn ClassResolver,
    ) -> CodecResult<bool> {
        Ok(has_exact_class(dict, MODULE, CLASS))
    }

    fn to_dict(&self, value: &Value, _enc: &Encoder<'_>) -> CodecResult<Map<String, Json>> {
        let Value::Path(path) = value else {
            return Err(CodecError::Encode(format!(
                "path codec cannot encode `{}`",
                value.kind()
            )));
        };
        let text = path.to_str().ok_or_else(|| {
            CodecError::Encode(format!("path {path:?} is not valid UTF-8"))
        })?;
        let mut dict = Map::new();
        dict.insert("path".to_string(), Json::String(text.to_string()));
        insert_class_keys(&mut dict, MODULE, CLASS);
        Ok(dict)
    }

    fn from_dict(&self, dict: &Map<String, Json>, _dec: &Decoder<'_>) -> CodecResult<Value> {
        let text = require_str(dict, "path", self.name())?;
        Ok(Value::Path(PathBuf::from(text)))
    }
}
