use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::codecs::{
    Codec, KEY_CLASS, KEY_IS_CUSTOM, KEY_MODULE, class_keys, insert_class_keys,
};
use crate::error::{CodecError, CodecResult};
use crate::registry::{Decoder, Encoder};
use crate::resolve::{ClassRef, ClassResolver};
use crate::settings::SettingsObject;
use crate::value::Value;

/// Structured settings objects and their whole subtype hierarchy:
/// `{__module__, __class__, :is_custom:, <one key per declared field>}`.
///
/// `__class__` names the object's actual class, so decode reconstructs the
/// exact subtype via the resolver even though the codec is registered
/// against the base class.
#[derive(Debug, Clone)]
pub struct SettingsCodec {
    base: ClassRef,
}

impl SettingsCodec {
    pub fn new(base: ClassRef) -> Self {
        Self { base }
    }
}

impl Codec for SettingsCodec {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn matches_value(&self, value: &Value) -> bool {
        matches!(value, Value::Settings(_))
    }

    fn matches_dict(
        &self,
        dict: &Map<String, Json>,
        resolver: &dyn ClassResolver,
    ) -> CodecResult<bool> {
        let Some((module, class)) = class_keys(dict) else {
            return Ok(false);
        };
        resolver.is_subclass(&ClassRef::new(module, class), &self.base)
    }

    fn to_dict(&self, value: &Value, enc: &Encoder<'_>) -> CodecResult<Map<String, Json>> {
        let Value::Settings(obj) = value else {
            return Err(CodecError::Encode(format!(
                "settings codec cannot encode `{}`",
                value.kind()
            )));
        };
        let mut dict = Map::new();
        for (field, field_value) in obj.fields() {
            dict.insert(field.clone(), enc.encode_value(field_value)?);
        }
        insert_class_keys(&mut dict, &obj.class().module, &obj.class().qualname);
        Ok(dict)
    }

    fn from_dict(&self, dict: &Map<String, Json>, dec: &Decoder<'_>) -> CodecResult<Value> {
        let (module, class) = class_keys(dict).ok_or_else(|| {
            CodecError::MalformedDict(
                "settings dict is missing `__module__`/`__class__`".to_string(),
            )
        })?;
        let spec = dec.resolver().resolve(module, class)?;

        let mut fields = IndexMap::new();
        for (key, value) in dict {
            if key == KEY_MODULE || key == KEY_CLASS || key == KEY_IS_CUSTOM {
                continue;
            }
            fields.insert(key.clone(), dec.decode_value(value)?);
        }
        Ok(Value::Settings(SettingsObject::new(&spec, fields)?))
    }
}
