use std::sync::Arc;

use serde_json::{Map, Number, Value as Json};

use crate::codecs::{Codec, KEY_IS_CUSTOM, KEY_UNIT_REGISTRY, require_str};
use crate::error::{CodecError, CodecResult};
use crate::registry::{Decoder, Encoder, decode_number};
use crate::resolve::ClassResolver;
use crate::units::{Magnitude, Quantity, UnitRegistry};
use crate::value::Value;

// Units and quantities come from a pluggable unit registry, so their dicts
// cannot carry an importable class name. They self-identify through the
// `pint_unit_registry` discriminator plus their required keys instead.

fn stamp_discriminator(dict: &mut Map<String, Json>, registry_id: &str) {
    dict.insert(KEY_IS_CUSTOM.to_string(), Json::Bool(true));
    dict.insert(
        KEY_UNIT_REGISTRY.to_string(),
        Json::String(registry_id.to_string()),
    );
}

fn discriminator_matches(dict: &Map<String, Json>, registry_id: &str, payload_keys: &[&str]) -> bool {
    let stamped = dict.contains_key(KEY_IS_CUSTOM)
        && payload_keys.iter().all(|key| dict.contains_key(*key));
    stamped
        && dict.get(KEY_UNIT_REGISTRY).and_then(Json::as_str) == Some(registry_id)
}

// ---------------------------------------------------------------------------
// QuantityCodec
// ---------------------------------------------------------------------------

/// Physical quantities: `{"magnitude": <number or array dict>, "unit":
/// "<token>", ":is_custom:": true, "pint_unit_registry": "<id>"}`.
pub struct QuantityCodec {
    units: Arc<dyn UnitRegistry>,
}

impl QuantityCodec {
    pub fn new(units: Arc<dyn UnitRegistry>) -> Self {
        Self { units }
    }
}

impl Codec for QuantityCodec {
    fn name(&self) -> &'static str {
        "quantity"
    }

    fn matches_value(&self, value: &Value) -> bool {
        matches!(value, Value::Quantity(q) if q.unit().registry_id() == self.units.id())
    }

    fn matches_dict(
        &self,
        dict: &Map<String, Json>,
        _resolver: &dyn ClassResolver,
    ) -> CodecResult<bool> {
        Ok(discriminator_matches(
            dict,
            self.units.id(),
            &["magnitude", "unit"],
        ))
    }

    fn to_dict(&self, value: &Value, enc: &Encoder<'_>) -> CodecResult<Map<String, Json>> {
        let Value::Quantity(quantity) = value else {
            return Err(CodecError::Encode(format!(
                "quantity codec cannot encode `{}`",
                value.kind()
            )));
        };
        let magnitude = match quantity.magnitude() {
            Magnitude::Int(i) => Json::Number(Number::from(*i)),
            Magnitude::Float(f) => Number::from_f64(*f).map(Json::Number).ok_or_else(|| {
                CodecError::Encode(format!("non-finite magnitude {f} is not JSON-representable"))
            })?,
            Magnitude::Array(array) => enc.encode_value(&Value::Array(array.clone()))?,
        };
        let mut dict = Map::new();
        dict.insert("magnitude".to_string(), magnitude);
        dict.insert(
            "unit".to_string(),
            Json::String(quantity.unit().token()),
        );
        stamp_discriminator(&mut dict, self.units.id());
        Ok(dict)
    }

    fn from_dict(&self, dict: &Map<String, Json>, dec: &Decoder<'_>) -> CodecResult<Value> {
        let token = require_str(dict, "unit", self.name())?;
        let unit = self.units.parse_unit(token)?;

        let magnitude = dict.get("magnitude").ok_or_else(|| {
            CodecError::MalformedDict("quantity dict is missing `magnitude`".to_string())
        })?;
        let magnitude = match magnitude {
            Json::Number(n) => match decode_number(n)? {
                Value::Int(i) => Magnitude::Int(i),
                Value::Float(f) => Magnitude::Float(f),
                _ => unreachable!("decode_number yields int or float"),
            },
            Json::Object(_) => match dec.decode_value(magnitude)? {
                Value::Array(array) => Magnitude::Array(array),
                other => {
                    return Err(CodecError::MalformedDict(format!(
                        "quantity magnitude decodes to `{}`, expected an array",
                        other.kind()
                    )));
                }
            },
            other => {
                return Err(CodecError::MalformedDict(format!(
                    "quantity magnitude must be a number or array dict, got {other}"
                )));
            }
        };
        Ok(Value::Quantity(Quantity::new(magnitude, unit)))
    }
}

// ---------------------------------------------------------------------------
// UnitCodec
// ---------------------------------------------------------------------------

/// Bare units: `{"unit_name": "<token>", "pint_unit_registry": "<id>",
/// ":is_custom:": true}`.
pub struct UnitCodec {
    units: Arc<dyn UnitRegistry>,
}

impl UnitCodec {
    pub fn new(units: Arc<dyn UnitRegistry>) -> Self {
        Self { units }
    }
}

impl Codec for UnitCodec {
    fn name(&self) -> &'static str {
        "unit"
    }

    fn matches_value(&self, value: &Value) -> bool {
        matches!(value, Value::Unit(u) if u.registry_id() == self.units.id())
    }

    fn matches_dict(
        &self,
        dict: &Map<String, Json>,
        _resolver: &dyn ClassResolver,
    ) -> CodecResult<bool> {
        Ok(discriminator_matches(dict, self.units.id(), &["unit_name"]))
    }

    fn to_dict(&self, value: &Value, _enc: &Encoder<'_>) -> CodecResult<Map<String, Json>> {
        let Value::Unit(unit) = value else {
            return Err(CodecError::Encode(format!(
                "unit codec cannot encode `{}`",
                value.kind()
            )));
        };
        let mut dict = Map::new();
        dict.insert("unit_name".to_string(), Json::String(unit.token()));
        stamp_discriminator(&mut dict, self.units.id());
        Ok(dict)
    }

    fn from_dict(&self, dict: &Map<String, Json>, _dec: &Decoder<'_>) -> CodecResult<Value> {
        let token = require_str(dict, "unit_name", self.name())?;
        Ok(Value::Unit(self.units.parse_unit(token)?))
    }
}
