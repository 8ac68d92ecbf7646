//! End-to-end encode/decode behavior of the default codec stack.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{Value as Json, json};

use simplecodec::{
    ArrayData, ClassRef, ClassResolver, ClassSpec, CodecError, CodecRegistry, DecodeLimits,
    JsonSerializer, Magnitude, MapClassResolver, NdArray, Quantity, SettingsObject,
    SimpleUnitRegistry, UnitRegistry, Value,
};

const UNITS_ID: &str = "openff_units";

fn base_class() -> ClassRef {
    ClassRef::new("app.settings", "BaseSettings")
}

fn solver_class() -> ClassRef {
    ClassRef::new("app.settings", "SolverSettings")
}

fn resolver() -> Arc<MapClassResolver> {
    let mut resolver = MapClassResolver::new();
    resolver.register_class(ClassSpec::new(base_class(), None, vec![]));
    resolver.register_class(ClassSpec::new(
        solver_class(),
        Some(base_class()),
        vec!["tolerance".into(), "max_steps".into(), "cutoff".into()],
    ));
    Arc::new(resolver)
}

fn registry() -> CodecRegistry {
    CodecRegistry::with_default_codecs(
        resolver(),
        Arc::new(SimpleUnitRegistry::with_defaults(UNITS_ID)),
        base_class(),
    )
}

fn units() -> SimpleUnitRegistry {
    SimpleUnitRegistry::with_defaults(UNITS_ID)
}

fn sorted_keys(dict: &serde_json::Map<String, Json>) -> Vec<&str> {
    let mut keys: Vec<&str> = dict.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn bytes_round_trip_including_extreme_bytes() {
    let registry = registry();
    let value = Value::Bytes(vec![0x00, 0xFF, 0x41]);
    let dict = registry.encode(&value).unwrap();
    assert_eq!(
        sorted_keys(&dict),
        vec![":is_custom:", "__class__", "__module__", "latin-1"]
    );
    assert_eq!(dict["__module__"], json!("builtins"));
    assert_eq!(dict["__class__"], json!("bytes"));
    assert_eq!(registry.decode(&dict).unwrap(), value);
}

#[test]
fn int64_array_round_trip_keeps_dtype_and_shape() {
    let registry = registry();
    let array = NdArray::new(vec![2, 3], ArrayData::Int64(vec![1, 2, 3, 4, 5, 6])).unwrap();
    let dict = registry.encode(&Value::Array(array.clone())).unwrap();
    assert_eq!(dict["dtype"], json!("int64"));
    assert_eq!(dict["shape"], json!([2, 3]));
    assert_eq!(
        sorted_keys(&dict),
        vec![":is_custom:", "__class__", "__module__", "bytes", "dtype", "shape"]
    );

    let Value::Array(back) = registry.decode(&dict).unwrap() else {
        panic!("array dict decoded to a non-array value");
    };
    assert_eq!(back, array);
}

#[test]
fn path_round_trip() {
    let registry = registry();
    let value = Value::Path(PathBuf::from("/tmp/data.txt"));
    let dict = registry.encode(&value).unwrap();
    assert_eq!(dict["path"], json!("/tmp/data.txt"));
    assert_eq!(registry.decode(&dict).unwrap(), value);
}

#[test]
fn quantity_round_trip_with_marker_and_discriminator() {
    let registry = registry();
    let unit = units().parse_unit("meter/second**2").unwrap();
    let value = Value::Quantity(Quantity::new(Magnitude::Float(9.8), unit));

    let dict = registry.encode(&value).unwrap();
    assert_eq!(dict["magnitude"], json!(9.8));
    assert_eq!(dict["unit"], json!("meter / second ** 2"));
    assert_eq!(dict[":is_custom:"], json!(true));
    assert_eq!(dict["pint_unit_registry"], json!(UNITS_ID));

    assert_eq!(registry.decode(&dict).unwrap(), value);
}

#[test]
fn quantity_with_array_magnitude_round_trips() {
    let registry = registry();
    let magnitude =
        Magnitude::Array(NdArray::new(vec![3], ArrayData::Float64(vec![1.0, 2.5, -3.0])).unwrap());
    let unit = units().parse_unit("nanometer").unwrap();
    let value = Value::Quantity(Quantity::new(magnitude, unit));

    let dict = registry.encode(&value).unwrap();
    assert!(dict["magnitude"].is_object());
    assert_eq!(registry.decode(&dict).unwrap(), value);
}

#[test]
fn bare_unit_round_trip() {
    let registry = registry();
    let value = Value::Unit(units().parse_unit("kilocalorie / mole").unwrap());
    let dict = registry.encode(&value).unwrap();
    assert_eq!(
        sorted_keys(&dict),
        vec![":is_custom:", "pint_unit_registry", "unit_name"]
    );
    assert_eq!(dict["unit_name"], json!("kilocalorie / mole"));
    assert_eq!(registry.decode(&dict).unwrap(), value);
}

#[test]
fn settings_round_trip_reconstructs_the_subtype() {
    let registry = registry();
    let spec = resolver().resolve("app.settings", "SolverSettings").unwrap();
    let cutoff = Quantity::new(Magnitude::Float(1.2), units().parse_unit("nanometer").unwrap());

    let mut fields = IndexMap::new();
    fields.insert("tolerance".to_string(), Value::Float(1e-6));
    fields.insert("max_steps".to_string(), Value::Int(1000));
    fields.insert("cutoff".to_string(), Value::Quantity(cutoff));
    let value = Value::Settings(SettingsObject::new(&spec, fields).unwrap());

    let dict = registry.encode(&value).unwrap();
    assert_eq!(dict["__module__"], json!("app.settings"));
    assert_eq!(dict["__class__"], json!("SolverSettings"));
    assert_eq!(dict[":is_custom:"], json!(true));

    let Value::Settings(back) = registry.decode(&dict).unwrap() else {
        panic!("settings dict decoded to a non-settings value");
    };
    assert_eq!(back.class(), &solver_class());
    assert_eq!(Value::Settings(back), value);
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn dispatch_is_deterministic() {
    let registry = registry();
    let value = Value::Bytes(vec![1, 2, 3]);
    let dict = registry.encode(&value).unwrap();
    for _ in 0..3 {
        assert_eq!(registry.select_by_value(&value).unwrap().name(), "bytes");
        assert_eq!(registry.select_by_dict(&dict).unwrap().name(), "bytes");
    }
}

#[test]
fn subtype_dict_routes_to_the_settings_codec() {
    let registry = registry();
    let dict = json!({
        "__module__": "app.settings",
        "__class__": "SolverSettings",
        ":is_custom:": true,
        "tolerance": 0.5,
        "max_steps": 10,
        "cutoff": null,
    });
    let Json::Object(dict) = dict else { unreachable!() };
    assert_eq!(registry.select_by_dict(&dict).unwrap().name(), "settings");
}

#[test]
fn unmatched_value_is_no_codec_found() {
    let registry = registry();
    let err = registry.encode(&Value::Int(7)).unwrap_err();
    assert!(matches!(err, CodecError::NoCodecFound(_)));

    // Quantities from a foreign unit registry are not ours to encode.
    let foreign = SimpleUnitRegistry::with_defaults("other_units");
    let quantity = Quantity::new(Magnitude::Int(1), foreign.parse_unit("meter").unwrap());
    let err = registry.encode(&Value::Quantity(quantity)).unwrap_err();
    assert!(matches!(err, CodecError::NoCodecFound(_)));
}

#[test]
fn unmatched_dict_is_no_codec_found() {
    let registry = registry();
    let Json::Object(dict) = json!({"foo": 1, "bar": [2, 3]}) else {
        unreachable!()
    };
    let err = registry.decode(&dict).unwrap_err();
    assert!(matches!(err, CodecError::NoCodecFound(_)));
}

#[test]
fn unresolvable_class_keys_surface_unknown_class() {
    let registry = registry();
    let Json::Object(dict) = json!({
        "__module__": "app.settings",
        "__class__": "DeletedSettings",
        ":is_custom:": true,
    }) else {
        unreachable!()
    };
    let err = registry.decode(&dict).unwrap_err();
    assert!(matches!(err, CodecError::UnknownClass { .. }));
}

// ---------------------------------------------------------------------------
// Malformed input
// ---------------------------------------------------------------------------

#[test]
fn array_dict_missing_bytes_is_malformed() {
    let registry = registry();
    let Json::Object(dict) = json!({
        "__module__": "numpy",
        "__class__": "ndarray",
        ":is_custom:": true,
        "dtype": "int64",
        "shape": [2, 3],
    }) else {
        unreachable!()
    };
    let err = registry.decode(&dict).unwrap_err();
    assert!(matches!(err, CodecError::MalformedDict(_)));
}

#[test]
fn array_payload_length_mismatch_is_malformed() {
    let registry = registry();
    let array = NdArray::new(vec![4], ArrayData::Int32(vec![1, 2, 3, 4])).unwrap();
    let mut dict = registry.encode(&Value::Array(array)).unwrap();
    // Claim a different shape than the payload carries.
    dict.insert("shape".to_string(), json!([5]));
    let err = registry.decode(&dict).unwrap_err();
    assert!(matches!(err, CodecError::MalformedDict(_)));
}

#[test]
fn oversized_shape_is_rejected_before_allocation() {
    let registry = registry().with_limits(DecodeLimits { max_array_bytes: 64 });
    let Json::Object(dict) = json!({
        "__module__": "numpy",
        "__class__": "ndarray",
        ":is_custom:": true,
        "dtype": "float64",
        "shape": [1_000_000_000],
        "bytes": "",
    }) else {
        unreachable!()
    };
    let err = registry.decode(&dict).unwrap_err();
    assert!(matches!(err, CodecError::DecodeOverflow(_)));
}

// ---------------------------------------------------------------------------
// JSON text bridge
// ---------------------------------------------------------------------------

#[test]
fn nested_structure_survives_a_text_round_trip() {
    let serializer = JsonSerializer::new(registry());
    let spec = resolver().resolve("app.settings", "SolverSettings").unwrap();

    let mut fields = IndexMap::new();
    fields.insert("tolerance".to_string(), Value::Float(1e-6));
    fields.insert("max_steps".to_string(), Value::Int(1000));
    fields.insert(
        "cutoff".to_string(),
        Value::Quantity(Quantity::new(
            Magnitude::Float(1.2),
            units().parse_unit("nanometer").unwrap(),
        )),
    );
    let settings = Value::Settings(SettingsObject::new(&spec, fields).unwrap());

    let mut tree = IndexMap::new();
    tree.insert("label".to_string(), Value::from("benchmark"));
    tree.insert("input".to_string(), Value::Path(PathBuf::from("/tmp/data.txt")));
    tree.insert(
        "weights".to_string(),
        Value::Array(NdArray::new(vec![2, 2], ArrayData::Float32(vec![0.1, 0.2, 0.3, 0.4])).unwrap()),
    );
    tree.insert("blob".to_string(), Value::Bytes(vec![0x00, 0xFF, 0x41]));
    tree.insert("settings".to_string(), settings);
    let value = Value::Dict(tree);

    let text = serializer.serialize(&value).unwrap();
    assert_eq!(serializer.deserialize(&text).unwrap(), value);
}

#[test]
fn plain_json_passes_through_untouched() {
    let serializer = JsonSerializer::new(registry());
    let text = r#"{"a": [1, 2.5, null], "b": {"c": true}}"#;
    let value = serializer.deserialize(text).unwrap();
    let Value::Dict(map) = &value else {
        panic!("expected a dict");
    };
    assert_eq!(map["a"], Value::List(vec![Value::Int(1), Value::Float(2.5), Value::Null]));
    let round = serializer.serialize(&value).unwrap();
    assert_eq!(
        serde_json::from_str::<Json>(&round).unwrap(),
        serde_json::from_str::<Json>(text).unwrap()
    );
}
