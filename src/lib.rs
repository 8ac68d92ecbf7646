pub mod codecs;
pub mod error;
pub mod json;
pub mod registry;
pub mod resolve;
pub mod settings;
pub mod types;
pub mod units;
pub mod value;

// Re-export key types at crate root for convenience.
pub use error::{CodecError, CodecResult};
pub use json::JsonSerializer;
pub use registry::{CodecRegistry, DecodeLimits, Decoder, Encoder, default_codecs};
pub use resolve::{ClassRef, ClassResolver, ClassSpec, MapClassResolver};
pub use settings::SettingsObject;
pub use types::{ArrayData, DataType, NdArray};
pub use units::{Magnitude, Quantity, SimpleUnitRegistry, UnitExpr, UnitRegistry};
pub use value::Value;
