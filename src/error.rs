use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("no codec found: {0}")]
    NoCodecFound(String),

    #[error("unknown class `{module}.{qualname}`")]
    UnknownClass { module: String, qualname: String },

    #[error("malformed canonical dict: {0}")]
    MalformedDict(String),

    #[error("decode overflow: {0}")]
    DecodeOverflow(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unit parse error: {0}")]
    UnitParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
