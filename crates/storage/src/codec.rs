//! Serialization format and byte codec seams.
//!
//! Every record written by the store goes through two stages:
//!
//! 1. [`RecordFormat`] turns the structured record (Meta or Chunk) into bytes.
//!    MessagePack is the default; JSON is available for inspection.
//! 2. [`StorageCodec`] transforms those bytes before they hit disk. The only
//!    built-in codec is [`IdentityCodec`]; the seam exists for compression or
//!    encryption at rest.
//!
//! Both are selected by name from configuration.

use crumb_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Byte-level storage codec.
///
/// Codecs must be `Send + Sync` so a store can be shared across threads.
/// The codec id is written into every record envelope and checked on read.
pub trait StorageCodec: Send + Sync {
    /// Encode bytes for storage.
    fn encode(&self, data: &[u8]) -> Vec<u8>;

    /// Decode bytes read from storage.
    fn decode(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CodecError>;

    /// Unique codec identifier.
    fn codec_id(&self) -> &str;
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Decoding failed
    #[error("Decode error (codec={codec_id}, data_len={data_len}): {detail}")]
    DecodeError {
        /// Human-readable error description
        detail: String,
        /// Codec ID that attempted the decode
        codec_id: String,
        /// Length of the data that failed to decode
        data_len: usize,
    },

    /// Unknown codec identifier
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),

    /// Unknown record format name
    #[error("Unknown record format: {0}")]
    UnknownFormat(String),
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::DecodeError { .. } => Error::corruption(e),
            CodecError::UnknownCodec(_) | CodecError::UnknownFormat(_) => Error::Config {
                reason: e.to_string(),
            },
        }
    }
}

/// Identity codec - bytes pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl StorageCodec for IdentityCodec {
    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decode(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn codec_id(&self) -> &str {
        "identity"
    }
}

/// Get a codec by its identifier.
///
/// # Known Codecs
///
/// - `"identity"`: No-op codec (pass-through)
pub fn get_codec(codec_id: &str) -> std::result::Result<Box<dyn StorageCodec>, CodecError> {
    match codec_id {
        "identity" => Ok(Box::new(IdentityCodec)),
        _ => Err(CodecError::UnknownCodec(codec_id.to_string())),
    }
}

/// Serialization format for structured records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// MessagePack with named fields
    #[default]
    #[serde(rename = "msgpack")]
    MessagePack,
    /// UTF-8 JSON
    Json,
}

impl RecordFormat {
    /// Look up a format by its configuration name
    pub fn from_name(name: &str) -> std::result::Result<Self, CodecError> {
        match name {
            "msgpack" => Ok(RecordFormat::MessagePack),
            "json" => Ok(RecordFormat::Json),
            _ => Err(CodecError::UnknownFormat(name.to_string())),
        }
    }

    /// Configuration name
    pub fn name(&self) -> &'static str {
        match self {
            RecordFormat::MessagePack => "msgpack",
            RecordFormat::Json => "json",
        }
    }

    /// Tag byte stored in the record envelope
    pub fn tag(&self) -> u8 {
        match self {
            RecordFormat::MessagePack => 1,
            RecordFormat::Json => 2,
        }
    }

    /// Inverse of [`RecordFormat::tag`]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(RecordFormat::MessagePack),
            2 => Some(RecordFormat::Json),
            _ => None,
        }
    }

    /// Serialize a record
    pub fn serialize<T: Serialize>(&self, record: &T) -> Result<Vec<u8>> {
        match self {
            RecordFormat::MessagePack => rmp_serde::to_vec_named(record).map_err(Error::serialization),
            RecordFormat::Json => serde_json::to_vec(record).map_err(Error::serialization),
        }
    }

    /// Deserialize a record
    pub fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            RecordFormat::MessagePack => rmp_serde::from_slice(bytes).map_err(Error::serialization),
            RecordFormat::Json => serde_json::from_slice(bytes).map_err(Error::serialization),
        }
    }
}
