//! Record envelope written to every `.ck` file
//!
//! # Format
//!
//! ```text
//! +--------------------+
//! | Magic: "CRMB"      | 4 bytes
//! | Format Version     | 4 bytes (u32 LE)
//! | Record Format Tag  | 1 byte (1 = msgpack, 2 = json)
//! | Codec ID Length    | 4 bytes (u32 LE)
//! | Codec ID           | variable
//! | Payload Length     | 8 bytes (u64 LE)
//! | Payload            | variable (codec-encoded serialized record)
//! | CRC32              | 4 bytes (of all preceding bytes)
//! +--------------------+
//! ```
//!
//! The record format tag travels with the file, so a store configured for
//! one format still reads files written in the other.

use crate::codec::{RecordFormat, StorageCodec};
use crumb_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Envelope magic bytes: "CRMB"
pub const RECORD_MAGIC: [u8; 4] = *b"CRMB";

/// Current envelope format version
pub const RECORD_FORMAT_VERSION: u32 = 1;

// magic(4) + version(4) + tag(1) + codec_len(4) + payload_len(8) + crc(4)
const MIN_RECORD_LEN: usize = 25;

/// Serialize, encode and frame a record
pub fn encode_record<T: Serialize>(
    record: &T,
    format: RecordFormat,
    codec: &dyn StorageCodec,
) -> Result<Vec<u8>> {
    let payload = codec.encode(&format.serialize(record)?);
    let codec_id = codec.codec_id().as_bytes();

    let mut bytes = Vec::with_capacity(MIN_RECORD_LEN + codec_id.len() + payload.len());
    bytes.extend_from_slice(&RECORD_MAGIC);
    bytes.extend_from_slice(&RECORD_FORMAT_VERSION.to_le_bytes());
    bytes.push(format.tag());
    bytes.extend_from_slice(&(codec_id.len() as u32).to_le_bytes());
    bytes.extend_from_slice(codec_id);
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&payload);

    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());

    Ok(bytes)
}

/// Verify, unframe, decode and deserialize a record
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8], codec: &dyn StorageCodec) -> Result<T> {
    if bytes.len() < MIN_RECORD_LEN {
        return Err(Error::corruption("record too short"));
    }

    if bytes[0..4] != RECORD_MAGIC {
        return Err(Error::corruption("invalid record magic"));
    }

    let (data, crc_bytes) = bytes.split_at(bytes.len() - 4);
    let stored_crc = read_u32(crc_bytes, 0)?;
    let computed_crc = crc32fast::hash(data);
    if stored_crc != computed_crc {
        return Err(Error::corruption(format!(
            "checksum mismatch: expected {:08x}, computed {:08x}",
            stored_crc, computed_crc
        )));
    }

    let mut cursor = 4;

    let version = read_u32(data, cursor)?;
    cursor += 4;
    if version != RECORD_FORMAT_VERSION {
        return Err(Error::corruption(format!(
            "unsupported record version {}",
            version
        )));
    }

    let format = RecordFormat::from_tag(data[cursor])
        .ok_or_else(|| Error::corruption(format!("unknown record format tag {}", data[cursor])))?;
    cursor += 1;

    let codec_len = read_u32(data, cursor)? as usize;
    cursor += 4;
    let codec_id = data
        .get(cursor..cursor + codec_len)
        .ok_or_else(|| Error::corruption("record too short"))?;
    if codec_id != codec.codec_id().as_bytes() {
        return Err(Error::corruption(format!(
            "codec mismatch: record uses {:?}, store uses {:?}",
            String::from_utf8_lossy(codec_id),
            codec.codec_id()
        )));
    }
    cursor += codec_len;

    let payload_len = read_u64(data, cursor)? as usize;
    cursor += 8;
    let payload = data
        .get(cursor..)
        .filter(|p| p.len() == payload_len)
        .ok_or_else(|| Error::corruption("payload length mismatch"))?;

    format.deserialize(&codec.decode(payload)?)
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::corruption("record too short"))
}

fn read_u64(bytes: &[u8], at: usize) -> Result<u64> {
    bytes
        .get(at..at + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| Error::corruption("record too short"))
}
