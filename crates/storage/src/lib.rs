//! Storage layer for crumb
//!
//! This crate persists per-tenant records:
//! - Meta: the tenant's key, table and uniqueness indexes
//! - Chunk: a bounded group of documents of one table, keyed by document key
//!
//! Records are framed by a checksummed envelope (see [`record`]) and written
//! atomically. The serialization format and byte codec are pluggable.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod paths;
pub mod record;
pub mod store;

pub use codec::{get_codec, CodecError, IdentityCodec, RecordFormat, StorageCodec};
pub use paths::{validate_tenant_name, StorePaths, META_FILE_NAME, RECORD_EXTENSION, TENANTS_DIR};
pub use record::{decode_record, encode_record, RECORD_FORMAT_VERSION, RECORD_MAGIC};
pub use store::{FileStore, MemoryStore, Store};
