//! Persistent store for tenant Meta and chunk records
//!
//! The store has no business logic: it reads, writes and deletes whole
//! records. It keeps no cache, so every read goes to the backing medium.
//! Callers run [`Store::ensure_tenant`] before the first access to a tenant.
//!
//! Two implementations:
//! - [`FileStore`]: one `.ck` file per record, written atomically
//! - [`MemoryStore`]: process-local maps, for tests and ephemeral use

use crate::codec::{get_codec, RecordFormat, StorageCodec};
use crate::paths::{validate_tenant_name, StorePaths, META_FILE_NAME, RECORD_EXTENSION};
use crate::record::{decode_record, encode_record};
use crumb_core::{Chunk, ChunkId, Error, Meta, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Record-level access to tenant data
pub trait Store: Send + Sync {
    /// Create the tenant and an empty Meta if absent.
    ///
    /// Idempotent. Returns `true` when the tenant was created by this call.
    fn ensure_tenant(&self, tenant: &str) -> Result<bool>;

    /// Remove a tenant and all its records. Absent tenants are ignored.
    fn delete_tenant(&self, tenant: &str) -> Result<()>;

    /// Read a tenant's Meta, failing with `MetaNotFound`
    fn read_meta(&self, tenant: &str) -> Result<Meta>;

    /// Replace a tenant's Meta
    fn write_meta(&self, tenant: &str, meta: &Meta) -> Result<()>;

    /// Read a chunk, failing with `ChunkNotFound`
    fn read_chunk(&self, tenant: &str, chunk: &str) -> Result<Chunk>;

    /// Replace a chunk's contents
    fn write_chunk(&self, tenant: &str, chunk: &str, contents: &Chunk) -> Result<()>;

    /// Delete a chunk, failing with `ChunkNotFound`
    fn delete_chunk(&self, tenant: &str, chunk: &str) -> Result<()>;

    /// Stored size of a chunk in bytes
    fn chunk_size(&self, tenant: &str, chunk: &str) -> Result<u64>;

    /// Ids of every chunk record present for the tenant, sorted
    fn list_chunks(&self, tenant: &str) -> Result<Vec<ChunkId>>;
}

// =============================================================================
// FileStore
// =============================================================================

/// Directory-backed store
pub struct FileStore {
    paths: StorePaths,
    format: RecordFormat,
    codec: Box<dyn StorageCodec>,
}

impl FileStore {
    /// Create a store over `root` with an explicit format and codec
    pub fn new(root: impl AsRef<Path>, format: RecordFormat, codec: Box<dyn StorageCodec>) -> Self {
        FileStore {
            paths: StorePaths::from_root(root),
            format,
            codec,
        }
    }

    /// Create a store, resolving format and codec by name
    pub fn open(root: impl AsRef<Path>, format: &str, codec_id: &str) -> Result<Self> {
        let format = RecordFormat::from_name(format)?;
        let codec = get_codec(codec_id)?;
        Ok(Self::new(root, format, codec))
    }

    /// Directory layout
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Format used for new writes
    pub fn format(&self) -> RecordFormat {
        self.format
    }

    fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record<T: serde::Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        let bytes = encode_record(record, self.format, self.codec.as_ref())?;
        write_atomic(path, &bytes)
    }
}

/// Write a file atomically (write-fsync-rename)
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path: PathBuf = path.with_extension("tmp");

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    if let Some(parent) = path.parent() {
        if parent.exists() {
            File::open(parent)?.sync_all()?;
        }
    }

    Ok(())
}

impl Store for FileStore {
    fn ensure_tenant(&self, tenant: &str) -> Result<bool> {
        let dir = self.paths.tenant_dir(tenant)?;
        fs::create_dir_all(&dir)?;

        let meta_path = self.paths.meta_file(tenant)?;
        if meta_path.exists() {
            return Ok(false);
        }

        self.write_record(&meta_path, &Meta::new())?;
        info!(target: "crumb::store", tenant, path = ?dir, "Tenant initialised");
        Ok(true)
    }

    fn delete_tenant(&self, tenant: &str) -> Result<()> {
        let dir = self.paths.tenant_dir(tenant)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!(target: "crumb::store", tenant, "Tenant deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_meta(&self, tenant: &str) -> Result<Meta> {
        let path = self.paths.meta_file(tenant)?;
        let bytes = Self::read_file(&path)?.ok_or_else(|| Error::MetaNotFound {
            tenant: tenant.to_string(),
        })?;
        decode_record(&bytes, self.codec.as_ref())
    }

    fn write_meta(&self, tenant: &str, meta: &Meta) -> Result<()> {
        let path = self.paths.meta_file(tenant)?;
        self.write_record(&path, meta)
    }

    fn read_chunk(&self, tenant: &str, chunk: &str) -> Result<Chunk> {
        let path = self.paths.chunk_file(tenant, chunk)?;
        let bytes = Self::read_file(&path)?.ok_or_else(|| Error::ChunkNotFound {
            chunk: chunk.to_string(),
        })?;
        decode_record(&bytes, self.codec.as_ref())
    }

    fn write_chunk(&self, tenant: &str, chunk: &str, contents: &Chunk) -> Result<()> {
        let path = self.paths.chunk_file(tenant, chunk)?;
        self.write_record(&path, contents)?;
        debug!(target: "crumb::store", tenant, chunk, documents = contents.len(), "Chunk written");
        Ok(())
    }

    fn delete_chunk(&self, tenant: &str, chunk: &str) -> Result<()> {
        let path = self.paths.chunk_file(tenant, chunk)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(target: "crumb::store", tenant, chunk, "Chunk deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::ChunkNotFound {
                chunk: chunk.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn chunk_size(&self, tenant: &str, chunk: &str) -> Result<u64> {
        let path = self.paths.chunk_file(tenant, chunk)?;
        match fs::metadata(&path) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::ChunkNotFound {
                chunk: chunk.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn list_chunks(&self, tenant: &str) -> Result<Vec<ChunkId>> {
        let dir = self.paths.tenant_dir(tenant)?;
        let mut chunks = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == META_FILE_NAME {
                continue;
            }
            if let Some(id) = name.strip_suffix(&format!(".{}", RECORD_EXTENSION)) {
                chunks.push(id.to_string());
            }
        }

        chunks.sort();
        Ok(chunks)
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

#[derive(Debug, Default)]
struct TenantRecords {
    meta: Meta,
    chunks: HashMap<ChunkId, Chunk>,
}

/// In-memory store; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    tenants: RwLock<HashMap<String, TenantRecords>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn ensure_tenant(&self, tenant: &str) -> Result<bool> {
        validate_tenant_name(tenant)?;
        let mut tenants = self.tenants.write();
        if tenants.contains_key(tenant) {
            return Ok(false);
        }
        tenants.insert(tenant.to_string(), TenantRecords::default());
        Ok(true)
    }

    fn delete_tenant(&self, tenant: &str) -> Result<()> {
        self.tenants.write().remove(tenant);
        Ok(())
    }

    fn read_meta(&self, tenant: &str) -> Result<Meta> {
        self.tenants
            .read()
            .get(tenant)
            .map(|t| t.meta.clone())
            .ok_or_else(|| Error::MetaNotFound {
                tenant: tenant.to_string(),
            })
    }

    fn write_meta(&self, tenant: &str, meta: &Meta) -> Result<()> {
        let mut tenants = self.tenants.write();
        tenants.entry(tenant.to_string()).or_default().meta = meta.clone();
        Ok(())
    }

    fn read_chunk(&self, tenant: &str, chunk: &str) -> Result<Chunk> {
        self.tenants
            .read()
            .get(tenant)
            .and_then(|t| t.chunks.get(chunk))
            .cloned()
            .ok_or_else(|| Error::ChunkNotFound {
                chunk: chunk.to_string(),
            })
    }

    fn write_chunk(&self, tenant: &str, chunk: &str, contents: &Chunk) -> Result<()> {
        let mut tenants = self.tenants.write();
        tenants
            .entry(tenant.to_string())
            .or_default()
            .chunks
            .insert(chunk.to_string(), contents.clone());
        Ok(())
    }

    fn delete_chunk(&self, tenant: &str, chunk: &str) -> Result<()> {
        self.tenants
            .write()
            .get_mut(tenant)
            .and_then(|t| t.chunks.remove(chunk))
            .map(|_| ())
            .ok_or_else(|| Error::ChunkNotFound {
                chunk: chunk.to_string(),
            })
    }

    fn chunk_size(&self, tenant: &str, chunk: &str) -> Result<u64> {
        let contents = self.read_chunk(tenant, chunk)?;
        Ok(RecordFormat::MessagePack.serialize(&contents)?.len() as u64)
    }

    fn list_chunks(&self, tenant: &str) -> Result<Vec<ChunkId>> {
        let mut chunks: Vec<ChunkId> = self
            .tenants
            .read()
            .get(tenant)
            .map(|t| t.chunks.keys().cloned().collect())
            .unwrap_or_default();
        chunks.sort();
        Ok(chunks)
    }
}
