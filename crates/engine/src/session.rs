//! Per-operation tenant session
//!
//! A session is opened under the tenant lock, loads Meta once, loads chunks
//! lazily and stages every mutation in memory. Nothing reaches the store
//! until [`Session::commit`], which applies the write set in one pass:
//!
//! 1. write every dirty chunk
//! 2. write Meta
//! 3. delete every reclaimed chunk
//!
//! Dropping a session without committing discards its changes, so an
//! operation that fails halfway leaves the tenant untouched.

use crumb_core::{Chunk, ChunkId, DocKey, Document, Error, Meta, Result};
use crumb_storage::Store;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Read access to documents by key, used by the expander
pub trait DocumentSource {
    /// Whether `key` names a document anywhere in the tenant
    fn contains_key(&self, key: &str) -> bool;

    /// Fetch a copy of the document stored under `key`
    fn document(&mut self, key: &str) -> Result<Option<Document>>;
}

#[derive(Debug, Default)]
struct WriteSet {
    dirty: BTreeSet<ChunkId>,
    created: HashSet<ChunkId>,
    removed: BTreeSet<ChunkId>,
}

/// Staged view of one tenant
pub struct Session<'a> {
    tenant: &'a str,
    store: &'a dyn Store,
    max_documents_per_chunk: usize,
    meta: Meta,
    loaded: HashMap<ChunkId, Chunk>,
    fill: HashMap<ChunkId, usize>,
    writes: WriteSet,
}

impl<'a> Session<'a> {
    /// Load the tenant's Meta and start a session
    pub fn open(store: &'a dyn Store, tenant: &'a str, max_documents_per_chunk: usize) -> Result<Self> {
        let meta = store.read_meta(tenant)?;

        // Chunk fill counts come from key_index so no chunk is read up front.
        let mut fill: HashMap<ChunkId, usize> = HashMap::new();
        for chunk in meta.key_index.values() {
            *fill.entry(chunk.clone()).or_default() += 1;
        }

        Ok(Session {
            tenant,
            store,
            max_documents_per_chunk,
            meta,
            loaded: HashMap::new(),
            fill,
            writes: WriteSet::default(),
        })
    }

    /// Tenant this session belongs to
    pub fn tenant(&self) -> &str {
        self.tenant
    }

    /// Staged Meta
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Staged Meta, mutable
    pub fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    /// Underlying store
    pub fn store(&self) -> &dyn Store {
        self.store
    }

    /// Number of documents `key_index` places in `chunk`
    pub fn chunk_fill(&self, chunk: &str) -> usize {
        self.fill.get(chunk).copied().unwrap_or(0)
    }

    /// Load a chunk, reading it from the store on first access
    pub fn chunk(&mut self, id: &str) -> Result<&Chunk> {
        if !self.loaded.contains_key(id) {
            let chunk = self.store.read_chunk(self.tenant, id)?;
            self.loaded.insert(id.to_string(), chunk);
        }
        self.loaded.get(id).ok_or_else(|| Error::ChunkNotFound {
            chunk: id.to_string(),
        })
    }

    /// Load a chunk for modification and mark it dirty
    pub fn chunk_mut(&mut self, id: &str) -> Result<&mut Chunk> {
        self.chunk(id)?;
        self.writes.dirty.insert(id.to_string());
        self.loaded.get_mut(id).ok_or_else(|| Error::ChunkNotFound {
            chunk: id.to_string(),
        })
    }

    /// Replace a chunk's contents wholesale
    pub fn replace_chunk(&mut self, id: &str, contents: Chunk) {
        self.fill.insert(id.to_string(), contents.len());
        self.loaded.insert(id.to_string(), contents);
        self.writes.dirty.insert(id.to_string());
    }

    /// A fresh document key not present in `key_index`
    pub fn generate_key(&self) -> DocKey {
        loop {
            let key = Uuid::new_v4().to_string();
            if !self.meta.contains_key(&key) {
                return key;
            }
        }
    }

    /// First chunk of `table` below the cap, allocating one if all are full
    pub fn chunk_with_room(&mut self, table: &str) -> Result<ChunkId> {
        let cap = self.max_documents_per_chunk;
        let found = self
            .meta
            .table(table)?
            .chunks
            .iter()
            .find(|id| self.chunk_fill(id) < cap)
            .cloned();

        match found {
            Some(id) => Ok(id),
            None => self.allocate_chunk(table),
        }
    }

    /// Append a new empty chunk to `table`
    pub fn allocate_chunk(&mut self, table: &str) -> Result<ChunkId> {
        let id = loop {
            let id = Uuid::new_v4().to_string();
            if !self.fill.contains_key(&id) && self.meta.table_of_chunk(&id).is_none() {
                break id;
            }
        };

        self.meta.table_mut(table)?.chunks.push(id.clone());
        self.loaded.insert(id.clone(), Chunk::new());
        self.fill.insert(id.clone(), 0);
        self.writes.created.insert(id.clone());
        self.writes.dirty.insert(id.clone());

        info!(target: "crumb::ops", tenant = self.tenant, table, chunk = %id, "Allocated chunk");
        Ok(id)
    }

    /// Store a new document in `table` under `key`
    pub fn place(&mut self, table: &str, key: &str, document: Document) -> Result<ChunkId> {
        let chunk = self.chunk_with_room(table)?;
        self.chunk_mut(&chunk)?.insert(key.to_string(), document);
        self.meta.key_index.insert(key.to_string(), chunk.clone());
        *self.fill.entry(chunk.clone()).or_default() += 1;
        Ok(chunk)
    }

    /// Overwrite the stored document under an existing `key`
    pub fn overwrite(&mut self, key: &str, document: Document) -> Result<()> {
        let chunk = self
            .meta
            .key_index
            .get(key)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound {
                key: key.to_string(),
            })?;
        self.chunk_mut(&chunk)?.insert(key.to_string(), document);
        Ok(())
    }

    /// Remove the document under `key` from `table`.
    ///
    /// The chunk is reclaimed once it holds no documents. Returns the
    /// removed document, or `None` when the chunk did not contain it.
    pub fn take(&mut self, table: &str, key: &str) -> Result<Option<Document>> {
        let chunk = self.meta.locate(table, key)?.clone();
        let removed = self.chunk_mut(&chunk)?.remove(key);
        if removed.is_none() {
            warn!(target: "crumb::ops", tenant = self.tenant, key, chunk = %chunk,
                "key_index points at a chunk without the document");
        }

        self.meta.key_index.remove(key);
        let fill = self.fill.entry(chunk.clone()).or_default();
        *fill = fill.saturating_sub(1);

        self.release_if_empty(table, &chunk)?;
        Ok(removed)
    }

    /// Reclaim `chunk` if nothing in `key_index` points at it
    pub fn release_if_empty(&mut self, table: &str, chunk: &str) -> Result<bool> {
        if self.chunk_fill(chunk) > 0 {
            return Ok(false);
        }
        self.meta.table_mut(table)?.chunks.retain(|c| c != chunk);
        self.forget_chunk(chunk);
        info!(target: "crumb::ops", tenant = self.tenant, table, chunk, "Reclaimed empty chunk");
        Ok(true)
    }

    /// Remove every chunk of `table` along with its `key_index` entries.
    ///
    /// Chunks are not read: keys are found through `key_index`.
    pub fn discard_chunks(&mut self, table: &str) -> Result<usize> {
        let chunks: HashSet<ChunkId> = self.meta.table(table)?.chunks.iter().cloned().collect();
        self.meta.key_index.retain(|_, chunk| !chunks.contains(chunk));
        self.meta.table_mut(table)?.chunks.clear();
        for chunk in &chunks {
            self.forget_chunk(chunk);
        }
        Ok(chunks.len())
    }

    fn forget_chunk(&mut self, chunk: &str) {
        self.loaded.remove(chunk);
        self.fill.remove(chunk);
        self.writes.dirty.remove(chunk);
        // A chunk created in this session was never written.
        if !self.writes.created.remove(chunk) {
            self.writes.removed.insert(chunk.to_string());
        }
    }

    /// Apply the write set, then persist Meta.
    pub fn commit(self) -> Result<()> {
        let Session {
            tenant,
            store,
            meta,
            loaded,
            writes,
            ..
        } = self;

        for id in &writes.dirty {
            if let Some(chunk) = loaded.get(id) {
                store.write_chunk(tenant, id, chunk)?;
            }
        }

        store.write_meta(tenant, &meta)?;

        for id in &writes.removed {
            match store.delete_chunk(tenant, id) {
                Ok(()) => {}
                Err(Error::ChunkNotFound { .. }) => {
                    warn!(target: "crumb::store", tenant, chunk = %id, "Chunk already absent");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            target: "crumb::store",
            tenant,
            written = writes.dirty.len(),
            deleted = writes.removed.len(),
            "Committed session"
        );
        Ok(())
    }
}

impl DocumentSource for Session<'_> {
    fn contains_key(&self, key: &str) -> bool {
        self.meta.contains_key(key)
    }

    fn document(&mut self, key: &str) -> Result<Option<Document>> {
        let Some(chunk) = self.meta.key_index.get(key).cloned() else {
            return Ok(None);
        };
        let document = self.chunk(&chunk)?.get(key).cloned();
        if document.is_none() {
            warn!(target: "crumb::ops", tenant = self.tenant, key, chunk = %chunk,
                "key_index points at a chunk without the document");
        }
        Ok(document)
    }
}
