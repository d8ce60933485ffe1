//! Tenant integrity check
//!
//! Read-only walk over a tenant's Meta and chunks that reports every broken
//! cross-reference instead of stopping at the first one. Operators run it
//! after a crash; the test suite runs it after every scenario.

use crate::database::Database;
use crumb_core::{ChunkId, DocKey, Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{info, warn};

/// One broken invariant
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// `key_index` names a chunk no table lists
    DanglingKey { key: DocKey, chunk: ChunkId },
    /// `key_index` names a chunk that does not hold the key
    MissingDocument { key: DocKey, chunk: ChunkId },
    /// A chunk holds a document `key_index` does not point at it
    UnindexedDocument { key: DocKey, chunk: ChunkId },
    /// A table lists a chunk the store does not have
    MissingChunk { table: String, chunk: ChunkId },
    /// A listed chunk holds no documents
    EmptyChunk { table: String, chunk: ChunkId },
    /// A listed chunk holds more documents than the configured cap
    OversizedChunk { table: String, chunk: ChunkId, documents: usize },
    /// A chunk is listed more than once
    SharedChunk { chunk: ChunkId, tables: Vec<String> },
    /// The store has a chunk no table lists
    OrphanChunk { chunk: ChunkId },
    /// A uniqueness entry points at an unknown key
    DanglingUniqueEntry { path: String, key: DocKey },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DanglingKey { key, chunk } => {
                write!(f, "key {} points at unlisted chunk {}", key, chunk)
            }
            Violation::MissingDocument { key, chunk } => {
                write!(f, "key {} is not in chunk {}", key, chunk)
            }
            Violation::UnindexedDocument { key, chunk } => {
                write!(f, "chunk {} holds unindexed key {}", chunk, key)
            }
            Violation::MissingChunk { table, chunk } => {
                write!(f, "table {} lists missing chunk {}", table, chunk)
            }
            Violation::EmptyChunk { table, chunk } => {
                write!(f, "table {} lists empty chunk {}", table, chunk)
            }
            Violation::OversizedChunk {
                table,
                chunk,
                documents,
            } => write!(
                f,
                "table {} chunk {} holds {} documents",
                table, chunk, documents
            ),
            Violation::SharedChunk { chunk, tables } => {
                write!(f, "chunk {} listed by {}", chunk, tables.join(", "))
            }
            Violation::OrphanChunk { chunk } => write!(f, "orphan chunk {}", chunk),
            Violation::DanglingUniqueEntry { path, key } => {
                write!(f, "unique entry {} points at unknown key {}", path, key)
            }
        }
    }
}

/// Result of [`verify_integrity`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Every violation found, in discovery order
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    /// True when nothing is broken
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check a tenant's indexes against its chunks
pub fn verify_integrity(db: &Database, tenant: &str) -> Result<IntegrityReport> {
    let cap = db.config().max_documents_per_chunk;

    let report = db.read(tenant, |session| {
        let meta = session.meta().clone();
        let mut violations = Vec::new();

        let mut listed: BTreeMap<ChunkId, Vec<String>> = BTreeMap::new();
        for (table, entry) in &meta.table_index {
            for chunk in &entry.chunks {
                listed.entry(chunk.clone()).or_default().push(table.clone());
            }
        }
        for (chunk, tables) in &listed {
            if tables.len() > 1 {
                violations.push(Violation::SharedChunk {
                    chunk: chunk.clone(),
                    tables: tables.clone(),
                });
            }
        }

        for (chunk, tables) in &listed {
            let table = tables[0].clone();
            let contents = match session.chunk(chunk) {
                Ok(contents) => contents,
                Err(Error::ChunkNotFound { .. }) => {
                    violations.push(Violation::MissingChunk {
                        table,
                        chunk: chunk.clone(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            if contents.is_empty() {
                violations.push(Violation::EmptyChunk {
                    table: table.clone(),
                    chunk: chunk.clone(),
                });
            }
            if contents.len() > cap {
                violations.push(Violation::OversizedChunk {
                    table: table.clone(),
                    chunk: chunk.clone(),
                    documents: contents.len(),
                });
            }
            for key in contents.keys() {
                if meta.key_index.get(key) != Some(chunk) {
                    violations.push(Violation::UnindexedDocument {
                        key: key.clone(),
                        chunk: chunk.clone(),
                    });
                }
            }
        }

        for (key, chunk) in &meta.key_index {
            if !listed.contains_key(chunk) {
                violations.push(Violation::DanglingKey {
                    key: key.clone(),
                    chunk: chunk.clone(),
                });
                continue;
            }
            let present = match session.chunk(chunk) {
                Ok(contents) => contents.contains_key(key),
                // Already reported as MissingChunk
                Err(Error::ChunkNotFound { .. }) => true,
                Err(e) => return Err(e),
            };
            if !present {
                violations.push(Violation::MissingDocument {
                    key: key.clone(),
                    chunk: chunk.clone(),
                });
            }
        }

        let on_disk: BTreeSet<ChunkId> = session.store().list_chunks(tenant)?.into_iter().collect();
        for chunk in on_disk {
            if !listed.contains_key(&chunk) {
                violations.push(Violation::OrphanChunk { chunk });
            }
        }

        for (path, values) in &meta.row_index {
            for key in values.values() {
                if !meta.key_index.contains_key(key) {
                    violations.push(Violation::DanglingUniqueEntry {
                        path: path.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        Ok(IntegrityReport { violations })
    })?;

    if report.is_clean() {
        info!(target: "crumb::db", tenant, "Integrity check passed");
    } else {
        for violation in &report.violations {
            warn!(target: "crumb::db", tenant, %violation, "Integrity violation");
        }
    }
    Ok(report)
}
