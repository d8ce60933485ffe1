//! Database struct and open/close logic
//!
//! This module provides the main Database struct that orchestrates:
//! - Store initialization (file-backed or in-memory)
//! - Configuration via `crumb.toml`
//! - Per-tenant locking
//!
//! ## Sessions
//!
//! Every operation runs inside a [`Session`] opened under the tenant's lock:
//!
//! 1. `db.transaction(tenant, |session| { ... })` commits the staged
//!    writes when the closure returns `Ok`, and discards them otherwise.
//! 2. `db.read(tenant, |session| { ... })` never commits.
//!
//! The lock is held for the whole closure, so two operations on the same
//! tenant never interleave their read-modify-write of Meta.

pub mod config;
mod registry;

pub use config::{CrumbConfig, CONFIG_FILE_NAME};
pub use registry::OPEN_DATABASES;

use crate::session::Session;
use crumb_core::Result;
use crumb_storage::{get_codec, FileStore, MemoryStore, Store};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Persistence Mode
// ============================================================================

/// Where tenant records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum PersistenceMode {
    /// In memory only; lost on drop, not registered
    Ephemeral,
    /// Files under the data directory
    #[default]
    Disk,
}

// ============================================================================
// Database Struct
// ============================================================================

/// Main database handle
///
/// Create one with [`Database::open`] or [`Database::cache`] and share it
/// through the returned `Arc`.
///
/// # Example
///
/// ```text
/// use crumb_engine::Database;
///
/// let db = Database::open("/path/to/data")?;
/// db.ensure_tenant("alice")?;
/// let created = db.transaction("alice", |session| {
///     Ok(session.meta().table_index.len())
/// })?;
/// ```
pub struct Database {
    /// Data directory path (empty for ephemeral databases)
    data_dir: PathBuf,

    /// Tenant record store
    store: Box<dyn Store>,

    /// Persistence mode (ephemeral vs disk-backed)
    persistence_mode: PersistenceMode,

    /// Configuration (mirrors crumb.toml)
    config: CrumbConfig,

    /// One lock per tenant, created on first use
    tenants: DashMap<String, Arc<Mutex<()>>>,
}

impl Database {
    /// Open database at the given path.
    ///
    /// Reads `crumb.toml` from the data directory, creating it with defaults
    /// when absent.
    ///
    /// # Thread Safety
    ///
    /// Opening the same path from multiple threads returns the same
    /// `Arc<Database>`, so every caller shares the same tenant locks.
    ///
    /// ```text
    /// let db1 = Database::open("/data")?;
    /// let db2 = Database::open("/data")?;  // Same Arc as db1
    /// assert!(Arc::ptr_eq(&db1, &db2));
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        CrumbConfig::write_default_if_missing(&config_path)?;
        let cfg = CrumbConfig::from_file(&config_path)?;

        Self::open_registered(data_dir, cfg)
    }

    /// Open database at the given path with an explicit configuration.
    ///
    /// The supplied config is written to `crumb.toml` so that subsequent
    /// `Database::open()` calls pick up the same settings.
    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: CrumbConfig) -> Result<Arc<Self>> {
        cfg.validate()?;
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        cfg.write_to_file(&data_dir.join(CONFIG_FILE_NAME))?;
        Self::open_registered(data_dir, cfg)
    }

    fn open_registered(data_dir: PathBuf, cfg: CrumbConfig) -> Result<Arc<Self>> {
        // Canonicalize path for consistent registry keys
        let canonical_path = data_dir.canonicalize()?;

        // Hold the registry lock for the whole open so two threads never
        // build separate instances for one path.
        let mut registry = OPEN_DATABASES.lock();

        if let Some(weak) = registry.get(&canonical_path) {
            if let Some(db) = weak.upgrade() {
                info!(target: "crumb::db", path = ?canonical_path, "Returning existing database instance");
                return Ok(db);
            }
        }

        let store = FileStore::new(&canonical_path, cfg.record_format()?, get_codec(&cfg.codec)?);

        info!(
            target: "crumb::db",
            path = ?canonical_path,
            format = %cfg.format,
            codec = %cfg.codec,
            max_documents_per_chunk = cfg.max_documents_per_chunk,
            "Opened database"
        );

        let db = Arc::new(Self {
            data_dir: canonical_path.clone(),
            store: Box::new(store),
            persistence_mode: PersistenceMode::Disk,
            config: cfg,
            tenants: DashMap::new(),
        });

        registry.insert(canonical_path, Arc::downgrade(&db));
        Ok(db)
    }

    /// Create a cache database with no disk I/O
    ///
    /// Every call creates a new instance; nothing is registered and all
    /// data is lost when the last handle is dropped.
    pub fn cache() -> Result<Arc<Self>> {
        Self::cache_with_config(CrumbConfig::default())
    }

    /// Create a cache database with an explicit configuration
    pub fn cache_with_config(cfg: CrumbConfig) -> Result<Arc<Self>> {
        cfg.validate()?;
        Ok(Arc::new(Self {
            data_dir: PathBuf::new(),
            store: Box::new(MemoryStore::new()),
            persistence_mode: PersistenceMode::Ephemeral,
            config: cfg,
            tenants: DashMap::new(),
        }))
    }

    /// Check if this is a cache (ephemeral) database
    pub fn is_cache(&self) -> bool {
        self.persistence_mode == PersistenceMode::Ephemeral
    }

    /// Data directory (empty for cache databases)
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Active configuration
    pub fn config(&self) -> &CrumbConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    fn tenant_lock(&self, tenant: &str) -> Arc<Mutex<()>> {
        self.tenants
            .entry(tenant.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // ========== Tenants ==========

    /// Create the tenant's directory and empty Meta if absent.
    ///
    /// Returns `true` when the tenant was created by this call.
    pub fn ensure_tenant(&self, tenant: &str) -> Result<bool> {
        let lock = self.tenant_lock(tenant);
        let _guard = lock.lock();
        let created = self.store.ensure_tenant(tenant)?;
        if created {
            info!(target: "crumb::db", tenant, "Created tenant");
        }
        Ok(created)
    }

    /// Remove a tenant and everything it stores
    pub fn delete_tenant(&self, tenant: &str) -> Result<()> {
        let lock = self.tenant_lock(tenant);
        let _guard = lock.lock();
        self.store.delete_tenant(tenant)?;
        info!(target: "crumb::db", tenant, "Deleted tenant");
        Ok(())
    }

    // ========== Sessions ==========

    /// Run `f` in a session and commit its writes if it succeeds
    pub fn transaction<F, T>(&self, tenant: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session<'_>) -> Result<T>,
    {
        let lock = self.tenant_lock(tenant);
        let _guard = lock.lock();

        let mut session = Session::open(
            self.store.as_ref(),
            tenant,
            self.config.max_documents_per_chunk,
        )?;
        let value = f(&mut session)?;
        session.commit()?;
        Ok(value)
    }

    /// Run `f` in a session that is never committed
    pub fn read<F, T>(&self, tenant: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session<'_>) -> Result<T>,
    {
        let lock = self.tenant_lock(tenant);
        let _guard = lock.lock();

        let mut session = Session::open(
            self.store.as_ref(),
            tenant,
            self.config.max_documents_per_chunk,
        )?;
        f(&mut session)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.persistence_mode == PersistenceMode::Disk && !self.data_dir.as_os_str().is_empty() {
            let mut registry = OPEN_DATABASES.lock();
            registry.remove(&self.data_dir);
        }
    }
}
