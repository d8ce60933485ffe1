//! Global database registry for singleton management
//!
//! Ensures only one Database instance exists per filesystem path, so every
//! handle shares the same per-tenant locks. Weak references let an instance
//! go away once all handles are dropped.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Weak;

use super::Database;

/// Global registry of open databases (path -> weak reference)
pub static OPEN_DATABASES: Lazy<Mutex<HashMap<PathBuf, Weak<Database>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
