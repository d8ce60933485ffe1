//! Bridge between the executor and the engine's operation facades.

use std::sync::Arc;

use crumb_engine::{Database, DocumentStore, TableStore};

/// Every engine facade over one database
pub struct Primitives {
    /// The underlying database
    pub db: Arc<Database>,
    /// Table operations
    pub tables: TableStore,
    /// Document operations
    pub documents: DocumentStore,
}

impl Primitives {
    /// Create the facades for a database instance.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            tables: TableStore::new(db.clone()),
            documents: DocumentStore::new(db.clone()),
            db,
        }
    }
}
