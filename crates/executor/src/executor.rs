//! The Executor - single entry point to crumb's engine.
//!
//! The Executor is a stateless dispatcher that routes commands to the
//! engine facades and converts results to outputs.

use std::sync::Arc;

use crumb_engine::Database;
use tracing::debug;

use crate::bridge::Primitives;
use crate::convert::convert_result;
use crate::handlers::{document, table};
use crate::{Command, Output, Result};

/// The command executor - single entry point to crumb's engine.
///
/// The Executor holds the engine facades but maintains no state of its
/// own. All state lives in the database.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```text
/// use crumb_executor::{Command, Executor};
///
/// let executor = Executor::new(Database::open("/data")?);
/// let output = executor.execute("alice", Command::Create {
///     table: "dogs".into(),
///     schema: None,
/// })?;
/// ```
pub struct Executor {
    primitives: Arc<Primitives>,
}

impl Executor {
    /// Create a new executor over a database.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            primitives: Arc::new(Primitives::new(db)),
        }
    }

    /// Execute a single command for `tenant`.
    ///
    /// The tenant is created on first use.
    pub fn execute(&self, tenant: &str, cmd: Command) -> Result<Output> {
        convert_result(self.primitives.db.ensure_tenant(tenant))?;
        debug!(target: "crumb::ops", tenant, op = cmd.name(), "Execute");

        let p = &self.primitives;
        match cmd {
            // Table commands
            Command::Create { table, schema } => table::create(p, tenant, table, schema),
            Command::Drop { table } => table::drop(p, tenant, table),
            Command::Edit { table, edit } => table::edit(p, tenant, table, edit),
            Command::Meta { table } => table::meta(p, tenant, table),

            // Document commands
            Command::Insert { table, document } => document::insert(p, tenant, table, document),
            Command::BulkInsert { table, documents } => {
                document::bulk_insert(p, tenant, table, documents)
            }
            Command::Get {
                table,
                key,
                expand_keys,
            } => document::get(p, tenant, table, key, expand_keys),
            Command::Update {
                table,
                key,
                document,
            } => document::update(p, tenant, table, key, document),
            Command::Delete { table, key } => document::delete(p, tenant, table, key),
            Command::DeleteWhere { table, filter } => {
                document::delete_where(p, tenant, table, filter)
            }
            Command::Select { table, options } => document::select(p, tenant, table, options),
        }
    }

    /// Execute several commands in order, stopping at nothing.
    ///
    /// `results[i]` corresponds to `cmds[i]`.
    pub fn execute_many(&self, tenant: &str, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(tenant, cmd)).collect()
    }

    /// The underlying database.
    pub fn database(&self) -> &Arc<Database> {
        &self.primitives.db
    }
}
