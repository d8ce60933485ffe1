//! Store directory structure
//!
//! A store is a directory containing one subdirectory per tenant:
//!
//! ```text
//! data/
//! ├── crumb.toml             # Configuration (owned by the engine)
//! └── users/
//!     └── <tenant>/
//!         ├── __meta__.ck    # Meta record
//!         ├── <chunk-id>.ck  # Chunk records
//!         └── ...
//! ```

use crumb_core::{Error, Result};
use std::path::{Path, PathBuf};

/// File name of the per-tenant Meta record
pub const META_FILE_NAME: &str = "__meta__.ck";

/// Extension shared by Meta and chunk files
pub const RECORD_EXTENSION: &str = "ck";

/// Directory holding all tenants
pub const TENANTS_DIR: &str = "users";

/// Store directory paths
#[derive(Debug, Clone)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    /// Create paths from root directory
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        StorePaths {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the directory holding all tenants
    pub fn tenants_dir(&self) -> PathBuf {
        self.root.join(TENANTS_DIR)
    }

    /// Get a tenant's directory
    pub fn tenant_dir(&self, tenant: &str) -> Result<PathBuf> {
        validate_tenant_name(tenant)?;
        Ok(self.tenants_dir().join(tenant))
    }

    /// Get a tenant's Meta file
    pub fn meta_file(&self, tenant: &str) -> Result<PathBuf> {
        Ok(self.tenant_dir(tenant)?.join(META_FILE_NAME))
    }

    /// Get a chunk file
    pub fn chunk_file(&self, tenant: &str, chunk: &str) -> Result<PathBuf> {
        validate_component(chunk)?;
        Ok(self
            .tenant_dir(tenant)?
            .join(format!("{}.{}", chunk, RECORD_EXTENSION)))
    }
}

/// Reject tenant names that would escape the tenants directory
pub fn validate_tenant_name(tenant: &str) -> Result<()> {
    validate_component(tenant)
}

fn validate_component(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(Error::IllegalName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = StorePaths::from_root("/data");
        assert_eq!(paths.tenants_dir(), PathBuf::from("/data/users"));
        assert_eq!(
            paths.meta_file("alice").unwrap(),
            PathBuf::from("/data/users/alice/__meta__.ck")
        );
        assert_eq!(
            paths.chunk_file("alice", "abc").unwrap(),
            PathBuf::from("/data/users/alice/abc.ck")
        );
    }

    #[test]
    fn test_rejects_traversal() {
        let paths = StorePaths::from_root("/data");
        for bad in ["", ".", "..", "../bob", "a/b", "a\\b"] {
            assert!(
                matches!(paths.tenant_dir(bad), Err(Error::IllegalName { .. })),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(paths.chunk_file("alice", "../x").is_err());
    }
}
