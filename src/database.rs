use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// A source file fed to the rewrite pipeline.
#[salsa::input(debug)]
pub struct SourceFile {
    #[returns(ref)]
    pub path: PathBuf,
    #[returns(deref)]
    pub text: String,
}

impl SourceFile {
    /// Create a source file from in-memory text (tests, stdin).
    pub fn from_text(
        db: &dyn salsa::Database,
        path: impl AsRef<Path>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(db, path.as_ref().to_path_buf(), text.into())
    }
}

#[salsa::db]
pub trait Db: salsa::Database {
    /// Load `path` from disk, reusing the input if it was loaded before.
    fn input(&self, path: PathBuf) -> Result<SourceFile, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Default, Clone)]
#[salsa::db]
pub struct OpfuseDatabaseImpl {
    storage: salsa::Storage<Self>,
    /// Loaded source files, keyed by canonical path.
    files: Arc<DashMap<PathBuf, SourceFile>>,
}

#[salsa::db]
impl salsa::Database for OpfuseDatabaseImpl {}

#[salsa::db]
impl Db for OpfuseDatabaseImpl {
    fn input(&self, path: PathBuf) -> Result<SourceFile, Box<dyn std::error::Error + Send + Sync>> {
        let path = path.canonicalize()?;
        match self.files.entry(path) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let contents = std::fs::read_to_string(entry.key())?;
                let source_file = SourceFile::new(self, entry.key().clone(), contents);
                Ok(*entry.insert(source_file))
            }
        }
    }
}
