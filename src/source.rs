//! Repository source providers
//!
//! A source turns some account-level identifier (a GitHub organization, say)
//! into the list of remote addresses it currently owns. Sources are
//! enumerated from inside the task queue, so a slow API only ties up one
//! worker.

use crate::error::Result;

/// A lazily-evaluated, finite list of remote addresses.
pub type Remotes<'a> = Box<dyn Iterator<Item = Result<String>> + Send + 'a>;

/// Something that can list remote repositories to mirror.
pub trait RepositorySource: Send + Sync {
    /// Short identifier used in log messages, e.g. `github:acme`
    fn name(&self) -> String;

    /// Enumerate the remote addresses this source knows about.
    ///
    /// Pagination and filtering happen inside the iterator. An `Err` item
    /// ends the enumeration; addresses yielded before it stay valid.
    fn remotes(&self) -> Result<Remotes<'_>>;
}

/// A fixed list of addresses
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    name: String,
    remotes: Vec<String>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, remotes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            remotes,
        }
    }
}

impl RepositorySource for StaticSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn remotes(&self) -> Result<Remotes<'_>> {
        Ok(Box::new(self.remotes.iter().cloned().map(Ok)))
    }
}
