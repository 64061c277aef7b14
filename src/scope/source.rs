use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use eyre::{eyre, Context, Result};

/// Somewhere that profile documents can be read from.
pub trait ProfileSource {
    /// Returns the text of the profile for `identity`, or `None` if that identity has no profile.
    fn load(&self, identity: &str) -> Result<Option<String>>;
}

/// Reads `<identity>.json` files from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> DirectorySource {
        DirectorySource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, identity: &str) -> Result<PathBuf> {
        let is_plain_name = !identity.is_empty()
            && !identity.contains(['/', '\\'])
            && identity != "."
            && identity != "..";

        if !is_plain_name {
            return Err(eyre!("'{identity}' is not a valid profile name"));
        }

        Ok(self.root.join(format!("{identity}.json")))
    }
}

impl ProfileSource for DirectorySource {
    fn load(&self, identity: &str) -> Result<Option<String>> {
        let path = self.path_for(identity)?;

        if !path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("reading profile {}", path.display()))?;

        Ok(Some(text))
    }
}

/// Serves profiles from memory, for hosts that embed their character definitions.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> MemorySource {
        MemorySource::default()
    }

    pub fn insert(&mut self, identity: impl Into<String>, document: impl Into<String>) {
        self.documents.insert(identity.into(), document.into());
    }

    pub fn with(mut self, identity: impl Into<String>, document: impl Into<String>) -> Self {
        self.insert(identity, document);
        self
    }
}

impl ProfileSource for MemorySource {
    fn load(&self, identity: &str) -> Result<Option<String>> {
        Ok(self.documents.get(identity).cloned())
    }
}
