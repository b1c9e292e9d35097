//! Virtual hosts and their in-memory filesystems.
//!
//! A host is the per-player machine stand-in: one allocated address paired
//! with one key/value file store. Hosts live exactly as long as the session
//! bound to them; nothing is persisted across connections.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Lookup failures on a host filesystem. Reportable outcomes, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("File '{0}' not found.")]
    NotFound(String),
}

/// In-memory file store keyed by filename.
#[derive(Debug, Default)]
pub struct VirtualFilesystem {
    files: BTreeMap<String, String>,
}

impl VirtualFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional upsert; creating and overwriting are the same operation.
    pub fn create_or_update(&mut self, name: &str, content: &str) {
        self.files.insert(name.to_string(), content.to_string());
    }

    /// Removes a file if present.
    pub fn delete(&mut self, name: &str) -> Result<(), FsError> {
        match self.files.remove(name) {
            Some(_) => Ok(()),
            None => Err(FsError::NotFound(name.to_string())),
        }
    }

    /// All files as `(name, content)` pairs, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

/// One allocated address and the filesystem it owns.
#[derive(Debug)]
pub struct Host {
    addr: Ipv4Addr,
    filesystem: VirtualFilesystem,
}

impl Host {
    /// Creates a host with an empty filesystem at the given address.
    pub fn new(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            filesystem: VirtualFilesystem::new(),
        }
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn filesystem(&self) -> &VirtualFilesystem {
        &self.filesystem
    }

    pub fn filesystem_mut(&mut self) -> &mut VirtualFilesystem {
        &mut self.filesystem
    }
}
