//! Entity ID mappings
//!
//! Maps external user/item identifiers to dense internal indices. Mapping
//! files hold one `internal<TAB>external` pair per line.

use crate::error::{DriverError, Result};
use std::{collections::HashMap, fmt::Write as _, fs, path::Path};
use tracing::{debug, info, instrument};

/// Bidirectional association between external IDs and internal indices
pub trait IdMapping: std::fmt::Debug + Send {
    /// Internal index for `external`, assigning the next free one if absent
    fn to_internal(&mut self, external: &str) -> Result<usize>;

    /// Internal index for `external`, if known
    fn lookup(&self, external: &str) -> Option<usize>;

    /// External ID for `internal`, if known
    fn to_external(&self, internal: usize) -> Option<String>;

    /// Number of known entities
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the mapping to `path`
    fn save(&self, path: &Path) -> Result<()>;
}

/// Dense mapping; indices are assigned in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMapping {
    internal: HashMap<String, usize>,
    external: Vec<String>,
}

impl EntityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mapping written by [`IdMapping::save`]
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| DriverError::file_system("read", path.to_path_buf(), e))?;

        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (index, external) = line
                .split_once('\t')
                .and_then(|(index, external)| Some((index.trim().parse::<usize>().ok()?, external)))
                .ok_or_else(|| {
                    DriverError::mapping(
                        format!("malformed mapping entry on line {}: '{}'", number + 1, line),
                        Some(path.to_path_buf()),
                    )
                })?;
            entries.push((index, external.trim_end_matches('\r').to_string()));
        }

        entries.sort_by_key(|(index, _)| *index);
        let mut mapping = Self::new();
        for (expected, (index, external)) in entries.into_iter().enumerate() {
            if index != expected || mapping.internal.contains_key(&external) {
                return Err(DriverError::mapping(
                    format!("mapping is not dense and injective at index {index} ('{external}')"),
                    Some(path.to_path_buf()),
                ));
            }
            mapping.internal.insert(external.clone(), index);
            mapping.external.push(external);
        }

        info!("Loaded {} ID mappings from {}", mapping.len(), path.display());
        Ok(mapping)
    }
}

impl IdMapping for EntityMapping {
    fn to_internal(&mut self, external: &str) -> Result<usize> {
        if let Some(&index) = self.internal.get(external) {
            return Ok(index);
        }
        let index = self.external.len();
        self.internal.insert(external.to_string(), index);
        self.external.push(external.to_string());
        Ok(index)
    }

    fn lookup(&self, external: &str) -> Option<usize> {
        self.internal.get(external).copied()
    }

    fn to_external(&self, internal: usize) -> Option<String> {
        self.external.get(internal).cloned()
    }

    fn len(&self) -> usize {
        self.external.len()
    }

    #[instrument(skip(self))]
    fn save(&self, path: &Path) -> Result<()> {
        let mut content = String::new();
        for (index, external) in self.external.iter().enumerate() {
            // Writing to a String cannot fail
            let _ = writeln!(content, "{index}\t{external}");
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| DriverError::file_system("create directory", parent.to_path_buf(), e))?;
        }
        fs::write(path, content)
            .map_err(|e| DriverError::file_system("write", path.to_path_buf(), e))?;

        debug!("Saved {} ID mappings to {}", self.len(), path.display());
        Ok(())
    }
}

/// Numeric IDs used as-is (`--no-id-mapping`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityMapping {
    max_seen: Option<usize>,
}

impl IdentityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse(external: &str) -> Option<usize> {
        external.trim().parse::<usize>().ok()
    }
}

impl IdMapping for IdentityMapping {
    fn to_internal(&mut self, external: &str) -> Result<usize> {
        let index = Self::parse(external).ok_or_else(|| {
            DriverError::mapping(
                format!("'{external}' is not a numeric ID (required by --no-id-mapping)"),
                None,
            )
        })?;
        // len() is max + 1
        if index == usize::MAX {
            return Err(DriverError::mapping(
                format!("numeric ID {external} is out of range"),
                None,
            ));
        }
        self.max_seen = Some(self.max_seen.map_or(index, |max| max.max(index)));
        Ok(index)
    }

    fn lookup(&self, external: &str) -> Option<usize> {
        Self::parse(external).filter(|&index| self.max_seen.is_some_and(|max| index <= max))
    }

    fn to_external(&self, internal: usize) -> Option<String> {
        self.max_seen
            .filter(|&max| internal <= max)
            .map(|_| internal.to_string())
    }

    fn len(&self) -> usize {
        self.max_seen.map_or(0, |max| max + 1)
    }

    fn save(&self, path: &Path) -> Result<()> {
        Err(DriverError::mapping(
            "an identity mapping cannot be persisted",
            Some(path.to_path_buf()),
        ))
    }
}
