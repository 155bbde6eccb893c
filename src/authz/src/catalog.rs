//! Permission catalog: the bitmask vocabulary
//!
//! Maps (resource, bit) to a human-readable permission name and back.
//! Each resource owns an independent 64-bit mask space; bit 0 of one
//! resource is unrelated to bit 0 of another. Loaded once per generation
//! and read-only afterwards.

use crate::error::{AuthzError, Result};
use rolegate_core::{PermissionName, PermissionRecord, ResourceId};
use std::collections::HashMap;

/// Immutable-at-runtime permission vocabulary.
///
/// A resource's mask is a `u64`, so at most 64 permissions can be
/// registered per resource; since every bit must be a distinct power of
/// two, a 65th registration necessarily collides and fails with
/// [`AuthzError::DuplicateBitAssignment`].
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    by_bit: HashMap<ResourceId, HashMap<u64, PermissionName>>,
    by_name: HashMap<ResourceId, HashMap<PermissionName, u64>>,
}

impl PermissionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from permission rows
    pub fn load(records: &[PermissionRecord]) -> Result<Self> {
        let mut catalog = Self::new();
        for record in records {
            catalog.register(&record.resource, record.bit, &record.name)?;
        }
        Ok(catalog)
    }

    /// Register one permission slot
    ///
    /// # Errors
    ///
    /// Fails with `DuplicateBitAssignment` if the bit is not a power of
    /// two, the bit is already taken for this resource, or the name is
    /// already bound to another bit of this resource.
    pub fn register(&mut self, resource: &str, bit: u64, name: &str) -> Result<()> {
        if !bit.is_power_of_two() {
            return Err(AuthzError::DuplicateBitAssignment(format!(
                "bit {:#x} for '{}:{}' is not a power of two",
                bit, resource, name
            )));
        }

        let bits = self.by_bit.entry(resource.to_string()).or_default();
        if let Some(existing) = bits.get(&bit) {
            return Err(AuthzError::DuplicateBitAssignment(format!(
                "bit {:#x} on resource '{}' already names '{}'",
                bit, resource, existing
            )));
        }

        let names = self.by_name.entry(resource.to_string()).or_default();
        if names.contains_key(name) {
            return Err(AuthzError::DuplicateBitAssignment(format!(
                "permission '{}' on resource '{}' is already registered",
                name, resource
            )));
        }

        bits.insert(bit, name.to_string());
        names.insert(name.to_string(), bit);
        Ok(())
    }

    /// Translate a bit value to its permission name
    pub fn lookup(&self, resource: &str, bit: u64) -> Result<&str> {
        self.by_bit
            .get(resource)
            .and_then(|bits| bits.get(&bit))
            .map(String::as_str)
            .ok_or_else(|| AuthzError::UnknownPermission {
                resource: resource.to_string(),
                name: format!("bit {:#x}", bit),
            })
    }

    /// Translate a permission name to its bit value
    pub fn resolve(&self, resource: &str, name: &str) -> Result<u64> {
        self.by_name
            .get(resource)
            .and_then(|names| names.get(name))
            .copied()
            .ok_or_else(|| AuthzError::UnknownPermission {
                resource: resource.to_string(),
                name: name.to_string(),
            })
    }

    /// Names of every registered bit present in `bits`, for diagnostics.
    /// Unregistered bits in the mask are skipped.
    pub fn names(&self, resource: &str, bits: u64) -> Vec<&str> {
        let Some(known) = self.by_bit.get(resource) else {
            return Vec::new();
        };
        let mut names: Vec<(&u64, &str)> = known
            .iter()
            .filter(|(bit, _)| bits & **bit != 0)
            .map(|(bit, name)| (bit, name.as_str()))
            .collect();
        names.sort_by_key(|(bit, _)| **bit);
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// Number of registered permissions across all resources
    pub fn len(&self) -> usize {
        self.by_name.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
