use std::collections::BTreeMap;

use foundation::{LatLng, PhotoId};

use crate::record::PhotoRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    NotFound(PhotoId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NotFound(id) => write!(f, "no photo with id {id} in registry"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// What `upsert` did, so callers can skip re-rendering on `Unchanged`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Authoritative client-side cache of photo metadata, keyed by id.
///
/// Entries are kept in a `BTreeMap` for stable traversal order. The registry
/// exclusively owns record state; collaborators hold ids, not references.
#[derive(Debug, Default)]
pub struct PhotoRegistry {
    entries: BTreeMap<PhotoId, PhotoRecord>,
}

impl PhotoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: PhotoId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Merges `record` into an existing entry or inserts a new one.
    ///
    /// Merging preserves previously fetched fields the incoming partial
    /// record does not carry (see `PhotoRecord::merge_from`).
    pub fn upsert(&mut self, record: PhotoRecord) -> UpsertOutcome {
        match self.entries.get_mut(&record.id) {
            Some(existing) => {
                if existing.merge_from(&record) {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Unchanged
                }
            }
            None => {
                self.entries.insert(record.id, record);
                UpsertOutcome::Inserted
            }
        }
    }

    pub fn get(&self, id: PhotoId) -> Result<&PhotoRecord, RegistryError> {
        self.entries.get(&id).ok_or(RegistryError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: PhotoId) -> Result<&mut PhotoRecord, RegistryError> {
        self.entries.get_mut(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Drops an entry that is no longer part of the current filter result.
    pub fn remove(&mut self, id: PhotoId) -> Result<PhotoRecord, RegistryError> {
        self.entries.remove(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Replaces all entries wholesale (filter refresh path).
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = PhotoRecord>) {
        self.entries.clear();
        for record in records {
            self.upsert(record);
        }
    }

    pub fn set_coords(
        &mut self,
        id: PhotoId,
        coords: Option<LatLng>,
    ) -> Result<(), RegistryError> {
        self.get_mut(id)?.coords = coords;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhotoRecord> {
        self.entries.values()
    }

    /// Records with coordinates, rendered as markers.
    pub fn placed(&self) -> impl Iterator<Item = &PhotoRecord> {
        self.entries.values().filter(|r| r.is_placed())
    }

    /// Records without coordinates, offered in the side list for dragging.
    pub fn unplaced(&self) -> impl Iterator<Item = &PhotoRecord> {
        self.entries.values().filter(|r| !r.is_placed())
    }
}
