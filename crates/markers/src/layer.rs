use std::collections::BTreeMap;

use foundation::{LatLng, LatLngBounds, PhotoId, Viewport};
use registry::{thumbnail_url, PhotoRegistry, ThumbSize};

use crate::backend::MapBackend;
use crate::cluster::{cluster_markers, ClusterConfig, ClusterNode};

/// A photo's visual handle: last committed position plus icon.
///
/// Exclusively owned by the layer; destroyed on filter rebuild or when the
/// photo leaves the placed set.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEntry {
    pub position: LatLng,
    pub icon_url: String,
}

/// Owns one marker per placed registry record.
///
/// Entries are keyed by photo id in a `BTreeMap` for stable traversal order,
/// and every backend handler closes over the id, never an iteration index.
#[derive(Debug, Default)]
pub struct MarkerLayer {
    entries: BTreeMap<PhotoId, MarkerEntry>,
}

impl MarkerLayer {
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

    /// Last committed position of a marker, if one exists.
    pub fn position(&self, id: PhotoId) -> Option<LatLng> {
        self.entries.get(&id).map(|e| e.position)
    }

    pub fn positions(&self) -> Vec<(PhotoId, LatLng)> {
        self.entries
            .iter()
            .map(|(id, e)| (*id, e.position))
            .collect()
    }

    /// Destroys all markers and recreates one per placed registry record
    /// (filter refresh path).
    pub fn rebuild(&mut self, registry: &PhotoRegistry, backend: &mut dyn MapBackend) {
        let old: Vec<PhotoId> = self.entries.keys().copied().collect();
        for id in old {
            backend.remove_marker(id);
        }
        self.entries.clear();

        for record in registry.placed() {
            let Some(at) = record.coords else { continue };
            let icon_url = thumbnail_url(&record.ihash, ThumbSize::Small);
            backend.add_marker(record.id, at, &icon_url);
            self.entries.insert(
                record.id,
                MarkerEntry {
                    position: at,
                    icon_url,
                },
            );
        }
    }

    /// Adds or moves a single marker after a committed geotag.
    pub fn place(&mut self, id: PhotoId, at: LatLng, ihash: &str, backend: &mut dyn MapBackend) {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.position = at;
                backend.move_marker(id, at);
            }
            None => {
                let icon_url = thumbnail_url(ihash, ThumbSize::Small);
                backend.add_marker(id, at, &icon_url);
                self.entries.insert(
                    id,
                    MarkerEntry {
                        position: at,
                        icon_url,
                    },
                );
            }
        }
    }

    /// Snaps a marker back to its last committed position (rollback path).
    ///
    /// Returns the position it snapped to, or `None` if the photo never had
    /// a marker (an unplaced item simply stays unplaced).
    pub fn snap_back(&self, id: PhotoId, backend: &mut dyn MapBackend) -> Option<LatLng> {
        let position = self.entries.get(&id)?.position;
        backend.move_marker(id, position);
        Some(position)
    }

    /// Bounds over all marker positions, for the initial view fit.
    pub fn bounds(&self) -> LatLngBounds {
        let mut bounds = LatLngBounds::empty();
        for entry in self.entries.values() {
            bounds.extend(entry.position);
        }
        bounds
    }

    /// Recomputes clusters for the current viewport and hands them to the
    /// backend. Markers themselves are not recreated.
    pub fn recluster(
        &self,
        viewport: &Viewport,
        config: &ClusterConfig,
        backend: &mut dyn MapBackend,
    ) -> Vec<ClusterNode> {
        let clusters = cluster_markers(&self.positions(), viewport, config);
        backend.render_clusters(&clusters);
        clusters
    }
}
