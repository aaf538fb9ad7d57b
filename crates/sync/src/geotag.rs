use std::collections::BTreeMap;

use foundation::{LatLng, PhotoId};

use crate::error::SyncError;
use crate::protocol::{GeotagUpdate, StatusResponse};

/// Per-photo lifecycle: `Idle → Dragging → Submitted → {Committed | RolledBack}`.
///
/// Idle is the absence of an operation; the terminal states are reported
/// through `Resolution` rather than stored.
#[derive(Debug, Clone, PartialEq)]
enum OpState {
    Dragging,
    Submitted {
        hash: String,
        target: LatLng,
        /// A drop received while this operation was in flight. At most one;
        /// a later drop replaces an earlier queued one (last wins).
        queued: Option<LatLng>,
    },
}

/// What a drop gesture turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum DropAction {
    /// Send this update now.
    Submit(GeotagUpdate),
    /// An update for this photo is already in flight; the drop was queued
    /// and will be submitted when the current one resolves.
    Queued,
}

/// How a submitted operation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GeotagOutcome {
    /// Server accepted; the target position is now committed.
    Committed(LatLng),
    /// Server rejected or the request failed; visuals must revert to the
    /// last committed state. Never auto-retried.
    RolledBack(SyncError),
}

/// Result of resolving one in-flight operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: GeotagOutcome,
    /// The queued drop, promoted to a new in-flight request.
    pub next: Option<GeotagUpdate>,
}

/// Drag/drop coordinate updates with optimistic reconciliation.
///
/// Operations on distinct photo ids are independent; per id, at most one
/// update is in flight and later drops queue behind it, so no user input is
/// silently lost.
#[derive(Debug, Default)]
pub struct GeotagSync {
    ops: BTreeMap<PhotoId, OpState>,
}

impl GeotagSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an update for this photo awaits its server response.
    pub fn in_flight(&self, id: PhotoId) -> bool {
        matches!(self.ops.get(&id), Some(OpState::Submitted { .. }))
    }

    /// Drag begins on an unplaced thumbnail or an existing marker.
    ///
    /// Allowed while an update is in flight; the eventual drop queues.
    pub fn begin_drag(&mut self, id: PhotoId) {
        self.ops.entry(id).or_insert(OpState::Dragging);
    }

    /// Drag ended without a drop on the map.
    pub fn cancel_drag(&mut self, id: PhotoId) {
        if matches!(self.ops.get(&id), Some(OpState::Dragging)) {
            self.ops.remove(&id);
        }
    }

    /// Drop at a map coordinate: submit now, or queue behind the in-flight
    /// update for the same photo.
    pub fn drop(&mut self, id: PhotoId, hash: &str, target: LatLng) -> DropAction {
        if let Some(OpState::Submitted { queued, .. }) = self.ops.get_mut(&id) {
            *queued = Some(target);
            return DropAction::Queued;
        }

        self.ops.insert(
            id,
            OpState::Submitted {
                hash: hash.to_string(),
                target,
                queued: None,
            },
        );
        DropAction::Submit(GeotagUpdate {
            id: id.0,
            hash: hash.to_string(),
            lat: target.lat,
            lng: target.lng,
        })
    }

    /// Forgets any operation for a photo that left the working set.
    ///
    /// A filter refresh can remove a photo while its update is in flight;
    /// the late confirmation and any queued drop are then meaningless.
    pub fn abandon(&mut self, id: PhotoId) {
        self.ops.remove(&id);
    }

    /// Applies the server response for a submitted operation.
    ///
    /// Returns `None` for a photo with nothing in flight (a stale or
    /// duplicate completion), which is a silent no-op.
    pub fn resolve(
        &mut self,
        id: PhotoId,
        response: Result<StatusResponse, SyncError>,
    ) -> Option<Resolution> {
        let Some(OpState::Submitted {
            hash,
            target,
            queued,
        }) = self.ops.remove(&id)
        else {
            return None;
        };

        let outcome = match response {
            Ok(reply) if reply.is_ok() => GeotagOutcome::Committed(target),
            Ok(reply) => GeotagOutcome::RolledBack(SyncError::Rejected {
                details: reply.details.unwrap_or_default(),
            }),
            Err(error) => GeotagOutcome::RolledBack(error),
        };

        let next = queued.map(|next_target| {
            self.ops.insert(
                id,
                OpState::Submitted {
                    hash: hash.clone(),
                    target: next_target,
                    queued: None,
                },
            );
            GeotagUpdate {
                id: id.0,
                hash,
                lat: next_target.lat,
                lng: next_target.lng,
            }
        });

        Some(Resolution { outcome, next })
    }
}
