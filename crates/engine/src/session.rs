use foundation::{LatLng, LatLngBounds, PhotoId, Viewport};
use markers::{MapBackend, MapEvent, MarkerLayer, PopupContent};
use registry::{thumbnail_url, PhotoRecord, PhotoRegistry, RegistryError, ThumbSize};
use sync::{
    ApiRequest, DetailLoader, DropAction, FilterController, FilterCriteria, FilterDecision,
    GeotagOutcome, GeotagSync, PhotoDetailResponse, PhotoPayload, StatusResponse, SyncError,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::notify::{Notification, NotificationQueue, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A lookup missed for an id the caller claimed exists. This is an
    /// invariant violation, not a normal runtime condition.
    Registry(RegistryError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Registry(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<RegistryError> for SessionError {
    fn from(e: RegistryError) -> Self {
        SessionError::Registry(e)
    }
}

/// Side-list entry for an unplaced photo, ready for the host to render as a
/// draggable thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnplacedItem {
    pub id: PhotoId,
    pub ihash: String,
    pub thumbnail_url: String,
}

/// One session of the map/geotag engine.
///
/// Owns all mutable state — registry, marker layer, per-photo geotag
/// operations, filter sequencing, popup tracking — so there are no hidden
/// globals; hosts construct one and thread it through their event handlers.
///
/// All methods run to completion between events. Methods that change
/// visuals take the widget as `&mut dyn MapBackend`; methods that need the
/// network return `ApiRequest` descriptors for the host to perform. Registry
/// mutations are always applied before the backend commands derived from
/// them, so no consumer observes a partially merged record.
#[derive(Debug)]
pub struct Session {
    config: EngineConfig,
    viewport: Viewport,
    registry: PhotoRegistry,
    layer: MarkerLayer,
    geotag: GeotagSync,
    filter: FilterController,
    detail: DetailLoader,
    notifications: NotificationQueue,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        let view = config.view;
        Self {
            config,
            viewport: Viewport::new(
                LatLng::new(view.lat, view.lng),
                view.zoom,
                view.width,
                view.height,
            ),
            registry: PhotoRegistry::new(),
            layer: MarkerLayer::new(),
            geotag: GeotagSync::new(),
            filter: FilterController::new(),
            detail: DetailLoader::new(),
            notifications: NotificationQueue::new(),
        }
    }

    pub fn registry(&self) -> &PhotoRegistry {
        &self.registry
    }

    pub fn layer(&self) -> &MarkerLayer {
        &self.layer
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Unplaced photos for the side list, in registry order.
    pub fn unplaced_items(&self) -> Vec<UnplacedItem> {
        self.registry
            .unplaced()
            .map(|record| UnplacedItem {
                id: record.id,
                ihash: record.ihash.clone(),
                thumbnail_url: thumbnail_url(&record.ihash, ThumbSize::Small),
            })
            .collect()
    }

    /// Drains notifications accumulated since the last poll.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    /// First request of a session: the full coordinate-bearing photo list.
    pub fn initialize(&mut self) -> ApiRequest {
        info!("session starting, requesting initial photo population");
        ApiRequest::MapPhotos
    }

    /// Issues a list query for the geotag side list; supersedes prior ones.
    pub fn submit_filter(&mut self, criteria: FilterCriteria) -> ApiRequest {
        let request = self.filter.submit(criteria);
        debug!(seq = self.filter.latest_seq(), "filter submitted");
        request
    }

    /// Routes one widget event; returns requests for the host to perform.
    pub fn handle_event(
        &mut self,
        event: MapEvent,
        backend: &mut dyn MapBackend,
    ) -> Result<Vec<ApiRequest>, SessionError> {
        match event {
            MapEvent::MarkerClicked(id) => {
                // Look the record up before touching the loader, so a click
                // the widget got wrong leaves no pending fetch behind.
                let record = self.registry.get(id)?;
                let request = self.detail.activate(id);
                // Render whatever is cached right away; never a blank popup.
                backend.open_popup(&popup_content(record, self.detail.is_pending(id), None));
                Ok(request.into_iter().collect())
            }
            MapEvent::ClusterClicked(members) => {
                let mut bounds = LatLngBounds::empty();
                for id in &members {
                    if let Some(at) = self.layer.position(*id) {
                        bounds.extend(at);
                    }
                }
                if !bounds.is_empty() {
                    backend.fit_bounds(bounds);
                }
                Ok(Vec::new())
            }
            MapEvent::DragStarted(id) => {
                self.geotag.begin_drag(id);
                Ok(Vec::new())
            }
            MapEvent::DragCancelled(id) => {
                self.geotag.cancel_drag(id);
                Ok(Vec::new())
            }
            MapEvent::Dropped { id, at } => {
                let hash = self.registry.get(id)?.ihash.clone();
                let target = self.viewport.unproject(at);
                match self.geotag.drop(id, &hash, target) {
                    DropAction::Submit(update) => {
                        debug!(%id, lat = target.lat, lng = target.lng, "geotag submitted");
                        Ok(vec![ApiRequest::UpdateLocation(update)])
                    }
                    DropAction::Queued => {
                        debug!(%id, "geotag queued behind in-flight update");
                        Ok(Vec::new())
                    }
                }
            }
            MapEvent::ViewChanged(viewport) => {
                self.viewport = viewport;
                self.layer
                    .recluster(&self.viewport, &self.config.cluster, backend);
                Ok(Vec::new())
            }
            MapEvent::PopupClosed => {
                self.detail.popup_closed();
                Ok(Vec::new())
            }
        }
    }

    /// Completion of the initial `GET /map?op=photos` population.
    pub fn map_photos_loaded(
        &mut self,
        result: Result<Vec<PhotoPayload>, SyncError>,
        backend: &mut dyn MapBackend,
    ) -> Result<(), SessionError> {
        let rows = match result {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, "initial photo population failed");
                self.notifications
                    .push(Severity::Error, format!("could not load photos: {error}"));
                return Ok(());
            }
        };

        for row in rows {
            match row.into_record() {
                Ok(record) => {
                    self.registry.upsert(record);
                }
                Err(error) => self.notifications.push(Severity::Warning, error.to_string()),
            }
        }

        self.layer.rebuild(&self.registry, backend);
        self.layer
            .recluster(&self.viewport, &self.config.cluster, backend);
        let bounds = self.layer.bounds();
        if !bounds.is_empty() {
            backend.fit_bounds(bounds);
        }
        Ok(())
    }

    /// Completion of a filtered list query.
    ///
    /// Out-of-order responses are discarded; the marker set rendered before
    /// the request stays visible until a newer result is applied.
    pub fn photo_list_loaded(
        &mut self,
        seq: u64,
        result: Result<Vec<PhotoPayload>, SyncError>,
        backend: &mut dyn MapBackend,
    ) -> Result<(), SessionError> {
        let rows = match result {
            Ok(rows) => rows,
            Err(error) => {
                self.filter.reject(seq);
                warn!(seq, %error, "photo list request failed");
                self.notifications
                    .push(Severity::Error, format!("could not load photos: {error}"));
                return Ok(());
            }
        };

        match self.filter.accept(seq, rows) {
            FilterDecision::Stale => {
                debug!(seq, "discarding superseded photo list response");
                Ok(())
            }
            FilterDecision::Apply(rows) => {
                let mut records = Vec::with_capacity(rows.len());
                for row in rows {
                    match row.into_record() {
                        Ok(record) => records.push(record),
                        Err(error) => {
                            self.notifications.push(Severity::Warning, error.to_string())
                        }
                    }
                }
                self.registry.replace_all(records);
                self.layer.rebuild(&self.registry, backend);
                self.layer
                    .recluster(&self.viewport, &self.config.cluster, backend);
                Ok(())
            }
        }
    }

    /// Completion of a `update_location` request for one photo.
    ///
    /// Returns the follow-up request for a drop queued while this one was in
    /// flight, if any.
    pub fn geotag_resolved(
        &mut self,
        id: PhotoId,
        result: Result<StatusResponse, SyncError>,
        backend: &mut dyn MapBackend,
    ) -> Result<Option<ApiRequest>, SessionError> {
        let Some(resolution) = self.geotag.resolve(id, result) else {
            // No operation in flight for this id: stale completion.
            return Ok(None);
        };

        // A filter refresh may have removed the photo while the update was
        // in flight; the resolution is then stale, and so is anything queued
        // behind it.
        if !self.registry.contains(id) {
            debug!(%id, "discarding geotag resolution for a removed photo");
            self.geotag.abandon(id);
            return Ok(None);
        }

        match resolution.outcome {
            GeotagOutcome::Committed(at) => {
                self.registry.set_coords(id, Some(at))?;
                let ihash = self.registry.get(id)?.ihash.clone();
                self.layer.place(id, at, &ihash, backend);
                debug!(%id, lat = at.lat, lng = at.lng, "geotag committed");
            }
            GeotagOutcome::RolledBack(error) => {
                // Existing markers snap back to the committed position;
                // unplaced photos simply stay in the side list.
                self.layer.snap_back(id, backend);
                warn!(%id, %error, "geotag rolled back");
                self.notifications.push(
                    Severity::Warning,
                    format!("location update for photo {id} failed: {error}"),
                );
            }
        }

        Ok(resolution.next.map(ApiRequest::UpdateLocation))
    }

    /// Completion of a detail fetch for one photo.
    pub fn detail_loaded(
        &mut self,
        id: PhotoId,
        result: Result<PhotoDetailResponse, SyncError>,
        backend: &mut dyn MapBackend,
    ) -> Result<(), SessionError> {
        let outcome = self.detail.accept(id, result);

        if let Some(photo) = outcome.photo {
            // Merge only while the photo is still in the working set; a
            // response outliving a filter refresh must not resurrect a
            // record the refresh removed.
            if self.registry.contains(id) {
                match photo.into_record() {
                    Ok(record) => {
                        // Merge before any popup patch so the popup reads
                        // the fully merged record.
                        self.registry.upsert(record);
                    }
                    Err(error) => self.notifications.push(Severity::Warning, error.to_string()),
                }
            } else {
                debug!(%id, "discarding detail response for a removed photo");
            }
        }

        if outcome.patch_popup {
            if let Ok(record) = self.registry.get(id) {
                let error_message = outcome.error.as_ref().map(|e| e.to_string());
                backend.set_popup_content(&popup_content(record, false, error_message));
            }
        } else if let Some(error) = outcome.error {
            debug!(%id, %error, "detail fetch failed after popup closed");
        }
        Ok(())
    }
}

/// Builds the popup payload from a registry record.
fn popup_content(record: &PhotoRecord, pending: bool, error: Option<String>) -> PopupContent {
    PopupContent {
        id: record.id,
        title: record.filename.clone(),
        image_url: thumbnail_url(&record.ihash, ThumbSize::Medium),
        rotation_degrees: record.rotation_degrees(),
        camera: record.camera_label(),
        description: record.description.clone(),
        size_bytes: record.size,
        dimensions: record.width.zip(record.height),
        moment: record.moment,
        pending,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::{Session, UnplacedItem};
    use crate::config::EngineConfig;
    use crate::notify::Severity;
    use foundation::{LatLng, PhotoId};
    use markers::{BackendCommand, MapEvent, RecordingBackend};
    use pretty_assertions::assert_eq;
    use sync::{ApiRequest, PhotoDetailResponse, PhotoPayload, StatusResponse, SyncError};

    fn payload(json: &str) -> PhotoPayload {
        serde_json::from_str(json).unwrap()
    }

    fn ok_status() -> StatusResponse {
        StatusResponse {
            status: "ok".to_string(),
            details: Some("photo location updated successfully".to_string()),
        }
    }

    fn error_status() -> StatusResponse {
        StatusResponse {
            status: "error".to_string(),
            details: Some("photo location not updated".to_string()),
        }
    }

    fn seq_of(request: &ApiRequest) -> u64 {
        match request {
            ApiRequest::PhotoList { seq, .. } => *seq,
            other => panic!("unexpected request {other:?}"),
        }
    }

    /// Session with one unplaced photo (id 7, hash "abc123") in the registry.
    fn session_with_unplaced() -> (Session, RecordingBackend) {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        let seq = seq_of(&session.submit_filter(Default::default()));
        session
            .photo_list_loaded(
                seq,
                Ok(vec![payload(
                    r#"{"id": 7, "ihash": "abc123", "filename": "7.jpg", "moment": 1600000000}"#,
                )]),
                &mut backend,
            )
            .unwrap();
        backend.drain();
        (session, backend)
    }

    fn drop_at(session: &mut Session, id: u64, target: LatLng) -> MapEvent {
        MapEvent::Dropped {
            id: PhotoId(id),
            at: session.viewport().project(target),
        }
    }

    #[test]
    fn unplaced_photo_is_offered_for_dragging() {
        let (session, _) = session_with_unplaced();
        assert_eq!(
            session.unplaced_items(),
            vec![UnplacedItem {
                id: PhotoId(7),
                ihash: "abc123".to_string(),
                thumbnail_url: "/media/thumbnails/64px/a/b/abc123".to_string(),
            }]
        );
    }

    #[test]
    fn drop_sends_update_and_commit_places_the_marker() {
        let (mut session, mut backend) = session_with_unplaced();

        let event = drop_at(&mut session, 7, LatLng::new(45.0, 25.0));
        let requests = session.handle_event(event, &mut backend).unwrap();
        assert_eq!(requests.len(), 1);
        let ApiRequest::UpdateLocation(update) = &requests[0] else {
            panic!("expected update request, got {:?}", requests[0]);
        };
        assert_eq!(update.id, 7);
        assert_eq!(update.hash, "abc123");
        assert!((update.lat - 45.0).abs() < 1e-9);
        assert!((update.lng - 25.0).abs() < 1e-9);

        // Nothing moves until the server confirms.
        assert!(backend.commands().is_empty());
        assert_eq!(session.unplaced_items().len(), 1);

        let next = session
            .geotag_resolved(PhotoId(7), Ok(ok_status()), &mut backend)
            .unwrap();
        assert!(next.is_none());
        assert!(session.unplaced_items().is_empty());

        let at = session.layer().position(PhotoId(7)).unwrap();
        assert!((at.lat - 45.0).abs() < 1e-9);
        assert!((at.lng - 25.0).abs() < 1e-9);
        assert!(matches!(
            backend.commands()[0],
            BackendCommand::AddMarker { id: PhotoId(7), .. }
        ));
    }

    #[test]
    fn rejected_update_leaves_the_photo_unplaced() {
        let (mut session, mut backend) = session_with_unplaced();
        let event = drop_at(&mut session, 7, LatLng::new(45.0, 25.0));
        session.handle_event(event, &mut backend).unwrap();

        session
            .geotag_resolved(PhotoId(7), Ok(error_status()), &mut backend)
            .unwrap();

        assert_eq!(session.unplaced_items().len(), 1);
        assert!(session.layer().position(PhotoId(7)).is_none());
        assert!(backend.commands().is_empty());

        let notes = session.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Warning);
    }

    #[test]
    fn network_failure_snaps_a_repositioned_marker_back() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        session
            .map_photos_loaded(
                Ok(vec![payload(
                    r#"{"id": 3, "ihash": "cc33dd", "filename": "3.jpg", "lat": 45.0, "lng": 25.0}"#,
                )]),
                &mut backend,
            )
            .unwrap();
        backend.drain();

        // Reposition attempt fails; the marker returns to (45.0, 25.0).
        session
            .handle_event(MapEvent::DragStarted(PhotoId(3)), &mut backend)
            .unwrap();
        let event = drop_at(&mut session, 3, LatLng::new(46.0, 21.0));
        session.handle_event(event, &mut backend).unwrap();
        session
            .geotag_resolved(
                PhotoId(3),
                Err(SyncError::Network("timeout".to_string())),
                &mut backend,
            )
            .unwrap();

        assert_eq!(
            backend.commands(),
            &[BackendCommand::MoveMarker {
                id: PhotoId(3),
                at: LatLng::new(45.0, 25.0)
            }]
        );
        let record = session.registry().get(PhotoId(3)).unwrap();
        assert_eq!(record.coords, Some(LatLng::new(45.0, 25.0)));
    }

    #[test]
    fn second_drop_queues_and_follows_the_first_resolution() {
        let (mut session, mut backend) = session_with_unplaced();

        let first = drop_at(&mut session, 7, LatLng::new(45.0, 25.0));
        assert_eq!(session.handle_event(first, &mut backend).unwrap().len(), 1);

        let second = drop_at(&mut session, 7, LatLng::new(46.0, 21.0));
        assert!(session.handle_event(second, &mut backend).unwrap().is_empty());

        let next = session
            .geotag_resolved(PhotoId(7), Ok(ok_status()), &mut backend)
            .unwrap()
            .expect("queued drop should become the next request");
        let ApiRequest::UpdateLocation(update) = next else {
            panic!("expected update request");
        };
        assert!((update.lat - 46.0).abs() < 1e-9);
        assert!((update.lng - 21.0).abs() < 1e-9);
    }

    #[test]
    fn geotag_confirmation_after_filter_refresh_is_discarded() {
        let (mut session, mut backend) = session_with_unplaced();
        let event = drop_at(&mut session, 7, LatLng::new(45.0, 25.0));
        session.handle_event(event, &mut backend).unwrap();
        // A second drop queues behind the in-flight update.
        let queued = drop_at(&mut session, 7, LatLng::new(46.0, 21.0));
        session.handle_event(queued, &mut backend).unwrap();

        // The refresh removes the photo before the server answers.
        let seq = seq_of(&session.submit_filter(Default::default()));
        session
            .photo_list_loaded(seq, Ok(vec![]), &mut backend)
            .unwrap();
        backend.drain();

        let next = session
            .geotag_resolved(PhotoId(7), Ok(ok_status()), &mut backend)
            .unwrap();
        assert!(next.is_none());
        assert!(!session.registry().contains(PhotoId(7)));
        assert!(session.layer().position(PhotoId(7)).is_none());
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn cancelled_drag_leaves_no_state_behind() {
        let (mut session, mut backend) = session_with_unplaced();
        session
            .handle_event(MapEvent::DragStarted(PhotoId(7)), &mut backend)
            .unwrap();
        let requests = session
            .handle_event(MapEvent::DragCancelled(PhotoId(7)), &mut backend)
            .unwrap();
        assert!(requests.is_empty());
        assert!(backend.commands().is_empty());

        // The photo is still draggable and a fresh drop submits.
        let event = drop_at(&mut session, 7, LatLng::new(45.0, 25.0));
        assert_eq!(session.handle_event(event, &mut backend).unwrap().len(), 1);
    }

    #[test]
    fn click_on_unknown_marker_fails_without_pending_state() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        assert!(session
            .handle_event(MapEvent::MarkerClicked(PhotoId(9)), &mut backend)
            .is_err());
        assert!(backend.commands().is_empty());

        // Once the photo exists the click still emits a detail fetch, so no
        // pending entry was left behind by the failed one.
        session
            .map_photos_loaded(
                Ok(vec![payload(
                    r#"{"id": 9, "ihash": "ee99", "lat": 45.0, "lng": 25.0}"#,
                )]),
                &mut backend,
            )
            .unwrap();
        backend.drain();
        let requests = session
            .handle_event(MapEvent::MarkerClicked(PhotoId(9)), &mut backend)
            .unwrap();
        assert_eq!(requests, vec![ApiRequest::PhotoDetail { id: PhotoId(9) }]);
    }

    #[test]
    fn out_of_order_filter_responses_apply_only_the_newest() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();

        let seq1 = seq_of(&session.submit_filter(Default::default()));
        let seq2 = seq_of(&session.submit_filter(Default::default()));

        session
            .photo_list_loaded(
                seq2,
                Ok(vec![payload(r#"{"id": 20, "ihash": "bb22"}"#)]),
                &mut backend,
            )
            .unwrap();
        session
            .photo_list_loaded(
                seq1,
                Ok(vec![payload(r#"{"id": 10, "ihash": "aa11"}"#)]),
                &mut backend,
            )
            .unwrap();

        assert!(session.registry().contains(PhotoId(20)));
        assert!(!session.registry().contains(PhotoId(10)));
    }

    #[test]
    fn failed_filter_request_keeps_current_markers() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        session
            .map_photos_loaded(
                Ok(vec![payload(
                    r#"{"id": 1, "ihash": "aa11", "lat": 45.0, "lng": 25.0}"#,
                )]),
                &mut backend,
            )
            .unwrap();
        backend.drain();

        let seq = seq_of(&session.submit_filter(Default::default()));
        session
            .photo_list_loaded(
                seq,
                Err(SyncError::Network("dns failure".to_string())),
                &mut backend,
            )
            .unwrap();

        // No flash-to-empty: markers and registry untouched, error surfaced.
        assert!(session.layer().contains(PhotoId(1)));
        assert!(backend.commands().is_empty());
        assert_eq!(session.take_notifications().len(), 1);
    }

    #[test]
    fn marker_click_opens_degraded_popup_and_fetches_detail() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        session
            .map_photos_loaded(
                Ok(vec![payload(
                    r#"{"id": 3, "ihash": "cc33dd", "filename": "3.jpg", "lat": 45.0, "lng": 25.0}"#,
                )]),
                &mut backend,
            )
            .unwrap();
        backend.drain();

        let requests = session
            .handle_event(MapEvent::MarkerClicked(PhotoId(3)), &mut backend)
            .unwrap();
        assert_eq!(requests, vec![ApiRequest::PhotoDetail { id: PhotoId(3) }]);

        let commands = backend.drain();
        let BackendCommand::OpenPopup(content) = &commands[0] else {
            panic!("expected popup open, got {:?}", commands[0]);
        };
        assert!(content.pending);
        assert_eq!(content.title, "3.jpg");
        assert_eq!(content.image_url, "/media/thumbnails/192px/c/c/cc33dd");

        let detail: PhotoDetailResponse = serde_json::from_str(
            r#"{"status": "ok", "photo": {"id": 3, "ihash": "cc33dd", "filename": "3.jpg",
                "make": "Canon", "model": "EOS 70D", "width": 5472, "height": 3648,
                "lat": 45.0, "lng": 25.0, "orientation": 6}}"#,
        )
        .unwrap();
        session
            .detail_loaded(PhotoId(3), Ok(detail), &mut backend)
            .unwrap();

        let commands = backend.drain();
        let BackendCommand::SetPopupContent(content) = &commands[0] else {
            panic!("expected popup patch, got {:?}", commands[0]);
        };
        assert!(!content.pending);
        assert_eq!(content.camera.as_deref(), Some("Canon EOS 70D"));
        assert_eq!(content.dimensions, Some((5472, 3648)));
        assert_eq!(content.rotation_degrees, 90);
    }

    #[test]
    fn late_detail_response_updates_registry_but_not_the_closed_popup() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        session
            .map_photos_loaded(
                Ok(vec![payload(
                    r#"{"id": 3, "ihash": "cc33dd", "lat": 45.0, "lng": 25.0}"#,
                )]),
                &mut backend,
            )
            .unwrap();
        session
            .handle_event(MapEvent::MarkerClicked(PhotoId(3)), &mut backend)
            .unwrap();
        session
            .handle_event(MapEvent::PopupClosed, &mut backend)
            .unwrap();
        backend.drain();

        let detail: PhotoDetailResponse = serde_json::from_str(
            r#"{"status": "ok", "photo": {"id": 3, "ihash": "cc33dd",
                "description": "ridge above the valley", "lat": 45.0, "lng": 25.0}}"#,
        )
        .unwrap();
        session
            .detail_loaded(PhotoId(3), Ok(detail), &mut backend)
            .unwrap();

        // No reopen, no patch; the merge still lands for future reads.
        assert!(backend.commands().is_empty());
        let record = session.registry().get(PhotoId(3)).unwrap();
        assert_eq!(record.description.as_deref(), Some("ridge above the valley"));
    }

    #[test]
    fn late_detail_does_not_resurrect_a_removed_photo() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        session
            .map_photos_loaded(
                Ok(vec![payload(
                    r#"{"id": 3, "ihash": "cc33dd", "lat": 45.0, "lng": 25.0}"#,
                )]),
                &mut backend,
            )
            .unwrap();
        session
            .handle_event(MapEvent::MarkerClicked(PhotoId(3)), &mut backend)
            .unwrap();
        session
            .handle_event(MapEvent::PopupClosed, &mut backend)
            .unwrap();

        // The refresh drops the photo while the detail fetch is in flight.
        let seq = seq_of(&session.submit_filter(Default::default()));
        session
            .photo_list_loaded(seq, Ok(vec![]), &mut backend)
            .unwrap();
        backend.drain();

        let detail: PhotoDetailResponse = serde_json::from_str(
            r#"{"status": "ok", "photo": {"id": 3, "ihash": "cc33dd", "lat": 45.0, "lng": 25.0}}"#,
        )
        .unwrap();
        session
            .detail_loaded(PhotoId(3), Ok(detail), &mut backend)
            .unwrap();

        assert!(!session.registry().contains(PhotoId(3)));
        assert!(session.unplaced_items().is_empty());
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn detail_failure_patches_an_inline_error() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        session
            .map_photos_loaded(
                Ok(vec![payload(
                    r#"{"id": 3, "ihash": "cc33dd", "filename": "3.jpg", "lat": 45.0, "lng": 25.0}"#,
                )]),
                &mut backend,
            )
            .unwrap();
        session
            .handle_event(MapEvent::MarkerClicked(PhotoId(3)), &mut backend)
            .unwrap();
        backend.drain();

        session
            .detail_loaded(
                PhotoId(3),
                Err(SyncError::Network("connection reset".to_string())),
                &mut backend,
            )
            .unwrap();

        let commands = backend.drain();
        let BackendCommand::SetPopupContent(content) = &commands[0] else {
            panic!("expected popup patch");
        };
        // Degraded view: cached fields stay, error rendered inline.
        assert_eq!(content.title, "3.jpg");
        assert!(content.error.as_deref().unwrap().contains("network failure"));
    }

    #[test]
    fn initial_population_renders_clusters_and_fits_bounds() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        assert_eq!(session.initialize(), ApiRequest::MapPhotos);

        session
            .map_photos_loaded(
                Ok(vec![
                    payload(r#"{"id": 1, "ihash": "aa11", "lat": 45.0, "lng": 25.0}"#),
                    payload(r#"{"id": 2, "ihash": "bb22", "lat": 45.0, "lng": 25.01}"#),
                ]),
                &mut backend,
            )
            .unwrap();

        let commands = backend.drain();
        let cluster_command = commands
            .iter()
            .find_map(|c| match c {
                BackendCommand::RenderClusters { clusters } => Some(clusters),
                _ => None,
            })
            .expect("clusters rendered");
        assert_eq!(cluster_command.len(), 1);
        assert_eq!(cluster_command[0].count(), 2);
        assert!(commands
            .iter()
            .any(|c| matches!(c, BackendCommand::FitBounds(_))));
    }

    #[test]
    fn view_change_reclusters_without_recreating_markers() {
        let mut session = Session::new(EngineConfig::default());
        let mut backend = RecordingBackend::new();
        session
            .map_photos_loaded(
                Ok(vec![
                    payload(r#"{"id": 1, "ihash": "aa11", "lat": 45.0, "lng": 25.0}"#),
                    payload(r#"{"id": 2, "ihash": "bb22", "lat": 45.0, "lng": 25.01}"#),
                ]),
                &mut backend,
            )
            .unwrap();
        backend.drain();

        let mut zoomed = *session.viewport();
        zoomed.zoom = 15.0;
        session
            .handle_event(MapEvent::ViewChanged(zoomed), &mut backend)
            .unwrap();

        let commands = backend.drain();
        assert_eq!(commands.len(), 1);
        let BackendCommand::RenderClusters { clusters } = &commands[0] else {
            panic!("expected recluster only, got {:?}", commands[0]);
        };
        assert_eq!(clusters.len(), 2);
    }
}
