use std::collections::BTreeSet;

use foundation::PhotoId;

use crate::error::SyncError;
use crate::protocol::{ApiRequest, PhotoDetailResponse, PhotoPayload};

/// What to do with an arriving detail response.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailOutcome {
    /// Full row to merge into the registry, on success.
    pub photo: Option<PhotoPayload>,
    /// Patch the open popup only when it still shows this photo; a response
    /// landing after the popup closed merges silently and never reopens it.
    pub patch_popup: bool,
    /// Inline error for the degraded popup, on failure.
    pub error: Option<SyncError>,
}

/// Fetches full metadata on marker activation and patches the open popup.
///
/// Requests are idempotent per photo id: a duplicate activation while a
/// fetch is pending emits no second request. Loads for distinct ids are
/// independent and cannot cross-contaminate; each response is matched
/// against the photo id of the currently open popup.
#[derive(Debug, Default)]
pub struct DetailLoader {
    pending: BTreeSet<PhotoId>,
    open: Option<PhotoId>,
}

impl DetailLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Photo id of the currently open popup, if any.
    pub fn open_popup(&self) -> Option<PhotoId> {
        self.open
    }

    pub fn is_pending(&self, id: PhotoId) -> bool {
        self.pending.contains(&id)
    }

    /// Marker activated: the popup opens on this photo and a detail fetch
    /// starts unless one is already pending.
    pub fn activate(&mut self, id: PhotoId) -> Option<ApiRequest> {
        self.open = Some(id);
        if self.pending.insert(id) {
            Some(ApiRequest::PhotoDetail { id })
        } else {
            None
        }
    }

    pub fn popup_closed(&mut self) {
        self.open = None;
    }

    /// Accepts the response for photo `id`.
    pub fn accept(
        &mut self,
        id: PhotoId,
        response: Result<PhotoDetailResponse, SyncError>,
    ) -> DetailOutcome {
        self.pending.remove(&id);
        let patch_popup = self.open == Some(id);

        match response {
            Ok(reply) if reply.status == "ok" && reply.photo.is_some() => DetailOutcome {
                photo: reply.photo,
                patch_popup,
                error: None,
            },
            Ok(reply) => DetailOutcome {
                photo: None,
                patch_popup,
                error: Some(SyncError::Rejected {
                    details: reply.status,
                }),
            },
            Err(error) => DetailOutcome {
                photo: None,
                patch_popup,
                error: Some(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DetailLoader;
    use crate::error::SyncError;
    use crate::protocol::{ApiRequest, PhotoDetailResponse};
    use foundation::PhotoId;
    use pretty_assertions::assert_eq;

    fn detail_ok(id: u64) -> PhotoDetailResponse {
        serde_json::from_str(&format!(
            r#"{{"status": "ok", "photo": {{"id": {id}, "ihash": "h{id}", "filename": "{id}.jpg"}}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn activation_fetches_once_while_pending() {
        let mut loader = DetailLoader::new();
        let first = loader.activate(PhotoId(3));
        assert_eq!(first, Some(ApiRequest::PhotoDetail { id: PhotoId(3) }));

        // Popup re-opened before the response: no duplicate request.
        assert_eq!(loader.activate(PhotoId(3)), None);
        assert!(loader.is_pending(PhotoId(3)));
    }

    #[test]
    fn response_patches_popup_only_while_it_shows_that_photo() {
        let mut loader = DetailLoader::new();
        loader.activate(PhotoId(3));

        let outcome = loader.accept(PhotoId(3), Ok(detail_ok(3)));
        assert!(outcome.patch_popup);
        assert_eq!(outcome.photo.unwrap().id, 3);
    }

    #[test]
    fn late_response_after_close_merges_without_reopening() {
        let mut loader = DetailLoader::new();
        loader.activate(PhotoId(3));
        loader.popup_closed();

        let outcome = loader.accept(PhotoId(3), Ok(detail_ok(3)));
        assert!(!outcome.patch_popup);
        // The payload is still handed back for the registry merge.
        assert!(outcome.photo.is_some());
    }

    #[test]
    fn response_for_a_different_popup_does_not_patch() {
        let mut loader = DetailLoader::new();
        loader.activate(PhotoId(3));
        loader.activate(PhotoId(4));

        let outcome = loader.accept(PhotoId(3), Ok(detail_ok(3)));
        assert!(!outcome.patch_popup);
        assert!(outcome.photo.is_some());
    }

    #[test]
    fn failure_degrades_with_inline_error() {
        let mut loader = DetailLoader::new();
        loader.activate(PhotoId(3));

        let outcome = loader.accept(
            PhotoId(3),
            Err(SyncError::Network("connection reset".to_string())),
        );
        assert!(outcome.patch_popup);
        assert!(outcome.photo.is_none());
        assert!(matches!(outcome.error, Some(SyncError::Network(_))));
        // The fetch settled; a new activation may retry.
        assert!(!loader.is_pending(PhotoId(3)));
    }
}
