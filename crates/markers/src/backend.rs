use foundation::{LatLng, LatLngBounds, PhotoId, ScreenPoint, Viewport};

use crate::cluster::ClusterNode;

/// Popup payload, built from whatever the registry currently holds.
///
/// Rendered immediately on activation; patched in place once the detail
/// fetch lands. `pending` and `error` let the host show a spinner or an
/// inline failure without closing the popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub id: PhotoId,
    pub title: String,
    /// 192 px thumbnail for the popup body.
    pub image_url: String,
    /// Clockwise CSS rotation for non-upright EXIF orientations.
    pub rotation_degrees: u16,
    pub camera: Option<String>,
    pub description: Option<String>,
    pub size_bytes: Option<u64>,
    pub dimensions: Option<(u32, u32)>,
    /// Capture moment, epoch seconds.
    pub moment: i64,
    pub pending: bool,
    pub error: Option<String>,
}

/// Capability interface implemented by each map widget generation.
///
/// The engine only supplies point data, cluster groupings and bounds; how a
/// widget animates, spiderfies or tiles is its own business.
pub trait MapBackend {
    fn add_marker(&mut self, id: PhotoId, at: LatLng, icon_url: &str);
    fn move_marker(&mut self, id: PhotoId, at: LatLng);
    fn remove_marker(&mut self, id: PhotoId);
    /// Replaces the previously rendered cluster set.
    fn render_clusters(&mut self, clusters: &[ClusterNode]);
    fn fit_bounds(&mut self, bounds: LatLngBounds);
    fn open_popup(&mut self, content: &PopupContent);
    fn set_popup_content(&mut self, content: &PopupContent);
}

/// Events a widget raises back into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Click on a single, unclustered marker.
    MarkerClicked(PhotoId),
    /// Click on a cluster; members are the grouped photo ids.
    ClusterClicked(Vec<PhotoId>),
    /// Drag began on an unplaced thumbnail or an existing marker.
    DragStarted(PhotoId),
    /// Drag ended without a drop on the map.
    DragCancelled(PhotoId),
    /// Drop at a container pixel position.
    Dropped { id: PhotoId, at: ScreenPoint },
    /// Pan/zoom/resize settled.
    ViewChanged(Viewport),
    PopupClosed,
}

/// One backend call, captured for inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    AddMarker {
        id: PhotoId,
        at: LatLng,
        icon_url: String,
    },
    MoveMarker {
        id: PhotoId,
        at: LatLng,
    },
    RemoveMarker {
        id: PhotoId,
    },
    RenderClusters {
        clusters: Vec<ClusterNode>,
    },
    FitBounds(LatLngBounds),
    OpenPopup(PopupContent),
    SetPopupContent(PopupContent),
}

/// Backend that records every command instead of rendering.
///
/// Used by tests and headless hosts; doubles as the reference for what a
/// real widget adapter must implement.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<BackendCommand>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl MapBackend for RecordingBackend {
    fn add_marker(&mut self, id: PhotoId, at: LatLng, icon_url: &str) {
        self.commands.push(BackendCommand::AddMarker {
            id,
            at,
            icon_url: icon_url.to_string(),
        });
    }

    fn move_marker(&mut self, id: PhotoId, at: LatLng) {
        self.commands.push(BackendCommand::MoveMarker { id, at });
    }

    fn remove_marker(&mut self, id: PhotoId) {
        self.commands.push(BackendCommand::RemoveMarker { id });
    }

    fn render_clusters(&mut self, clusters: &[ClusterNode]) {
        self.commands.push(BackendCommand::RenderClusters {
            clusters: clusters.to_vec(),
        });
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds) {
        self.commands.push(BackendCommand::FitBounds(bounds));
    }

    fn open_popup(&mut self, content: &PopupContent) {
        self.commands.push(BackendCommand::OpenPopup(content.clone()));
    }

    fn set_popup_content(&mut self, content: &PopupContent) {
        self.commands
            .push(BackendCommand::SetPopupContent(content.clone()));
    }
}
