use markers::ClusterConfig;
use serde::{Deserialize, Serialize};

/// Initial map view before any user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialView {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            lat: 45.5,
            lng: 25.0,
            zoom: 7.0,
            width: 1024,
            height: 768,
        }
    }
}

/// Configuration for the map/geotag session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    pub cluster: ClusterConfig,
    pub view: InitialView,
}
