use crate::geo::{LatLng, ScreenPoint};

/// Tile edge length in CSS pixels, shared by all Web Mercator widgets.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Current map view: center, zoom, and viewport size in pixels.
///
/// Projection math follows the standard Web Mercator world-pixel scheme so
/// screen distances computed here agree with what any tile-based widget
/// renders at the same zoom.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    /// World size in pixels at `zoom` (256 × 2^zoom).
    pub fn world_size(zoom: f64) -> f64 {
        TILE_SIZE * zoom.exp2()
    }

    /// Projects a geographic coordinate to absolute world pixels at `zoom`.
    pub fn project_world(point: LatLng, zoom: f64) -> ScreenPoint {
        let size = Self::world_size(zoom);
        let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let s = lat.to_radians().sin();

        let x = (point.lng + 180.0) / 360.0 * size;
        let y = (0.5 - ((1.0 + s) / (1.0 - s)).ln() / (4.0 * std::f64::consts::PI)) * size;
        ScreenPoint::new(x, y)
    }

    /// Inverse of `project_world`.
    pub fn unproject_world(point: ScreenPoint, zoom: f64) -> LatLng {
        let size = Self::world_size(zoom);
        let lng = point.x / size * 360.0 - 180.0;
        let n = std::f64::consts::PI * (1.0 - 2.0 * point.y / size);
        let lat = n.sinh().atan().to_degrees();
        LatLng::new(lat, lng)
    }

    /// Projects a coordinate to container pixels (relative to the viewport's
    /// top-left corner).
    pub fn project(&self, point: LatLng) -> ScreenPoint {
        let world = Self::project_world(point, self.zoom);
        let origin = self.origin();
        ScreenPoint::new(world.x - origin.x, world.y - origin.y)
    }

    /// Converts container pixels back to a geographic coordinate.
    ///
    /// This is the drop-gesture path: a pointer position inside the map
    /// element resolves to the coordinate under it.
    pub fn unproject(&self, point: ScreenPoint) -> LatLng {
        let origin = self.origin();
        Self::unproject_world(
            ScreenPoint::new(point.x + origin.x, point.y + origin.y),
            self.zoom,
        )
    }

    /// World pixel position of the viewport's top-left corner.
    fn origin(&self) -> ScreenPoint {
        let center = Self::project_world(self.center, self.zoom);
        ScreenPoint::new(
            center.x - self.width as f64 / 2.0,
            center.y - self.height as f64 / 2.0,
        )
    }
}
