/// Geographic coordinate in degrees (WGS84).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Point in CSS pixels, relative to the viewport's top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Geographic bounding box grown point by point.
///
/// Starts empty; `extend` widens it to include each coordinate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    pub fn empty() -> Self {
        Self {
            south: f64::INFINITY,
            west: f64::INFINITY,
            north: f64::NEG_INFINITY,
            east: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.south > self.north || self.west > self.east
    }

    pub fn extend(&mut self, point: LatLng) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn center(&self) -> Option<LatLng> {
        if self.is_empty() {
            return None;
        }
        Some(LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        ))
    }
}

impl Default for LatLngBounds {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{LatLng, LatLngBounds, ScreenPoint};

    #[test]
    fn bounds_start_empty_and_grow() {
        let mut b = LatLngBounds::empty();
        assert!(b.is_empty());
        assert!(b.center().is_none());

        b.extend(LatLng::new(45.0, 25.0));
        b.extend(LatLng::new(46.0, 21.0));
        assert!(!b.is_empty());
        assert_eq!(b.south, 45.0);
        assert_eq!(b.north, 46.0);
        assert_eq!(b.west, 21.0);
        assert_eq!(b.east, 25.0);

        let c = b.center().unwrap();
        assert_eq!(c.lat, 45.5);
        assert_eq!(c.lng, 23.0);
    }

    #[test]
    fn screen_distance_is_euclidean() {
        let a = ScreenPoint::new(0.0, 0.0);
        let b = ScreenPoint::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn latlng_validation() {
        assert!(LatLng::new(45.0, 25.0).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, -181.0).is_valid());
    }
}
