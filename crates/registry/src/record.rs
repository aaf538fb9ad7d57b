use foundation::{LatLng, PhotoId};

/// Client-side photo metadata, merged from list and detail fetches.
///
/// Latitude and longitude travel together as one `Option<LatLng>`, so a
/// partially geotagged record is unrepresentable.
///
/// Scalar fields use sentinel values for "not sent": an empty string for
/// `ihash`/`filename`, `0` for `moment`, `1` for `orientation`. `merge_from`
/// never overwrites a known value with a sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: PhotoId,
    /// Content hash (thumbnail sharding + de-duplication key).
    pub ihash: String,
    pub filename: String,
    /// Capture moment, epoch seconds.
    pub moment: i64,
    pub coords: Option<LatLng>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// EXIF orientation code, 1..=8.
    pub orientation: u8,
    pub description: Option<String>,
    /// File size in bytes.
    pub size: Option<u64>,
}

impl PhotoRecord {
    pub fn new(
        id: PhotoId,
        ihash: impl Into<String>,
        filename: impl Into<String>,
        moment: i64,
    ) -> Self {
        Self {
            id,
            ihash: ihash.into(),
            filename: filename.into(),
            moment,
            coords: None,
            make: None,
            model: None,
            width: None,
            height: None,
            orientation: 1,
            description: None,
            size: None,
        }
    }

    /// A placed photo has coordinates and renders as a marker.
    pub fn is_placed(&self) -> bool {
        self.coords.is_some()
    }

    pub fn needs_rotation(&self) -> bool {
        self.orientation != 1
    }

    /// Clockwise CSS rotation matching the EXIF orientation code.
    pub fn rotation_degrees(&self) -> u16 {
        match self.orientation {
            3 | 4 => 180,
            5 | 6 => 90,
            7 | 8 => 270,
            _ => 0,
        }
    }

    /// "Make Model" label for popups, if either half is known.
    pub fn camera_label(&self) -> Option<String> {
        match (self.make.as_deref(), self.model.as_deref()) {
            (None, None) => None,
            (make, model) => Some(
                [make.unwrap_or(""), model.unwrap_or("")]
                    .join(" ")
                    .trim()
                    .to_string(),
            ),
        }
    }

    /// Merges `incoming` into this record, field by field.
    ///
    /// Fields the incoming partial record does not carry (None or sentinel)
    /// keep their cached value, so a coarse list fetch never erases richer
    /// detail fetched earlier. Returns `true` if anything changed.
    pub fn merge_from(&mut self, incoming: &PhotoRecord) -> bool {
        let before = self.clone();

        if !incoming.ihash.is_empty() {
            self.ihash = incoming.ihash.clone();
        }
        if !incoming.filename.is_empty() {
            self.filename = incoming.filename.clone();
        }
        if incoming.moment != 0 {
            self.moment = incoming.moment;
        }
        if incoming.orientation != 1 {
            self.orientation = incoming.orientation;
        }
        if incoming.coords.is_some() {
            self.coords = incoming.coords;
        }
        merge_option(&mut self.make, &incoming.make);
        merge_option(&mut self.model, &incoming.model);
        merge_option(&mut self.width, &incoming.width);
        merge_option(&mut self.height, &incoming.height);
        merge_option(&mut self.description, &incoming.description);
        merge_option(&mut self.size, &incoming.size);

        *self != before
    }
}

fn merge_option<T: Clone>(target: &mut Option<T>, incoming: &Option<T>) {
    if incoming.is_some() {
        *target = incoming.clone();
    }
}
