/// Thumbnail sizes generated server-side.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ThumbSize {
    /// Side list items and marker icons.
    Small,
    /// Popup images.
    Medium,
    /// Full-screen overlay viewer.
    Large,
}

impl ThumbSize {
    pub fn pixels(&self) -> u32 {
        match self {
            ThumbSize::Small => 64,
            ThumbSize::Medium => 192,
            ThumbSize::Large => 960,
        }
    }
}

/// Thumbnail URL for a content hash.
///
/// The media tree shards thumbnails into two directory levels named after
/// the first two characters of the hash:
/// `/media/thumbnails/<size>px/<hash[0]>/<hash[1]>/<hash>`.
pub fn thumbnail_url(ihash: &str, size: ThumbSize) -> String {
    let first = ihash.get(0..1).unwrap_or("");
    let second = ihash.get(1..2).unwrap_or("");
    format!(
        "/media/thumbnails/{}px/{}/{}/{}",
        size.pixels(),
        first,
        second,
        ihash
    )
}
