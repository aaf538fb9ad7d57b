/// Opaque photo identifier (server-assigned integer key).
///
/// This is intentionally a small, copyable handle so it can be used as a
/// map key and pushed through event payloads without allocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhotoId(pub u64);

impl PhotoId {
    pub fn new(n: u64) -> Self {
        PhotoId(n)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
