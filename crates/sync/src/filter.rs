use crate::protocol::{ApiRequest, FilterCriteria, PhotoPayload};

/// Decision for an arriving list response.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDecision {
    /// Replace the registry with these rows and rebuild markers.
    Apply(Vec<PhotoPayload>),
    /// Superseded by a newer request; discard silently.
    Stale,
}

/// Issues list queries and discards out-of-order responses.
///
/// Each request carries a monotonically increasing sequence number; only the
/// response for the newest issued request is ever applied, so a slow older
/// query can never overwrite a newer result. The marker set rendered before
/// a submission stays visible until its replacement is applied.
#[derive(Debug, Default)]
pub struct FilterController {
    issued: u64,
    applied: u64,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_seq(&self) -> u64 {
        self.issued
    }

    /// Issues one query that will replace all prior results.
    pub fn submit(&mut self, criteria: FilterCriteria) -> ApiRequest {
        self.issued += 1;
        ApiRequest::PhotoList {
            seq: self.issued,
            criteria,
        }
    }

    /// Accepts a response for sequence `seq`.
    pub fn accept(&mut self, seq: u64, photos: Vec<PhotoPayload>) -> FilterDecision {
        if seq == self.issued && seq > self.applied {
            self.applied = seq;
            FilterDecision::Apply(photos)
        } else {
            FilterDecision::Stale
        }
    }

    /// Marks a failed request as settled without applying anything.
    pub fn reject(&mut self, seq: u64) {
        if seq == self.issued && seq > self.applied {
            self.applied = seq;
        }
    }
}
