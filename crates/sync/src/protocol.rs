//! Wire format for the photo-management server endpoints.
//!
//! This module defines:
//! - Outbound request descriptors (the host owns the actual transport)
//! - Payload types for list, detail and geotag responses
//! - The upload interface consumed by the external progress aggregator
//!
//! Everything here mirrors the server contract exactly, including the
//! `ihash` field name and the query parameter spelling.

use foundation::{LatLng, PhotoId};
use registry::PhotoRecord;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Album/date criteria for the geotag photo list; one instance per
/// submission, replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Album name; empty selects all albums.
    pub album: String,
    /// Inclusive start date, `YYYY-MM-DD`.
    pub start: String,
    /// Inclusive stop date, `YYYY-MM-DD`.
    pub stop: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            album: String::new(),
            start: "2020-01-01".to_string(),
            stop: "2021-01-01".to_string(),
        }
    }
}

/// Photo row as served by the list, map and detail endpoints.
///
/// List rows are partial; `serde(default)` keeps absent fields at their
/// sentinel values so registry merging can tell "not sent" from "empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoPayload {
    pub id: u64,
    pub ihash: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub moment: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub orientation: Option<u8>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl PhotoPayload {
    /// Converts a wire row into a registry record.
    ///
    /// A row carrying only one of lat/lng violates the both-or-neither
    /// invariant and is rejected rather than half-applied.
    pub fn into_record(self) -> Result<PhotoRecord, SyncError> {
        let coords = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
            (None, None) => None,
            _ => {
                return Err(SyncError::Malformed(format!(
                    "photo {} has only one of lat/lng",
                    self.id
                )))
            }
        };

        let mut record = PhotoRecord::new(PhotoId(self.id), self.ihash, self.filename, self.moment);
        record.coords = coords;
        record.make = self.make;
        record.model = self.model;
        record.width = self.width;
        record.height = self.height;
        record.orientation = self.orientation.unwrap_or(1);
        record.description = self.description;
        record.size = self.size;
        Ok(record)
    }
}

/// Body of `POST /geotag?op=update_location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeotagUpdate {
    pub id: u64,
    pub hash: String,
    pub lat: f64,
    pub lng: f64,
}

/// Generic `{status, details}` server reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl StatusResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Reply of `GET /photo?photo_id=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoDetailResponse {
    pub status: String,
    #[serde(default)]
    pub photo: Option<PhotoPayload>,
}

/// Outbound HTTP request descriptor.
///
/// The engine emits these; the host performs them and feeds the responses
/// back as completions.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    /// `GET /geotag?op=get_photo_list&...`, tagged with the filter sequence.
    PhotoList { seq: u64, criteria: FilterCriteria },
    /// `GET /map?op=photos` — full coordinate-bearing list for the initial
    /// population.
    MapPhotos,
    /// `POST /geotag?op=update_location`.
    UpdateLocation(GeotagUpdate),
    /// `GET /photo?photo_id=`.
    PhotoDetail { id: PhotoId },
    /// `GET /stats?op=get_stats` — external statistics view.
    Stats,
}

impl ApiRequest {
    pub fn method(&self) -> &'static str {
        match self {
            ApiRequest::UpdateLocation(_) => "POST",
            _ => "GET",
        }
    }

    pub fn path_and_query(&self) -> String {
        match self {
            ApiRequest::PhotoList { criteria, .. } => format!(
                "/geotag?op=get_photo_list&album_filter={}&start_filter={}&stop_filter={}",
                encode_query(&criteria.album),
                encode_query(&criteria.start),
                encode_query(&criteria.stop),
            ),
            ApiRequest::MapPhotos => "/map?op=photos".to_string(),
            ApiRequest::UpdateLocation(_) => "/geotag?op=update_location".to_string(),
            ApiRequest::PhotoDetail { id } => format!("/photo?photo_id={id}"),
            ApiRequest::Stats => "/stats?op=get_stats".to_string(),
        }
    }

    pub fn json_body(&self) -> Option<String> {
        match self {
            ApiRequest::UpdateLocation(update) => serde_json::to_string(update).ok(),
            _ => None,
        }
    }
}

/// Upload endpoint constants (multipart, one file per request).
pub const UPLOAD_PATH: &str = "/upload";
pub const UPLOAD_AUTH_HEADER: &str = "Authentication";

/// Outcome of a `POST /upload` attempt, keyed off the HTTP status code.
///
/// Consumed by the external upload progress aggregator; defined here so the
/// status mapping stays in one place.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Saved,
    /// 409: content hash already imported.
    Duplicate,
    Failed,
}

impl UploadOutcome {
    pub fn from_http_status(code: u16) -> Self {
        match code {
            200 => UploadOutcome::Saved,
            409 => UploadOutcome::Duplicate,
            _ => UploadOutcome::Failed,
        }
    }
}

/// Percent-encodes a query component (RFC 3986 unreserved set).
fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
