//! JSON request/response shapes for the request layer. Field names and
//! shapes follow the external interface contract; `UrlRecord` itself is
//! serialized directly for the read endpoints since its derived `Serialize`
//! already matches the required field names.

use serde::{Deserialize, Serialize};

use crate::model::UrlId;

#[derive(Debug, Deserialize)]
pub struct AddUrlsRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AddedUrl {
    pub id: UrlId,
    pub url: String,
    pub state: String,
    /// True if a task for this id was already pending or processing, so the
    /// submission did not start a new run.
    pub conflict: bool,
}

#[derive(Debug, Serialize)]
pub struct AddUrlsResponse {
    pub results: Vec<AddedUrl>,
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub id: UrlId,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub id: UrlId,
    pub state: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub id: UrlId,
    pub state: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub name: &'static str,
    pub version: &'static str,
}
