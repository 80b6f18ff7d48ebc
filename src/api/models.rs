use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub download_link: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
