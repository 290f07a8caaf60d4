use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub original_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUrlResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetUrlResponse {
    pub short_code: String,
    pub original_url: String,
}

/// Body of the HTML form on the index page.
#[derive(Debug, Deserialize)]
pub struct ShortenForm {
    /// The URL to shorten. A missing field is treated as empty.
    #[serde(default)]
    pub body: String,
}
