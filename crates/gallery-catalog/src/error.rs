use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Image API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image API returned {status}: {body}")]
    Status { status: u16, body: String },
}
