use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("GPX writer produced invalid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}
