use nestdb_core::Error as CoreError;

/// Transport-level errors for the collection store.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },
}

impl From<Error> for CoreError {
    fn from(error: Error) -> Self {
        CoreError::Store {
            message: error.to_string(),
        }
    }
}
