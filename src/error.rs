use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to fetch filter list: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("window error: {0}")]
    Tauri(#[from] tauri::Error),

    #[error("engine cache is unreadable")]
    EngineCache,

    #[error("no filter rules could be loaded")]
    NoFilters,

    #[error("{0}")]
    Other(String),
}

// Commands hand errors back to the frontend as plain strings.
impl Serialize for ShellError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

pub type ShellResult<T> = Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_display_string() {
        let err = ShellError::NoFilters;
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"no filter rules could be loaded\"");
    }

    #[test]
    fn url_errors_convert() {
        let err: ShellError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ShellError::Url(_)));
    }
}
