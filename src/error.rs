//! Crate-level error type.
//!
//! Almost nothing in the session core can fail: rejected transitions are
//! silent no-ops. `DashboardError` covers the edges where real I/O happens:
//! loading configuration, the persisted onboarding flag, and the HTTP surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// A config file existed but could not be parsed.
    #[error("invalid config {path}: {detail}")]
    Config { path: String, detail: String },

    /// Filesystem failure reading or writing a local file.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP request could not be parsed or carried an unusable body.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("session lock poisoned")]
    Poisoned,
}

impl DashboardError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        DashboardError::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status code the web layer answers with for this error.
    pub fn status(&self) -> u16 {
        match self {
            DashboardError::BadRequest(_) | DashboardError::Json(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_maps_to_400() {
        assert_eq!(DashboardError::BadRequest("x".into()).status(), 400);
    }

    #[test]
    fn test_json_error_maps_to_400() {
        let err: DashboardError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_poisoned_maps_to_500() {
        assert_eq!(DashboardError::Poisoned.status(), 500);
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = DashboardError::io(
            "/tmp/flags.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/flags.json"));
    }
}
