use thiserror::Error;

/// Failure of a single remote call. Shown to the user only as generic text;
/// the variant is for the log.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl ServiceError {
    /// Short tag used in log records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status(_) => "status",
            Self::Malformed(_) => "malformed",
            Self::NotConfigured(_) => "not_configured",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_and_kind() {
        let err = ServiceError::Status(502);
        assert_eq!(err.to_string(), "unexpected HTTP status 502");
        assert_eq!(err.kind(), "status");

        let err = ServiceError::NotConfigured("chart service URL");
        assert_eq!(err.to_string(), "chart service URL is not configured");
        assert_eq!(ServiceError::Malformed("x".into()).kind(), "malformed");
    }
}
