//! Unit tests for error handling
//!
//! Tests error types, conversions, and error message formatting.

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::BoardRagError;

    // ====== Taxonomy Tests ======

    #[test]
    fn test_query_time_errors_display_stage() {
        let retrieval = BoardRagError::Retrieval("index unavailable".to_string());
        let traversal = BoardRagError::Traversal("relationship lookup failed".to_string());
        let generation = BoardRagError::Generation("completion timed out".to_string());

        assert_eq!(
            retrieval.to_string(),
            "Retrieval error: index unavailable"
        );
        assert!(traversal.to_string().starts_with("Graph traversal error"));
        assert!(generation.to_string().contains("completion timed out"));
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let errors = [
            BoardRagError::Retrieval(String::new()),
            BoardRagError::Traversal(String::new()),
            BoardRagError::Generation(String::new()),
            BoardRagError::SourceExtract(String::new()),
            BoardRagError::Commit(String::new()),
            BoardRagError::IndexWrite(String::new()),
            BoardRagError::ConfigError(String::new()),
        ];

        let kinds: std::collections::HashSet<&str> = errors.iter().map(BoardRagError::kind).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_config_error() {
        let error = BoardRagError::ConfigError("sync.batch_size must be positive".to_string());
        assert!(matches!(error, BoardRagError::ConfigError(_)));
        assert!(error.to_string().contains("configuration"));
    }

    #[test]
    fn test_custom_error_has_no_prefix() {
        let error = BoardRagError::Custom("Test error message".to_string());
        assert_eq!(error.to_string(), "Test error message");
    }

    // ====== Error Conversion Tests ======

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: BoardRagError = io_err.into();

        match err {
            BoardRagError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{invalid json}");

        let err: BoardRagError = parse_result.unwrap_err().into();
        assert!(matches!(err, BoardRagError::Serialization(_)));
        assert_eq!(err.kind(), "serialization");
    }

    #[test]
    fn test_error_from_toml() {
        let parse_result: std::result::Result<toml::Value, _> = toml::from_str("[broken");

        let err: BoardRagError = parse_result.unwrap_err().into();
        assert!(matches!(err, BoardRagError::TomlParsing(_)));
    }
}
