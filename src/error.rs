use thiserror::Error;

// Engine failures are final: fuzzy matching is already the tolerance
// mechanism, so a failed lookup means intent could not be located, not a
// transient fault. Callers get the file path and enough of the pattern to
// show a user.
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("{file}: old content is empty, nothing to search for")]
    EmptyPattern { file: String },

    #[error("{file}: no match within edit-distance tolerance for old content {pattern:?}")]
    NoMatchFound { file: String, pattern: String },

    #[error("{file}: old content occurs {count} times verbatim, refusing to pick one")]
    AmbiguousExactMatch { file: String, count: usize },
}

impl ReplaceError {
    pub fn file(&self) -> &str {
        match self {
            ReplaceError::EmptyPattern { file }
            | ReplaceError::NoMatchFound { file, .. }
            | ReplaceError::AmbiguousExactMatch { file, .. } => file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_file() {
        let err = ReplaceError::NoMatchFound {
            file: "src/lib.rs".into(),
            pattern: "missing".into(),
        };
        assert!(err.to_string().contains("src/lib.rs"));
        assert_eq!(err.file(), "src/lib.rs");
    }
}
