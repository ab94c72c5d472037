//! Optional TOML configuration loading

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Error, Result, io};

/// Load a TOML file into `T`.
///
/// A missing file yields `Ok(None)` so callers can fall back to defaults.
/// Malformed TOML or a schema mismatch is reported with the file path.
pub fn load_toml_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let Some(content) = io::read_text_optional(path)? else {
        return Ok(None);
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        jobs: Option<usize>,
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        let loaded: Option<Sample> = load_toml_optional(&dir.path().join("x.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn parses_present_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.toml");
        std::fs::write(&path, "jobs = 3\n").unwrap();

        let loaded: Option<Sample> = load_toml_optional(&path).unwrap();
        assert_eq!(loaded, Some(Sample { jobs: Some(3) }));
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.toml");
        std::fs::write(&path, "jobs = = 3\n").unwrap();

        let err = load_toml_optional::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("x.toml"), "got: {err}");
    }
}
