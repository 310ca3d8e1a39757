use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content document '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse content document '{path}' at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ContentError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

pub fn read_json_document<T: DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json_document(&raw, path)
}

/// Like [`read_json_document`], but a missing file is `Ok(None)`.
pub fn read_optional_json_document<T: DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, ContentError> {
    match fs::read_to_string(path) {
        Ok(raw) => parse_json_document(&raw, path).map(Some),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ContentError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parses `raw`, reporting the JSON path of the first field that failed.
/// `origin` only labels errors.
pub fn parse_json_document<T: DeserializeOwned>(raw: &str, origin: &Path) -> Result<T, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        let json_path = if json_path.is_empty() || json_path == "." {
            "document root".to_string()
        } else {
            json_path
        };
        ContentError::Parse {
            path: origin.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Speed {
        walk: f32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        units: BTreeMap<String, Speed>,
    }

    #[test]
    fn reads_document_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.json");
        fs::write(&path, r#"{ "units": { "zombie": { "walk": 1.5 } } }"#).expect("write");

        let doc: Doc = read_json_document(&path).expect("doc");

        assert_eq!(doc.units["zombie"], Speed { walk: 1.5 });
    }

    #[test]
    fn parse_error_names_the_failing_field() {
        let error = parse_json_document::<Doc>(
            r#"{ "units": { "zombie": { "walk": "fast" } } }"#,
            Path::new("doc.json"),
        )
        .expect_err("bad type");

        match &error {
            ContentError::Parse { json_path, .. } => assert_eq!(json_path, "units.zombie.walk"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.to_string().contains("doc.json"));
    }

    #[test]
    fn syntax_error_reports_document_root() {
        let error =
            parse_json_document::<Doc>("{", Path::new("doc.json")).expect_err("truncated");

        match error {
            ContentError::Parse { json_path, .. } => assert_eq!(json_path, "document root"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_optional_document_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.json");

        let doc: Option<Doc> = read_optional_json_document(&missing).expect("no error");
        assert!(doc.is_none());

        let error = read_json_document::<Doc>(&missing).expect_err("required");
        assert!(matches!(error, ContentError::Read { .. }));
        assert_eq!(error.path(), missing.as_path());
    }
}
