//! Loading bundles and engine config from files or stdin

use std::fs;
use std::io::Read;
use std::path::Path;

use kinlink_core::{EngineConfig, ResultsBundle};
use tracing::debug;

use crate::error::{Error, Result};

/// Parse a results bundle from any reader
pub fn read_bundle<R: Read>(mut reader: R) -> Result<ResultsBundle> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    if raw.trim().is_empty() {
        return Err(Error::EmptyBundle);
    }
    Ok(serde_json::from_str(&raw)?)
}

/// Load a bundle from `path`, or from stdin when `path` is `None` or `-`
pub fn load_bundle(path: Option<&Path>) -> Result<ResultsBundle> {
    match path {
        Some(p) if p != Path::new("-") => {
            debug!(path = %p.display(), "reading bundle");
            read_bundle(fs::File::open(p)?)
        }
        _ => {
            debug!("reading bundle from stdin");
            read_bundle(std::io::stdin().lock())
        }
    }
}

/// Load and validate engine config. No path means defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(EngineConfig::from_json(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinlink_core::EngineError;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn reads_bundle_from_reader() {
        let bundle = read_bundle(r#"{"search_params": {"name": "Jane Doe"}}"#.as_bytes()).unwrap();
        assert_eq!(bundle.search_params.subject_name(), Some("Jane Doe"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(read_bundle("  \n".as_bytes()), Err(Error::EmptyBundle)));
        assert!(matches!(
            read_bundle("{oops".as_bytes()),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn config_file_is_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sibling_max_age_gap": 30}}"#).unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(Error::Engine(EngineError::InvalidConfig(_)))
        ));

        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, r#"{{"detect_relationships": true}}"#).unwrap();
        assert!(load_config(Some(good.path())).unwrap().detect_relationships);
    }

    #[test]
    fn unreadable_config_is_a_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/kinlink.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
