use std::path::{Path, PathBuf};

use academy_core::model::{Curriculum, CurriculumError};
use thiserror::Error;

/// Store used when neither `--store` nor `ACADEMY_STORE_URL` is given.
pub const DEFAULT_STORE_URL: &str = "sqlite://academy.sqlite3";

/// Curriculum compiled into the binary.
const BUNDLED_CURRICULUM: &str = include_str!("../assets/curriculum.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid --store value: {raw}")]
    InvalidStoreUrl { raw: String },
    #[error("cannot read curriculum {path}: {source}")]
    ReadCurriculum {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot prepare store file: {0}")]
    PrepareStore(#[from] std::io::Error),
    #[error(transparent)]
    Curriculum(#[from] CurriculumError),
}

/// Turn a user-supplied store location into an absolute `sqlite://` URL.
///
/// Accepts `sqlite::memory:`, full `sqlite://` URLs, `sqlite:` prefixed paths
/// and bare paths (relative to the working directory).
///
/// # Errors
///
/// Returns `ConfigError::InvalidStoreUrl` for a blank value.
pub fn normalize_store_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidStoreUrl {
            raw: raw.to_string(),
        });
    }
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_string());
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

/// Create the database file (and its parent directories) if missing.
///
/// `SQLite` refuses to open a path that does not exist unless asked to create it.
///
/// # Errors
///
/// Returns `ConfigError` if the URL has no path or the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ConfigError::InvalidStoreUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ConfigError::InvalidStoreUrl {
            raw: db_url.to_string(),
        });
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Load the curriculum from `path`, or the bundled one when `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or fails validation.
pub fn load_curriculum(path: Option<&Path>) -> Result<Curriculum, ConfigError> {
    let Some(path) = path else {
        return Ok(Curriculum::from_json(BUNDLED_CURRICULUM)?);
    };
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadCurriculum {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loading curriculum from file");
    Ok(Curriculum::from_json(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_full_urls_pass_through() {
        assert_eq!(normalize_store_url("sqlite::memory:").unwrap(), "sqlite::memory:");
        assert_eq!(
            normalize_store_url("sqlite:///tmp/a.sqlite3").unwrap(),
            "sqlite:///tmp/a.sqlite3"
        );
    }

    #[test]
    fn absolute_paths_get_scheme() {
        assert_eq!(
            normalize_store_url("/var/lib/academy.sqlite3").unwrap(),
            "sqlite:///var/lib/academy.sqlite3"
        );
        assert_eq!(
            normalize_store_url("sqlite:/var/lib/academy.sqlite3").unwrap(),
            "sqlite:///var/lib/academy.sqlite3"
        );
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_store_url("academy.sqlite3").unwrap();
        let path = url.strip_prefix("sqlite://").unwrap();
        assert!(Path::new(path).is_absolute());
        assert!(path.ends_with("academy.sqlite3"));
    }

    #[test]
    fn blank_store_is_rejected() {
        assert!(matches!(
            normalize_store_url("  "),
            Err(ConfigError::InvalidStoreUrl { .. })
        ));
    }

    #[test]
    fn prepare_rejects_url_without_path() {
        assert!(prepare_sqlite_file("sqlite://").is_err());
        assert!(prepare_sqlite_file("postgres://db").is_err());
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }

    #[test]
    fn bundled_curriculum_is_valid() {
        let curriculum = load_curriculum(None).unwrap();
        assert_eq!(curriculum.modules().len(), 15);
        assert_eq!(curriculum.modules()[0].id().as_str(), "foundations");
        assert!(curriculum.lesson_count() >= 10);
    }

    #[test]
    fn missing_curriculum_file_is_reported() {
        let err = load_curriculum(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadCurriculum { .. }));
    }
}
