use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use macrolog_core::store::FixedSession;

pub const DB_ENV: &str = "MACROLOG_DB";
pub const USER_ENV: &str = "MACROLOG_USER";
pub const DEFAULT_USER: &str = "local";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub user: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "macrolog").context("Could not determine home directory")?;
        Self::resolve(
            proj_dirs.data_dir(),
            std::env::var(DB_ENV).ok(),
            std::env::var(USER_ENV).ok(),
        )
    }

    /// Build a config rooted at `data_dir`, applying optional overrides for the
    /// database path and user. Blank overrides are ignored.
    fn resolve(data_dir: &Path, db_path: Option<String>, user: Option<String>) -> Result<Self> {
        let data_dir = data_dir.to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = db_path
            .filter(|p| !p.trim().is_empty())
            .map_or_else(|| data_dir.join("macrolog.db"), PathBuf::from);
        let user = user
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        Ok(Config {
            db_path,
            data_dir,
            user,
        })
    }

    pub fn session(&self) -> FixedSession {
        FixedSession::user(self.user.clone())
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)`.
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        tracing::info!(path = %path.display(), "generated API key");
        eprintln!("Generated new API key: {key}");
        eprintln!("Include in requests: Authorization: Bearer {key}");
        Ok((key, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let config = Config::resolve(&data, None, None).unwrap();
        assert!(data.is_dir());
        assert_eq!(config.db_path, data.join("macrolog.db"));
        assert_eq!(config.user, DEFAULT_USER);
    }

    #[test]
    fn test_resolve_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(
            dir.path(),
            Some("/tmp/other.db".to_string()),
            Some(" alice ".to_string()),
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.user, "alice");
    }

    #[test]
    fn test_resolve_blank_overrides_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            Config::resolve(dir.path(), Some("  ".to_string()), Some(String::new())).unwrap();
        assert_eq!(config.db_path, dir.path().join("macrolog.db"));
        assert_eq!(config.user, DEFAULT_USER);
    }

    #[test]
    fn test_api_key_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(dir.path(), None, None).unwrap();

        let (key, created) = config.load_or_create_api_key().unwrap();
        assert!(created);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

        let (again, created) = config.load_or_create_api_key().unwrap();
        assert!(!created);
        assert_eq!(again, key);
    }

    #[cfg(unix)]
    #[test]
    fn test_api_key_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(dir.path(), None, None).unwrap();
        config.load_or_create_api_key().unwrap();
        let mode = std::fs::metadata(dir.path().join("api_key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
