//! Database credentials
//!
//! Always read from a file so they can be mounted into a container as a
//! secret rather than passed through the environment.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigError;

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read `{"username": .., "password": ..}` from `path`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(ConfigError::EmptyFile {
                path: path.to_path_buf(),
            });
        }

        serde_json::from_slice(&content).map_err(|source| ConfigError::Credentials {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn file_with(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn reads_credentials() {
        let file = file_with(r#"{"username": "postgres", "password": "hunter2"}"#);
        let cred = Credentials::from_file(file.path()).unwrap();

        assert_eq!(cred.username, "postgres");
        assert_eq!(cred.password, "hunter2");
    }

    #[test]
    fn debug_hides_password() {
        let file = file_with(r#"{"username": "postgres", "password": "hunter2"}"#);
        let cred = Credentials::from_file(file.path()).unwrap();
        assert!(!format!("{:?}", cred).contains("hunter2"));
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = file_with("  \n");
        let err = Credentials::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFile { .. }));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Credentials::from_file(Path::new("/nonexistent/credentials.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/credentials.json"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let file = file_with(r#"{"user": "postgres"}"#);
        let err = Credentials::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Credentials { .. }));
    }
}
