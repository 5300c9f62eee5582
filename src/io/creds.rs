//! Credential file resolution.
//!
//! The credential file is a JSON object with five optional string fields:
//! account, user, password, database, schema. A field that is simply absent
//! yields an unset credential — connecting with it will fail, loading it will
//! not. Only an absent or unparseable *file* is an error.

use std::fs::File;
use std::path::Path;

use crate::domain::Credentials;
use crate::error::AppError;

/// Default credential file path, next to where the tool is run.
pub const DEFAULT_CREDS_PATH: &str = "creds-snowflake.json";

/// Load credentials from a JSON file.
pub fn load_credentials(path: &Path) -> Result<Credentials, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::CredentialLoad(format!(
            "Failed to open credential file '{}': {e}",
            path.display()
        ))
    })?;

    serde_json::from_reader(file).map_err(|e| {
        AppError::CredentialLoad(format!(
            "Invalid credential file '{}': {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "csvlift-creds-test-{}-{}.json",
            std::process::id(),
            contents.len()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_fields_become_none_not_errors() {
        let path = write_temp(r#"{"account": "acme-xy12345", "user": "loader"}"#);
        let creds = load_credentials(&path).unwrap();
        assert_eq!(creds.account.as_deref(), Some("acme-xy12345"));
        assert_eq!(creds.user.as_deref(), Some("loader"));
        assert!(creds.password.is_none());
        assert!(creds.database.is_none());
        assert!(creds.schema.is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn absent_file_is_credential_load_error() {
        let err = load_credentials(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, AppError::CredentialLoad(_)), "got {err:?}");
    }

    #[test]
    fn unparseable_file_is_credential_load_error() {
        let path = write_temp("{ this is not json");
        let err = load_credentials(&path).unwrap_err();
        assert!(matches!(err, AppError::CredentialLoad(_)), "got {err:?}");
        let _ = std::fs::remove_file(path);
    }
}
