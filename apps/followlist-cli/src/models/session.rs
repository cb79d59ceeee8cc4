//! Session model for the logged-in account

use crate::config::ConfigPaths;
use crate::error::CliResult;
use chrono::{DateTime, Utc};
use followlist_core::{Did, Handle};
use serde::{Deserialize, Serialize};

/// Non-secret session context, persisted as session.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Account DID
    pub did: Did,

    /// Account handle at login time
    #[serde(default)]
    pub handle: Option<Handle>,

    /// Personal data server the tokens are valid for
    pub pds_url: String,

    /// Authorization server issuer
    pub issuer: String,

    /// Token endpoint used for refresh
    pub token_endpoint: String,

    /// Revocation endpoint, if the server advertises one
    #[serde(default)]
    pub revocation_endpoint: Option<String>,

    /// Client id the tokens were issued to
    pub client_id: String,

    /// When the session was established
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Load session from file
    pub fn load(paths: &ConfigPaths) -> CliResult<Option<Self>> {
        if !paths.session_file.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&paths.session_file)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    /// Save session to file
    pub fn save(&self, paths: &ConfigPaths) -> CliResult<()> {
        paths.ensure_dir_exists()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&paths.session_file, content)?;
        Ok(())
    }

    /// Delete session file
    pub fn delete(paths: &ConfigPaths) -> CliResult<()> {
        if paths.session_file.exists() {
            std::fs::remove_file(&paths.session_file)?;
        }
        Ok(())
    }

    /// Handle when known, otherwise the DID
    pub fn display_name(&self) -> String {
        match &self.handle {
            Some(handle) => format!("@{handle}"),
            None => self.did.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_session() -> Session {
        Session {
            did: Did::new("did:plc:abc123").unwrap(),
            handle: Some(Handle::normalize("alice.test").unwrap()),
            pds_url: "https://pds.example".to_string(),
            issuer: "https://auth.example".to_string(),
            token_endpoint: "https://auth.example/oauth/token".to_string(),
            revocation_endpoint: None,
            client_id: "http://localhost".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(temp_dir.path());

        let session = create_test_session();
        session.save(&paths).unwrap();

        let loaded = Session::load(&paths).unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_session_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(temp_dir.path());

        assert!(Session::load(&paths).unwrap().is_none());
    }

    #[test]
    fn test_session_delete() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(temp_dir.path());

        create_test_session().save(&paths).unwrap();
        assert!(paths.session_file.exists());

        Session::delete(&paths).unwrap();
        assert!(!paths.session_file.exists());
    }

    #[test]
    fn test_display_name() {
        let mut session = create_test_session();
        assert_eq!(session.display_name(), "@alice.test");
        session.handle = None;
        assert_eq!(session.display_name(), "did:plc:abc123");
    }
}
