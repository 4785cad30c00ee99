use crate::error::{Result, ScanError};
use std::path::{Path, PathBuf};

/// SSH key pair used to authenticate pulls. Keys are expected without a passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub private_key: PathBuf,
}

impl Credential {
    /// Loads `~/.ssh/id_rsa`.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ScanError::Credential("cannot locate home directory".to_string()))?;
        Self::from_home(&home)
    }

    pub fn from_home(home: &Path) -> Result<Self> {
        let private_key = home.join(".ssh").join("id_rsa");
        if !private_key.is_file() {
            return Err(ScanError::Credential(format!(
                "private key not found: {}",
                private_key.display()
            )));
        }
        Ok(Self { private_key })
    }

    /// Value for `GIT_SSH_COMMAND` that pins ssh to this key.
    pub fn ssh_command(&self) -> String {
        format!(
            "ssh -i \"{}\" -o IdentitiesOnly=yes -o BatchMode=yes",
            self.private_key.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_key_from_home() {
        let home = tempdir().unwrap();
        fs::create_dir_all(home.path().join(".ssh")).unwrap();
        fs::write(home.path().join(".ssh/id_rsa"), "key").unwrap();

        let cred = Credential::from_home(home.path()).unwrap();
        assert_eq!(cred.private_key, home.path().join(".ssh/id_rsa"));
        assert!(cred.ssh_command().contains("id_rsa"));
    }

    #[test]
    fn missing_key_is_credential_error() {
        let home = tempdir().unwrap();
        let err = Credential::from_home(home.path()).unwrap_err();
        assert!(matches!(err, ScanError::Credential(_)));
    }
}
