use std::fs;
use std::path::{Path, PathBuf};

use crate::{ClientError, ClientResult};

const HOME_ENV_VAR: &str = "CASHCAST_HOME";

const DEFAULT_DIR_NAME: &str = ".cashcast";
const LEDGER_FILE: &str = "ledger.db";

/// The directory holding one user's ledger database and settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerHome {
    root: PathBuf,
}

impl LedgerHome {
    /// `--home` wins over `CASHCAST_HOME`, which wins over `~/.cashcast`.
    /// Relative paths are anchored at the working directory.
    pub fn resolve(home_override: Option<&Path>) -> ClientResult<Self> {
        let candidate = home_override
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(HOME_ENV_VAR).map(PathBuf::from))
            .or_else(|| ::home::home_dir().map(|dir| dir.join(DEFAULT_DIR_NAME)))
            .ok_or_else(|| {
                ClientError::ledger_init_failed(
                    Path::new("."),
                    "Could not resolve a home directory for the ledger.",
                )
            })?;

        let root = if candidate.is_absolute() {
            candidate
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&candidate))
                .map_err(|error| ClientError::ledger_init_failed(&candidate, &error.to_string()))?
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    /// Creates the directory if needed, readable by the owner only.
    pub fn prepare(&self) -> ClientResult<()> {
        fs::create_dir_all(&self.root).map_err(|error| ClientError::from_io(&self.root, &error))?;
        restrict_to_owner(&self.root);
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(error) = fs::set_permissions(path, fs::Permissions::from_mode(0o700)) {
        tracing::debug!(path = %path.display(), %error, "could not restrict ledger home permissions");
    }
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) {}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::LedgerHome;

    #[test]
    fn explicit_home_owns_the_ledger_file() {
        let home = LedgerHome::resolve(Some(Path::new("/srv/cashcast")));
        assert!(home.is_ok());
        if let Ok(home) = home {
            assert_eq!(home.root(), Path::new("/srv/cashcast"));
            assert_eq!(home.db_path(), Path::new("/srv/cashcast/ledger.db"));
        }
    }

    #[test]
    fn relative_home_is_anchored_at_the_working_directory() {
        let home = LedgerHome::resolve(Some(Path::new("ledger-data")));
        assert!(home.is_ok());
        if let Ok(home) = home {
            assert!(home.root().is_absolute());
            assert!(home.root().ends_with("ledger-data"));
        }
    }
}
