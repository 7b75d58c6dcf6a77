use camino::Utf8PathBuf;
use directories::ProjectDirs;

use crate::StorageError;

const QUALIFIER: &str = "com";
const ORG: &str = "portal";
const APP: &str = "studio";

/// Keys become file names, so only a conservative character set is allowed.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid || key.contains("..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub fn default_data_dir() -> Result<Utf8PathBuf, StorageError> {
    let proj_dirs = ProjectDirs::from(QUALIFIER, ORG, APP).ok_or(StorageError::NoDataDir)?;
    Utf8PathBuf::from_path_buf(proj_dirs.data_dir().to_path_buf())
        .map_err(|p| StorageError::NonUtf8Path(p.to_string_lossy().into_owned()))
}
