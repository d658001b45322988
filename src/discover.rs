use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::LaptopError;

/// Returns every `Vagrantfile.<name>` in `dir`, sorted by file name.
/// The bare `Vagrantfile` link itself is never listed.
pub fn list_vagrantfiles(dir: &Path) -> Result<Vec<PathBuf>, LaptopError> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("Vagrantfile."))
                .is_some_and(|suffix| !suffix.is_empty())
        })
        .collect();

    found.sort();
    Ok(found)
}
