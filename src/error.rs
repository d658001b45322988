use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaptopError {
    #[error("Invalid Vagrantfile path '{0}'")]
    InvalidPath(String),

    #[error("Filesystem error on '{}': {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command '{0}' failed with exit code {1}")]
    CommandFailed(String, i32),

    #[error("Command '{0}' not found — is it installed?")]
    CommandNotFound(String),

    #[error("Unknown task '{0}'")]
    UnknownTask(String),

    #[error("No Vagrantfile.* found in '{}'", .0.display())]
    NoVagrantfiles(PathBuf),

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}
