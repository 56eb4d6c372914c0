//! Error types shared by the bitbake wrapper

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while driving bitbake and linking recipe directories
#[derive(Debug, Error)]
pub enum BitbakeError {
    #[error("command `{command}` failed ({}):\n{output}", exit_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("failed to start `{0}`: {1}")]
    Spawn(String, #[source] std::io::Error),

    #[error("directories not initialized")]
    UninitializedContext,

    #[error("variable {variable} not found in environment of {target}")]
    VariableNotFound { target: String, variable: String },

    #[error("value of {variable} is not a path: {value}")]
    NotAPath { variable: String, value: String },

    #[error("the folder path {} does not exist", .0.display())]
    PathNotFound(PathBuf),

    #[error("prefix {0} not supported")]
    PrefixNotSupported(String),

    #[error("cannot link {} to {}: {error}", .link.display(), .target.display())]
    SymlinkFailed {
        target: PathBuf,
        link: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("IO error at {}: {1}", .0.display())]
    IoError(PathBuf, String),
}

pub type BitbakeResult<T> = Result<T, BitbakeError>;

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}
