use std::io;
use std::path::PathBuf;

use crate::compiler::CompileError;
use crate::config::ConfigError;
use crate::machine::VmError;

/// Everything that can end a `bf` invocation early.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Vm(#[from] VmError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing a listing to stdout failed.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            _ => 1,
        }
    }
}
