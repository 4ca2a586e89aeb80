//! Library and application errors

use std::{io, path::PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::fuses::{mac::MacAddress, FuseWord};

/// All possible errors returned by imxfuse
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid argument: {0}")]
    #[diagnostic(code(imxfuse::invalid_argument))]
    InvalidArgument(String),

    #[error("Unsupported SoC '{0}'")]
    #[diagnostic(
        code(imxfuse::incompatible_platform),
        help("The fuse map compiled into this tool is only valid for the i.MX8M Mini.\n\
              Use `--image` to operate on an nvmem image captured from a target device.")
    )]
    IncompatiblePlatform(String),

    #[error("Fuse device I/O failed")]
    #[diagnostic(code(imxfuse::io_failure))]
    Io(#[from] io::Error),

    #[error("{word} is already programmed to {current:#010x}, refusing to change it to {desired:#010x}")]
    #[diagnostic(
        code(imxfuse::write_conflict),
        help("A programmed fuse word can never be altered. No fuses have been written.")
    )]
    WriteConflict {
        word: FuseWord,
        current: u32,
        desired: u32,
    },

    #[error("MAC address fuses already hold {0}")]
    #[diagnostic(
        code(imxfuse::already_programmed),
        help("The MAC address fuses can only be programmed while they are all-zero.")
    )]
    AlreadyProgrammed(MacAddress),

    #[error("Fuse file {} holds {len} bytes, expected exactly 32", path.display())]
    #[diagnostic(
        code(imxfuse::invalid_fuse_file),
        help("Pass the SRK_1_2_3_4_fuse.bin file produced by the NXP code-signing tool")
    )]
    InvalidFuseFile { path: PathBuf, len: usize },

    #[error("'{0}' is not a valid MAC address")]
    #[diagnostic(
        code(imxfuse::invalid_mac),
        help("Expected six ':'-separated hex octets, e.g. 00:11:22:33:44:55")
    )]
    InvalidMacAddress(String),

    #[error("Operation was cancelled by the user")]
    #[diagnostic(code(imxfuse::cancelled))]
    Cancelled,

    #[cfg(feature = "cli")]
    #[error(transparent)]
    #[diagnostic(code(imxfuse::dialoguer_error))]
    DialoguerError(#[from] dialoguer::Error),
}
