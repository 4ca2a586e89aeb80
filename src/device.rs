//! Word-level access to the OCOTP fuse array through the nvmem interface
//! exported by the imx-ocotp driver.
//!
//! Every operation is a fresh absolute seek plus a 4-byte transfer; no
//! fuse state is ever cached between calls.

use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use log::{debug, trace};

use crate::{error::Error, fuses::FuseWord};

/// Default path of the OCOTP nvmem device.
pub const DEFAULT_DEVICE_PATH: &str = "/sys/bus/nvmem/devices/imx-ocotp0/nvmem";

const SOC_ID_PATH: &str = "/sys/devices/soc0/soc_id";
const SUPPORTED_SOC_ID: &str = "i.MX8MM";

/// An open handle to the fuse array.
///
/// The handle exclusively owns the underlying descriptor, which is
/// released when the handle is dropped.
#[derive(Debug)]
pub struct FuseDevice {
    file: File,
}

impl FuseDevice {
    /// Opens the OCOTP nvmem device at `path`, or at
    /// [`DEFAULT_DEVICE_PATH`] if no path is given.
    ///
    /// The SoC identity is checked before the device is touched, since
    /// the fuse map compiled into this crate is only valid for the
    /// i.MX8M Mini.
    pub fn open(path: Option<&Path>, readonly: bool) -> Result<Self, Error> {
        let soc_id = read_soc_id();
        if soc_id != SUPPORTED_SOC_ID {
            return Err(Error::IncompatiblePlatform(soc_id));
        }
        Self::open_image(path.unwrap_or_else(|| Path::new(DEFAULT_DEVICE_PATH)), readonly)
    }

    /// Opens an nvmem image captured from a target device.
    ///
    /// No SoC identity check is performed, so this also works on hosts
    /// other than the target itself.
    pub fn open_image(path: &Path, readonly: bool) -> Result<Self, Error> {
        debug!(
            "opening fuse device {} ({})",
            path.display(),
            if readonly { "read-only" } else { "read-write" }
        );
        let file = OpenOptions::new().read(true).write(!readonly).open(path)?;
        Ok(Self { file })
    }

    /// Reads a fuse word.
    pub fn read_word(&mut self, word: FuseWord) -> Result<u32, Error> {
        self.file.seek(SeekFrom::Start(word.offset()))?;
        let mut buf = [0u8; 4];
        self.file.read_exact(&mut buf)?;
        let value = u32::from_ne_bytes(buf);
        trace!("{word} -> {value:#010x}");
        Ok(value)
    }

    /// Writes a fuse word unconditionally.
    pub fn write_word(&mut self, word: FuseWord, value: u32) -> Result<(), Error> {
        debug!("{word} <- {value:#010x}");
        self.file.seek(SeekFrom::Start(word.offset()))?;
        self.file.write_all(&value.to_ne_bytes())?;
        Ok(())
    }

    /// Writes a fuse word only if the current value does not already
    /// match the desired value, avoiding redundant destructive fuse
    /// operations.
    pub fn update_word(&mut self, word: FuseWord, value: u32) -> Result<(), Error> {
        if self.read_word(word)? == value {
            trace!("{word} already holds {value:#010x}, skipping write");
            return Ok(());
        }
        self.write_word(word, value)
    }
}

fn read_soc_id() -> String {
    match fs::read_to_string(SOC_ID_PATH) {
        Ok(id) => id.trim_end_matches('\n').to_string(),
        Err(_) => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn scratch_image() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 0x100]).unwrap();
        file
    }

    #[test]
    fn word_roundtrip() {
        let image = scratch_image();
        let mut device = FuseDevice::open_image(image.path(), false).unwrap();

        device.write_word(FuseWord::Srk0, 0xdead_beef).unwrap();
        assert_eq!(device.read_word(FuseWord::Srk0).unwrap(), 0xdead_beef);
        // Neighbouring words are untouched.
        assert_eq!(device.read_word(FuseWord::Srk1).unwrap(), 0);
    }

    #[test]
    fn update_skips_matching_value() {
        let image = scratch_image();
        let mut device = FuseDevice::open_image(image.path(), false).unwrap();
        device.write_word(FuseWord::Gp10, 0x5a5a_5a5a).unwrap();
        drop(device);

        // A read-only handle can still "update" a word to its current
        // value: no write is issued at all. A real write through the
        // same handle fails, proving the skip.
        let mut device = FuseDevice::open_image(image.path(), true).unwrap();
        device.update_word(FuseWord::Gp10, 0x5a5a_5a5a).unwrap();
        assert!(device.update_word(FuseWord::Gp10, 0xffff_ffff).is_err());
    }

    #[test]
    fn open_image_missing_path_fails() {
        let err = FuseDevice::open_image(Path::new("/nonexistent/nvmem"), true).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
