//! SRK (Super Root Key) hash fuses.

use std::fmt::{self, Display, Formatter};

use super::FuseWord;
use crate::{device::FuseDevice, error::Error};

/// Number of fuse words holding the SRK hash.
pub const SRK_WORD_COUNT: usize = 8;

// The SRK fuses happen to be contiguous, but they are still addressed
// individually in case a future fuse map is not.
const SRK_WORDS: [FuseWord; SRK_WORD_COUNT] = [
    FuseWord::Srk0,
    FuseWord::Srk1,
    FuseWord::Srk2,
    FuseWord::Srk3,
    FuseWord::Srk4,
    FuseWord::Srk5,
    FuseWord::Srk6,
    FuseWord::Srk7,
];

/// The 256-bit root-of-trust hash held in the SRK fuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrkHash([u32; SRK_WORD_COUNT]);

impl SrkHash {
    /// Reads the SRK fuses.
    pub fn read(device: &mut FuseDevice) -> Result<Self, Error> {
        let mut words = [0u32; SRK_WORD_COUNT];
        for (word, fuse) in words.iter_mut().zip(SRK_WORDS) {
            *word = device.read_word(fuse)?;
        }
        Ok(Self(words))
    }

    /// Blows the SRK fuses to match this hash.
    ///
    /// Every word that is currently non-zero must already hold its
    /// desired value; anything else is refused before a single fuse is
    /// touched. Words that already match are skipped.
    pub fn program(&self, device: &mut FuseDevice) -> Result<(), Error> {
        let current = Self::read(device)?;
        for (i, fuse) in SRK_WORDS.iter().enumerate() {
            if current.0[i] != 0 && current.0[i] != self.0[i] {
                return Err(Error::WriteConflict {
                    word: *fuse,
                    current: current.0[i],
                    desired: self.0[i],
                });
            }
        }
        for (i, fuse) in SRK_WORDS.iter().enumerate() {
            if current.0[i] != self.0[i] {
                device.write_word(*fuse, self.0[i])?;
            }
        }
        Ok(())
    }

    /// Whether any SRK fuse word has been programmed.
    pub fn is_programmed(&self) -> bool {
        self.0.iter().any(|&word| word != 0)
    }

    /// Reinterprets the 32-byte contents of an SRK fuse file as hash
    /// words, in host byte order.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytemuck::cast(bytes))
    }

    /// The raw hash words.
    pub fn words(&self) -> &[u32; SRK_WORD_COUNT] {
        &self.0
    }
}

impl From<[u32; SRK_WORD_COUNT]> for SrkHash {
    fn from(words: [u32; SRK_WORD_COUNT]) -> Self {
        Self(words)
    }
}

impl Display for SrkHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, word) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{word:08x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn image_with_srk(words: &[(usize, u32)]) -> tempfile::NamedTempFile {
        let mut image = tempfile::NamedTempFile::new().unwrap();
        let mut contents = [0u8; 0x100];
        for &(index, value) in words {
            let offset = SRK_WORDS[index].offset() as usize;
            contents[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
        }
        image.write_all(&contents).unwrap();
        image
    }

    #[test]
    fn program_merges_into_partially_programmed_fuses() {
        let image = image_with_srk(&[(0, 0xaaaa_0001)]);
        let mut device = FuseDevice::open_image(image.path(), false).unwrap();

        let desired = SrkHash::from([0xaaaa_0001, 2, 3, 4, 5, 6, 7, 8]);
        desired.program(&mut device).unwrap();
        assert_eq!(SrkHash::read(&mut device).unwrap(), desired);
    }

    #[test]
    fn program_conflict_writes_nothing() {
        let image = image_with_srk(&[(3, 0xdead_beef)]);
        let mut device = FuseDevice::open_image(image.path(), false).unwrap();

        let before = SrkHash::read(&mut device).unwrap();
        let desired = SrkHash::from([1, 2, 3, 4, 5, 6, 7, 8]);
        let err = desired.program(&mut device).unwrap_err();
        assert!(matches!(
            err,
            Error::WriteConflict {
                word: FuseWord::Srk3,
                current: 0xdead_beef,
                desired: 4,
            }
        ));
        // Every word is untouched, including the ones that were zero and
        // could have been written.
        assert_eq!(SrkHash::read(&mut device).unwrap(), before);
    }

    #[test]
    fn program_is_idempotent() {
        let image = image_with_srk(&[]);
        let mut device = FuseDevice::open_image(image.path(), false).unwrap();
        let desired = SrkHash::from([9, 8, 7, 6, 5, 4, 3, 2]);
        desired.program(&mut device).unwrap();
        drop(device);

        // Re-programming the same hash issues no writes, which a
        // read-only handle can prove.
        let mut device = FuseDevice::open_image(image.path(), true).unwrap();
        desired.program(&mut device).unwrap();
    }

    #[test]
    fn from_bytes_uses_host_byte_order() {
        let mut bytes = [0u8; 32];
        bytes[0..4].copy_from_slice(&0x1122_3344u32.to_ne_bytes());
        bytes[28..32].copy_from_slice(&0x5566_7788u32.to_ne_bytes());

        let hash = SrkHash::from_bytes(bytes);
        assert_eq!(hash.words()[0], 0x1122_3344);
        assert_eq!(hash.words()[7], 0x5566_7788);
        assert!(hash.is_programmed());
    }

    #[test]
    fn display_is_eight_hex_words() {
        let hash = SrkHash::from([0, 1, 2, 3, 4, 5, 6, 0xffff_ffff]);
        assert_eq!(
            hash.to_string(),
            "00000000 00000001 00000002 00000003 00000004 00000005 00000006 ffffffff"
        );
    }
}
