//! Fuse map and field primitives for the i.MX8M Mini OCOTP block.

use strum::{Display, EnumIter, EnumString, VariantNames};

pub mod bootcfg;
pub mod lock;
pub mod mac;
pub mod srk;

/// The named fuse words of the i.MX8M Mini OCOTP block.
///
/// Each word is 32 bits wide and lives at a fixed byte offset within the
/// nvmem file exported by the imx-ocotp driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, VariantNames)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum FuseWord {
    Lock,
    Tester0,
    Tester1,
    Tester3,
    Tester4,
    Tester5,
    BootCfg0,
    BootCfg1,
    BootCfg2,
    BootCfg3,
    BootCfg4,
    Srk0,
    Srk1,
    Srk2,
    Srk3,
    Srk4,
    Srk5,
    Srk6,
    Srk7,
    SjcResp0,
    SjcResp1,
    UsbId,
    FieldReturn,
    MacAddr0,
    MacAddr1,
    MacAddr2,
    SrkRevoke,
    Gp10,
    Gp11,
    Gp20,
    Gp21,
}

impl FuseWord {
    /// Byte offset of this word within the nvmem file.
    pub const fn offset(self) -> u64 {
        match self {
            FuseWord::Lock => 0x00,
            FuseWord::Tester0 => 0x04,
            FuseWord::Tester1 => 0x08,
            FuseWord::Tester3 => 0x10,
            FuseWord::Tester4 => 0x14,
            FuseWord::Tester5 => 0x18,
            FuseWord::BootCfg0 => 0x1c,
            FuseWord::BootCfg1 => 0x20,
            FuseWord::BootCfg2 => 0x24,
            FuseWord::BootCfg3 => 0x28,
            FuseWord::BootCfg4 => 0x2c,
            FuseWord::Srk0 => 0x60,
            FuseWord::Srk1 => 0x64,
            FuseWord::Srk2 => 0x68,
            FuseWord::Srk3 => 0x6c,
            FuseWord::Srk4 => 0x70,
            FuseWord::Srk5 => 0x74,
            FuseWord::Srk6 => 0x78,
            FuseWord::Srk7 => 0x7c,
            FuseWord::SjcResp0 => 0x80,
            FuseWord::SjcResp1 => 0x84,
            FuseWord::UsbId => 0x88,
            FuseWord::FieldReturn => 0x8c,
            FuseWord::MacAddr0 => 0x90,
            FuseWord::MacAddr1 => 0x94,
            FuseWord::MacAddr2 => 0x98,
            FuseWord::SrkRevoke => 0x9c,
            FuseWord::Gp10 => 0xe0,
            FuseWord::Gp11 => 0xe4,
            FuseWord::Gp20 => 0xe8,
            FuseWord::Gp21 => 0xec,
        }
    }
}

/// A bit field at a fixed position within a group of fuse words.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    /// Index of the word the field lives in.
    pub(crate) word: usize,
    /// Bit offset of the start of the field.
    pub(crate) bit_start: u32,
    /// Bit width of the field.
    pub(crate) bit_count: u32,
}

impl Field {
    /// Creates a new field definition.
    pub(crate) const fn new(word: usize, bit_start: u32, bit_count: u32) -> Self {
        Self {
            word,
            bit_start,
            bit_count,
        }
    }

    const fn mask(self) -> u32 {
        (((1u64 << self.bit_count) - 1) as u32) << self.bit_start
    }

    /// Extracts the field value from `words`.
    pub(crate) fn extract(self, words: &[u32]) -> u32 {
        (words[self.word] & self.mask()) >> self.bit_start
    }

    /// Replaces the field value in `words`, leaving all other bits
    /// untouched.
    pub(crate) fn insert(self, words: &mut [u32], value: u32) {
        words[self.word] =
            (words[self.word] & !self.mask()) | ((value << self.bit_start) & self.mask());
    }
}
