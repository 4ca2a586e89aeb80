//! BOOT_CFGx fuse window codec.
//!
//! Only the subset of the boot-configuration fuses related to enabling
//! secure boot is handled.

use strum::{Display, EnumIter, EnumString};

use super::{Field, FuseWord};
use crate::{device::FuseDevice, error::Error};

/// Number of fuse words in the boot-configuration window.
pub const BOOT_CFG_WORD_COUNT: usize = 5;

const BOOT_CFG_WORDS: [FuseWord; BOOT_CFG_WORD_COUNT] = [
    FuseWord::BootCfg0,
    FuseWord::BootCfg1,
    FuseWord::BootCfg2,
    FuseWord::BootCfg3,
    FuseWord::BootCfg4,
];

/// Watchdog timeout in seconds for each 2-bit hardware encoding.
const WDOG_TIMEOUTS: [u32; 4] = [64, 32, 16, 8];

/// The boot-configuration fields handled by this codec.
///
/// All fields are single-bit flags except [`WatchdogTimeout`], which is
/// the 2-bit timeout encoding read and written through
/// [`BootConfig::watchdog`] and [`BootConfig::set_watchdog`].
///
/// [`WatchdogTimeout`]: BootConfigField::WatchdogTimeout
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum BootConfigField {
    /// SJC_DISABLE: disable the secure JTAG controller
    JtagDisable,
    /// SEC_CONFIG: close the device to unsigned boot images
    SecureConfig,
    /// DIR_BT_DIS: disable NXP-reserved boot modes
    ReservedModesDisable,
    /// BT_FUSE_SEL: boot from fuse settings rather than board straps
    BootFromFuses,
    /// WDOG_ENABLE: enable the boot watchdog
    WatchdogEnable,
    /// TZASC_ENABLE: enable the TrustZone address-space controller
    TzascEnable,
    /// WDOG_TIMEOUT: 2-bit watchdog timeout encoding
    WatchdogTimeout,
}

impl BootConfigField {
    pub(crate) const fn field(self) -> Field {
        match self {
            BootConfigField::JtagDisable => Field::new(0, 21, 1),
            BootConfigField::SecureConfig => Field::new(0, 25, 1),
            BootConfigField::ReservedModesDisable => Field::new(0, 27, 1),
            BootConfigField::BootFromFuses => Field::new(0, 28, 1),
            BootConfigField::WatchdogEnable => Field::new(1, 10, 1),
            BootConfigField::TzascEnable => Field::new(1, 11, 1),
            BootConfigField::WatchdogTimeout => Field::new(1, 16, 2),
        }
    }

    /// Whether this field is a single-bit boolean flag.
    pub fn is_flag(self) -> bool {
        self.field().bit_count == 1
    }
}

/// An in-memory image of the five BOOT_CFGx fuse words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    words: [u32; BOOT_CFG_WORD_COUNT],
}

impl BootConfig {
    /// Reads the BOOT_CFGx fuse words for processing.
    pub fn read(device: &mut FuseDevice) -> Result<Self, Error> {
        let mut words = [0u32; BOOT_CFG_WORD_COUNT];
        for (word, fuse) in words.iter_mut().zip(BOOT_CFG_WORDS) {
            *word = device.read_word(fuse)?;
        }
        Ok(Self { words })
    }

    /// Extracts the setting of a boolean boot-configuration fuse.
    pub fn flag(&self, field: BootConfigField) -> Result<bool, Error> {
        if !field.is_flag() {
            return Err(Error::InvalidArgument(format!(
                "{field} is not a boolean flag"
            )));
        }
        Ok(field.field().extract(&self.words) != 0)
    }

    /// Sets or clears a boolean boot-configuration fuse bit in memory.
    pub fn set_flag(&mut self, field: BootConfigField, value: bool) -> Result<(), Error> {
        if !field.is_flag() {
            return Err(Error::InvalidArgument(format!(
                "{field} is not a boolean flag"
            )));
        }
        field.field().insert(&mut self.words, value as u32);
        Ok(())
    }

    /// Returns the watchdog enable flag and its timeout in seconds.
    pub fn watchdog(&self) -> (bool, u32) {
        let enabled = BootConfigField::WatchdogEnable.field().extract(&self.words) != 0;
        let code = BootConfigField::WatchdogTimeout.field().extract(&self.words);
        (enabled, WDOG_TIMEOUTS[code as usize])
    }

    /// Sets the watchdog configuration in memory.
    ///
    /// A `timeout_secs` of 0 leaves the existing timeout encoding
    /// untouched; any other value must match one of the hardware
    /// encodings exactly.
    pub fn set_watchdog(&mut self, enabled: bool, timeout_secs: u32) -> Result<(), Error> {
        let code = if timeout_secs != 0 {
            Some(
                WDOG_TIMEOUTS
                    .iter()
                    .position(|&t| t == timeout_secs)
                    .ok_or_else(|| {
                        Error::InvalidArgument(format!(
                            "no watchdog timeout encoding for {timeout_secs} seconds"
                        ))
                    })?,
            )
        } else {
            None
        };
        self.set_flag(BootConfigField::WatchdogEnable, enabled)?;
        if let Some(code) = code {
            BootConfigField::WatchdogTimeout
                .field()
                .insert(&mut self.words, code as u32);
        }
        Ok(())
    }

    /// Writes back only the words whose value differs from what the
    /// fuses currently hold, in window order.
    pub fn update(&self, device: &mut FuseDevice) -> Result<(), Error> {
        let current = Self::read(device)?;
        for (i, fuse) in BOOT_CFG_WORDS.iter().enumerate() {
            if current.words[i] != self.words[i] {
                device.write_word(*fuse, self.words[i])?;
            }
        }
        Ok(())
    }

    /// The raw window contents.
    pub fn words(&self) -> &[u32; BOOT_CFG_WORD_COUNT] {
        &self.words
    }
}

impl From<[u32; BOOT_CFG_WORD_COUNT]> for BootConfig {
    fn from(words: [u32; BOOT_CFG_WORD_COUNT]) -> Self {
        Self { words }
    }
}
