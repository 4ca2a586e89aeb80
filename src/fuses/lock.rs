//! LOCK fuse word codec.
//!
//! The lock word itself is read and written like any other fuse word;
//! the state codec here is pure bit manipulation on an in-memory copy.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::FuseWord;
use crate::{device::FuseDevice, error::Error};

/// The lockable fuse regions controlled by the LOCK word.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Lock {
    Tester,
    BootCfg,
    Srk,
    SjcResp,
    UsbId,
    MacAddr,
    ManufactureKey,
    Gp1,
    Gp2,
    Gp5,
}

impl Lock {
    const fn bit_start(self) -> u32 {
        match self {
            Lock::Tester => 0,
            Lock::BootCfg => 2,
            Lock::Srk => 9,
            Lock::SjcResp => 10,
            Lock::UsbId => 12,
            Lock::MacAddr => 14,
            Lock::ManufactureKey => 16,
            Lock::Gp1 => 20,
            Lock::Gp2 => 22,
            Lock::Gp5 => 24,
        }
    }

    /// Whether this lock is encoded as a single write-protect bit
    /// rather than a 2-bit protection field.
    pub const fn is_single_bit(self) -> bool {
        matches!(self, Lock::Srk | Lock::SjcResp | Lock::ManufactureKey)
    }
}

/// The protection state of a lock.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
pub enum LockState {
    /// No protection (1-bit and 2-bit locks)
    Unlocked,
    /// Write-protected (1-bit locks only)
    Locked,
    /// Further writes blocked (2-bit locks only)
    WriteProtect,
    /// Shadow-register overrides blocked (2-bit locks only)
    OverrideProtect,
    /// Both writes and overrides blocked (2-bit locks only)
    OverrideWriteProtect,
}

impl LockState {
    /// Hardware bit pattern for this state.
    const fn encoding(self) -> u32 {
        match self {
            LockState::Unlocked => 0b00,
            LockState::Locked | LockState::WriteProtect => 0b01,
            LockState::OverrideProtect => 0b10,
            LockState::OverrideWriteProtect => 0b11,
        }
    }

    /// True when moving from `self` to `to` would clear protection bits
    /// that are already programmed.
    ///
    /// Fuse bits cannot transition back to 0, so such a change can never
    /// take effect in hardware.
    pub fn relaxes(self, to: LockState) -> bool {
        self.encoding() & !to.encoding() != 0
    }
}

const TWO_BIT_STATES: [LockState; 4] = [
    LockState::Unlocked,
    LockState::WriteProtect,
    LockState::OverrideProtect,
    LockState::OverrideWriteProtect,
];

/// Gets the state of a lock from the LOCK fuse word.
pub fn lock_state(lock_word: u32, lock: Lock) -> LockState {
    if lock.is_single_bit() {
        if (lock_word >> lock.bit_start()) & 1 != 0 {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    } else {
        TWO_BIT_STATES[((lock_word >> lock.bit_start()) & 3) as usize]
    }
}

/// Updates the bits for a single lock in an in-memory LOCK word.
///
/// The requested bit change is performed unconditionally. Real fuses are
/// one-time programmable: once a lock bit is set, asking the hardware to
/// clear it cannot succeed. Enforcing that is left to the caller, which
/// may legitimately be composing a desired lock word from scratch; see
/// [`LockState::relaxes`].
pub fn set_lock_state(lock: Lock, state: LockState, lock_word: &mut u32) -> Result<(), Error> {
    if lock.is_single_bit() {
        let mask = 1u32 << lock.bit_start();
        match state {
            LockState::Unlocked => *lock_word &= !mask,
            LockState::Locked => *lock_word |= mask,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "{state} is not valid for the 1-bit {lock} lock"
                )))
            }
        }
    } else {
        if state == LockState::Locked {
            return Err(Error::InvalidArgument(format!(
                "{state} is not valid for the 2-bit {lock} lock"
            )));
        }
        let mask = 0b11u32 << lock.bit_start();
        *lock_word = (*lock_word & !mask) | (state.encoding() << lock.bit_start());
    }
    Ok(())
}

/// Reads the LOCK word.
pub fn read_locks(device: &mut FuseDevice) -> Result<u32, Error> {
    device.read_word(FuseWord::Lock)
}

/// Updates the LOCK word, skipping the write if nothing changed.
pub fn update_locks(device: &mut FuseDevice, lock_word: u32) -> Result<(), Error> {
    device.update_word(FuseWord::Lock, lock_word)
}
