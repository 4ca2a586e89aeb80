//! MAC address fuses.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use super::FuseWord;
use crate::{device::FuseDevice, error::Error};

/// A MAC address held in the MAC_ADDR0/1 fuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Reads the MAC address fuses.
    pub fn read(device: &mut FuseDevice) -> Result<Self, Error> {
        let mac0 = device.read_word(FuseWord::MacAddr0)?;
        let mac1 = device.read_word(FuseWord::MacAddr1)?;
        Ok(Self::unpack(mac0, mac1))
    }

    /// Blows the MAC_ADDR0/1 fuses.
    ///
    /// The fuses must be completely unprogrammed, unless they already
    /// hold the desired address, in which case nothing is written.
    pub fn program(&self, device: &mut FuseDevice) -> Result<(), Error> {
        let current = Self::read(device)?;
        if current == *self {
            return Ok(());
        }
        if !current.is_zero() {
            return Err(Error::AlreadyProgrammed(current));
        }
        let (mac0, mac1) = self.pack();
        device.write_word(FuseWord::MacAddr0, mac0)?;
        device.write_word(FuseWord::MacAddr1, mac1)
    }

    /// Whether all six octets are zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 6]
    }

    /// The address octets, in transmission order.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    fn unpack(mac0: u32, mac1: u32) -> Self {
        Self([
            (mac1 >> 8) as u8,
            mac1 as u8,
            (mac0 >> 24) as u8,
            (mac0 >> 16) as u8,
            (mac0 >> 8) as u8,
            mac0 as u8,
        ])
    }

    fn pack(&self) -> (u32, u32) {
        let [a, b, c, d, e, f] = self.0;
        let mac1 = (a as u32) << 8 | b as u32;
        let mac0 = (c as u32) << 24 | (d as u32) << 16 | (e as u32) << 8 | f as u32;
        (mac0, mac1)
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(Error::InvalidMacAddress(s.to_string()));
        }
        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts) {
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidMacAddress(s.to_string()))?;
        }
        Ok(Self(octets))
    }
}
