//! Octet-wise IPv4 address editing.
//!
//! Backs the "pick an address with up/down arrows" widget of the console and
//! the `--hosts` stepping of the ping command. Input that does not describe
//! exactly four octets in `0..=255` is rejected up front with a
//! [`ValidationError`]; once constructed, stepping can only fail on a bad
//! octet index.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::ValidationError;

pub const OCTETS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressStepper {
    octets: [u8; OCTETS],
}

impl AddressStepper {
    /// Validates raw octet values before any stepping happens.
    pub fn new(values: &[i64]) -> Result<Self, ValidationError> {
        if values.len() != OCTETS {
            return Err(ValidationError::OctetCount(values.len()));
        }

        let mut octets = [0u8; OCTETS];
        for (index, (slot, &value)) in octets.iter_mut().zip(values).enumerate() {
            *slot = u8::try_from(value)
                .map_err(|_| ValidationError::OctetOutOfRange { index, value })?;
        }
        Ok(Self { octets })
    }

    /// Raises one octet by one, wrapping from 255 to 0.
    pub fn increment(&mut self, index: usize) -> Result<(), ValidationError> {
        let octet = self.octet_mut(index)?;
        *octet = octet.wrapping_add(1);
        Ok(())
    }

    /// Lowers one octet by one, wrapping from 0 to 255.
    pub fn decrement(&mut self, index: usize) -> Result<(), ValidationError> {
        let octet = self.octet_mut(index)?;
        *octet = octet.wrapping_sub(1);
        Ok(())
    }

    pub fn address(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.octets)
    }

    /// Zero-padded form used by the picker, e.g. `192.168.000.001`.
    pub fn padded(&self) -> String {
        let [a, b, c, d] = self.octets;
        format!("{a:03}.{b:03}.{c:03}.{d:03}")
    }

    fn octet_mut(&mut self, index: usize) -> Result<&mut u8, ValidationError> {
        self.octets
            .get_mut(index)
            .ok_or(ValidationError::OctetIndex(index))
    }
}

impl From<Ipv4Addr> for AddressStepper {
    fn from(addr: Ipv4Addr) -> Self {
        Self {
            octets: addr.octets(),
        }
    }
}

impl FromStr for AddressStepper {
    type Err = ValidationError;

    /// Parses dotted input, reporting which octet is wrong rather than a
    /// generic "invalid address".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != OCTETS {
            return Err(ValidationError::OctetCount(parts.len()));
        }

        let mut values = Vec::with_capacity(OCTETS);
        for (index, part) in parts.iter().enumerate() {
            let value: i64 = part
                .parse()
                .map_err(|_| ValidationError::OctetOutOfRange { index, value: -1 })?;
            values.push(value);
        }
        Self::new(&values)
    }
}

impl fmt::Display for AddressStepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}
