//! IPv4 CIDR parsing and canonicalization.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use coracle_common::error::CoracleError;

/// An IPv4 subnet in CIDR notation.
///
/// Construction always canonicalizes: host bits of the given address are
/// masked off, so `172.17.0.5/24` and `172.17.0.0/24` name the same subnet
/// and render identically. The canonical rendering is the key of the
/// allocation document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Cidr {
    /// Creates a canonical CIDR from an address and prefix length.
    ///
    /// # Errors
    ///
    /// Returns an error if `prefix_len` exceeds 32, or is shorter than
    /// `/2`: the allocation bitmap holds one byte per host slot, so a
    /// `/0` or `/1` subnet could never be materialized (and its slot
    /// count would not even fit `usize` on 32-bit targets).
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> coracle_common::error::Result<Self> {
        if prefix_len > 32 {
            return Err(CoracleError::Config {
                message: format!("invalid prefix length /{prefix_len}"),
            });
        }
        if prefix_len < 2 {
            return Err(CoracleError::Config {
                message: format!("prefix length /{prefix_len} is too short to manage"),
            });
        }
        let mask = u32::MAX << (32 - u32::from(prefix_len));
        Ok(Self {
            network: Ipv4Addr::from(u32::from(addr) & mask),
            prefix_len,
        })
    }

    /// Returns the network base address.
    #[must_use]
    pub const fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of host slots in this subnet: `2^(32 - prefix_len)`.
    ///
    /// Always fits `usize`, since construction rejects prefixes shorter
    /// than `/2`.
    #[must_use]
    pub fn capacity(&self) -> usize {
        1usize << (32 - u32::from(self.prefix_len))
    }
}

impl FromStr for Cidr {
    type Err = CoracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, len_part) = s.split_once('/').ok_or_else(|| CoracleError::Config {
            message: format!("invalid CIDR (missing '/'): {s}"),
        })?;
        let addr: Ipv4Addr = addr_part.parse().map_err(|_| CoracleError::Config {
            message: format!("invalid IPv4 address in CIDR: {s}"),
        })?;
        let prefix_len: u8 = len_part.parse().map_err(|_| CoracleError::Config {
            message: format!("invalid prefix length in CIDR: {s}"),
        })?;
        Self::new(addr, prefix_len)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_canonicalizes_host_bits() {
        let cidr: Cidr = "172.17.0.5/24".parse().expect("parse");
        assert_eq!(cidr.network(), Ipv4Addr::new(172, 17, 0, 0));
        assert_eq!(cidr.to_string(), "172.17.0.0/24");
    }

    #[test]
    fn capacity_counts_host_slots() {
        let cidr: Cidr = "10.0.0.0/24".parse().expect("parse");
        assert_eq!(cidr.capacity(), 256);
        let cidr: Cidr = "10.0.0.0/28".parse().expect("parse");
        assert_eq!(cidr.capacity(), 16);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("10.0.0.0".parse::<Cidr>().is_err());
        assert!("10.0.0/24".parse::<Cidr>().is_err());
        assert!("10.0.0.0/33".parse::<Cidr>().is_err());
        assert!("10.0.0.0/x".parse::<Cidr>().is_err());
    }

    #[test]
    fn rejects_unmaterializable_prefixes() {
        assert!("0.0.0.0/0".parse::<Cidr>().is_err());
        assert!("128.0.0.0/1".parse::<Cidr>().is_err());
        let cidr: Cidr = "192.0.0.0/2".parse().expect("parse");
        assert_eq!(cidr.capacity(), 1usize << 30);
    }
}
