//! Bitmap-based subnet address allocation.
//!
//! One JSON document maps each canonical subnet CIDR to a bitmap string of
//! `'0'`/`'1'` flags, one per host slot. The document is reloaded at the
//! start of every call and rewritten at the end; there is no long-lived
//! in-memory state. Concurrent invocations are therefore unsafe and must
//! be serialized by the caller.

use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use coracle_common::error::{CoracleError, Result};

use crate::cidr::Cidr;

/// Handle over the persisted subnet allocation document.
#[derive(Debug, Clone)]
pub struct IpAllocator {
    path: PathBuf,
}

impl IpAllocator {
    /// Creates an allocator backed by the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates an allocator backed by the default system document.
    #[must_use]
    pub fn system() -> Self {
        Self::new(coracle_common::constants::default_ipam_path())
    }

    /// Returns the path of the allocation document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocates the lowest free address in `subnet`.
    ///
    /// A subnet never seen before gets a fresh all-free bitmap. The first
    /// free bitmap index becomes the host offset; index 0 maps to the
    /// first usable host address (base + 1).
    ///
    /// # Errors
    ///
    /// Returns [`CoracleError::SubnetExhausted`] when every slot is taken,
    /// and I/O or serialization errors from the document itself.
    pub fn allocate(&self, subnet: &Cidr) -> Result<Ipv4Addr> {
        let mut subnets = self.load()?;
        let key = subnet.to_string();

        if !subnets.contains_key(&key) {
            let _ = subnets.insert(key.clone(), "0".repeat(subnet.capacity()));
            tracing::info!(subnet = %key, slots = subnet.capacity(), "initialized subnet bitmap");
        }

        // Uniqueness of the key was just ensured above.
        let bitmap = subnets.get_mut(&key).ok_or_else(|| CoracleError::NotFound {
            kind: "subnet",
            id: key.clone(),
        })?;

        let index = bitmap
            .bytes()
            .position(|flag| flag == b'0')
            .ok_or_else(|| CoracleError::SubnetExhausted {
                subnet: key.clone(),
            })?;

        // Single-byte splice; the bitmap is pure ASCII by construction.
        bitmap.replace_range(index..=index, "1");

        let ip = offset_to_address(subnet.network(), index);
        self.dump(&subnets)?;
        tracing::info!(subnet = %key, %ip, index, "address allocated");
        Ok(ip)
    }

    /// Returns a previously allocated address to `subnet`'s free pool.
    ///
    /// # Errors
    ///
    /// Returns [`CoracleError::NotFound`] if the subnet has no allocation
    /// record or the address lies outside its bitmap.
    pub fn release(&self, subnet: &Cidr, addr: Ipv4Addr) -> Result<()> {
        let mut subnets = self.load()?;
        let key = subnet.to_string();

        let bitmap = subnets.get_mut(&key).ok_or_else(|| CoracleError::NotFound {
            kind: "subnet",
            id: key.clone(),
        })?;

        let index = address_to_offset(subnet.network(), addr);
        if index >= bitmap.len() {
            return Err(CoracleError::NotFound {
                kind: "address",
                id: format!("{addr} in {key}"),
            });
        }

        // Single-byte splice; the bitmap is pure ASCII by construction.
        bitmap.replace_range(index..=index, "0");

        self.dump(&subnets)?;
        tracing::info!(subnet = %key, %addr, index, "address released");
        Ok(())
    }

    /// Loads the allocation document. A missing file is an empty map, not
    /// an error.
    fn load(&self) -> Result<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(CoracleError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Rewrites the whole allocation document, creating parent directories
    /// on first use.
    fn dump(&self, subnets: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CoracleError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let raw = serde_json::to_string(subnets)?;
        fs::write(&self.path, raw).map_err(|e| CoracleError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Computes the address for a bitmap index: each octet of the base gets the
/// corresponding byte of the index added (most significant first), then the
/// last octet gets the +1 host correction. Arithmetic wraps, matching
/// native fixed-width addition.
fn offset_to_address(base: Ipv4Addr, index: usize) -> Ipv4Addr {
    let mut octets = base.octets();
    for (i, octet) in octets.iter_mut().enumerate() {
        let shift = (3 - i) * 8;
        *octet = octet.wrapping_add(((index >> shift) & 0xff) as u8);
    }
    octets[3] = octets[3].wrapping_add(1);
    Ipv4Addr::from(octets)
}

/// Inverse of [`offset_to_address`]: undoes the +1 correction, subtracts the
/// base octet by octet, and recombines the differences positionally.
fn address_to_offset(base: Ipv4Addr, addr: Ipv4Addr) -> usize {
    let mut octets = addr.octets();
    octets[3] = octets[3].wrapping_sub(1);
    let base = base.octets();
    let mut index = 0usize;
    for i in 0..4 {
        let shift = (3 - i) * 8;
        index += usize::from(octets[i].wrapping_sub(base[i])) << shift;
    }
    index
}
