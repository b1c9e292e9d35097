//! Address allocation over a fixed virtual IPv4 network.
//!
//! Addresses here are opaque allocation tokens drawn from a CIDR block, not
//! real network identities. The pool scans the block in ascending numeric
//! order on every allocation, so the nth allocated address is deterministic
//! for a given network and a freed address is always the next one reused.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Failure to interpret a CIDR string such as `192.168.1.0/24`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkParseError {
    #[error("expected CIDR notation 'a.b.c.d/prefix', got '{0}'")]
    MissingPrefix(String),
    #[error("invalid IPv4 address '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length '{0}' (must be 0-32)")]
    InvalidPrefix(String),
}

/// An IPv4 network identified by its masked base address and prefix length.
///
/// Host enumeration follows the usual CIDR conventions: for prefixes up to
/// /30 the network and broadcast addresses are excluded; /31 and /32 blocks
/// have no such reserved addresses and every member is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Network {
    network: u32,
    prefix: u8,
}

impl Ipv4Network {
    /// Creates a network from a base address and prefix length. Host bits in
    /// the base address are masked off.
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, NetworkParseError> {
        if prefix > 32 {
            return Err(NetworkParseError::InvalidPrefix(prefix.to_string()));
        }
        let mask = match prefix {
            0 => 0,
            _ => u32::MAX << (32 - prefix),
        };
        Ok(Self {
            network: u32::from(addr) & mask,
            prefix,
        })
    }

    fn first_host(&self) -> u32 {
        if self.prefix >= 31 {
            self.network
        } else {
            self.network + 1
        }
    }

    fn last_host(&self) -> u32 {
        let span = 1u64 << (32 - self.prefix as u64);
        let broadcast = self.network + (span - 1) as u32;
        if self.prefix >= 31 {
            broadcast
        } else {
            broadcast - 1
        }
    }

    /// Number of allocatable host addresses in this network.
    pub fn host_count(&self) -> u64 {
        u64::from(self.last_host()) - u64::from(self.first_host()) + 1
    }

    /// Iterates over every usable host address in ascending numeric order.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        (self.first_host()..=self.last_host()).map(Ipv4Addr::from)
    }
}

impl FromStr for Ipv4Network {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| NetworkParseError::MissingPrefix(s.to_string()))?;
        let addr: Ipv4Addr = addr_str
            .parse()
            .map_err(|_| NetworkParseError::InvalidAddress(addr_str.to_string()))?;
        let prefix: u8 = prefix_str
            .parse()
            .map_err(|_| NetworkParseError::InvalidPrefix(prefix_str.to_string()))?;
        Self::new(addr, prefix)
    }
}

/// Allocation failures. Exhaustion is a normal capacity-limit condition, not
/// a fault; `NotAllocated` indicates a caller logic error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("no unallocated address remains in the pool")]
    Exhausted,
    #[error("address {0} is not currently allocated")]
    NotAllocated(Ipv4Addr),
}

/// Tracks which addresses of a fixed network are currently handed out.
///
/// The allocated set is ordered, so snapshots of it come back sorted and the
/// allocation scan is reproducible across runs.
#[derive(Debug)]
pub struct AddressPool {
    network: Ipv4Network,
    allocated: BTreeSet<Ipv4Addr>,
}

impl AddressPool {
    pub fn new(network: Ipv4Network) -> Self {
        Self {
            network,
            allocated: BTreeSet::new(),
        }
    }

    /// Claims the first unallocated address in enumeration order.
    ///
    /// Insertion into the allocated set happens in the same `&mut self` step
    /// as the scan, so no two calls can ever return the same live address.
    pub fn allocate(&mut self) -> Result<Ipv4Addr, PoolError> {
        for addr in self.network.hosts() {
            if !self.allocated.contains(&addr) {
                self.allocated.insert(addr);
                return Ok(addr);
            }
        }
        Err(PoolError::Exhausted)
    }

    /// Returns an address to the pool.
    pub fn release(&mut self, addr: Ipv4Addr) -> Result<(), PoolError> {
        if self.allocated.remove(&addr) {
            Ok(())
        } else {
            Err(PoolError::NotAllocated(addr))
        }
    }

    /// Total number of addresses this pool can hand out.
    pub fn capacity(&self) -> u64 {
        self.network.host_count()
    }

    /// Number of addresses currently handed out.
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    /// Currently allocated addresses in ascending order.
    pub fn allocated(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.allocated.iter().copied()
    }
}
