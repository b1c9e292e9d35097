//! Host registry: the single shared piece of mutable server state.
//!
//! The registry owns the address pool and the address-to-host map and keeps
//! them moving in lockstep: every allocated address has exactly one live
//! host and vice versa. Sessions reach it through `Arc<RwLock<...>>`, so
//! create/destroy/list operations are serialized and a concurrent reader
//! never observes a half-completed destroy.

use crate::host::Host;
use crate::pool::{AddressPool, Ipv4Network};
use log::info;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Registry-level failures, both recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Every address in the pool is taken. Sessions stay connected but
    /// cannot run file commands.
    #[error("no host available: the virtual network is full")]
    NoCapacity,
    #[error("no host is registered at {0}")]
    NotFound(Ipv4Addr),
}

/// Creates and destroys hosts, pairing each with a pool address.
#[derive(Debug)]
pub struct HostRegistry {
    pool: AddressPool,
    hosts: HashMap<Ipv4Addr, Host>,
}

impl HostRegistry {
    /// Creates an empty registry allocating from the given network.
    pub fn new(network: Ipv4Network) -> Self {
        Self {
            pool: AddressPool::new(network),
            hosts: HashMap::new(),
        }
    }

    /// Allocates an address and registers a fresh empty host on it.
    pub fn create_host(&mut self) -> Result<Ipv4Addr, RegistryError> {
        let addr = self.pool.allocate().map_err(|_| RegistryError::NoCapacity)?;
        self.hosts.insert(addr, Host::new(addr));
        info!(
            "Host {} created ({}/{} addresses allocated)",
            addr,
            self.pool.allocated_count(),
            self.pool.capacity()
        );
        Ok(addr)
    }

    /// Removes the host at `addr` and returns its address to the pool.
    ///
    /// Both updates happen under the same `&mut self`, so other registry
    /// users see either the state before or fully after the removal.
    pub fn destroy_host(&mut self, addr: Ipv4Addr) -> Result<(), RegistryError> {
        if self.hosts.remove(&addr).is_none() {
            return Err(RegistryError::NotFound(addr));
        }
        // The host map and the pool move in lockstep; a host entry implies
        // the address is allocated.
        self.pool
            .release(addr)
            .map_err(|_| RegistryError::NotFound(addr))?;
        info!("Host {} destroyed", addr);
        Ok(())
    }

    /// Point-in-time snapshot of allocated addresses, in ascending order.
    pub fn list_addresses(&self) -> Vec<Ipv4Addr> {
        self.pool.allocated().collect()
    }

    pub fn host(&self, addr: Ipv4Addr) -> Option<&Host> {
        self.hosts.get(&addr)
    }

    pub fn host_mut(&mut self, addr: Ipv4Addr) -> Option<&mut Host> {
        self.hosts.get_mut(&addr)
    }

    /// Number of currently live hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Total number of addresses the underlying pool can hand out.
    pub fn capacity(&self) -> u64 {
        self.pool.capacity()
    }
}
