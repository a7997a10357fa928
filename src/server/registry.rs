//! Client registry
//!
//! Tracks connected sessions so the server can enforce its client limit.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Registry for tracking active sessions
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, Instant>,
    max_clients: usize,
}

impl ClientRegistry {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// Registers `addr`, returning `false` when the registry is full.
    pub fn try_insert(&mut self, addr: SocketAddr) -> bool {
        if self.clients.len() >= self.max_clients {
            return false;
        }
        self.clients.insert(addr, Instant::now());
        true
    }

    /// Removes `addr` and returns how long it was connected.
    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Duration> {
        self.clients.remove(addr).map(|since| since.elapsed())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}
