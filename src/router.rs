use crate::ip::datagram::Ipv4Datagram;
use crate::link::interface::NetworkInterface;
use std::collections::HashMap;
use std::net::Ipv4Addr;

#[derive(Debug, Clone)]
struct Route {
    next_hop: Option<Ipv4Addr>, // None when the network is directly attached
    interface_idx: usize,
}

/// An IPv4 router: a longest-prefix-match routing table over a set of
/// network interfaces.
///
/// Routes live in one table slot per prefix length, so matching walks from
/// /32 down to /0 and the first hit wins.
#[derive(Debug)]
pub struct Router {
    interfaces: Vec<NetworkInterface>,
    routing_table: [HashMap<u32, Route>; 33], // Indexed by prefix length
}

impl Router {
    pub fn new() -> Self {
        Router {
            interfaces: Vec::new(),
            routing_table: std::array::from_fn(|_| HashMap::new()),
        }
    }

    /// Attach an interface and return its index for use in routes
    pub fn add_interface(&mut self, interface: NetworkInterface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    pub fn interface_mut(&mut self, idx: usize) -> &mut NetworkInterface {
        &mut self.interfaces[idx]
    }

    /// Add a route for `prefix`/`prefix_length` via `interface_idx`.
    /// A route without a next hop delivers to the destination directly.
    pub fn add_route(
        &mut self,
        prefix: Ipv4Addr,
        prefix_length: u8,
        next_hop: Option<Ipv4Addr>,
        interface_idx: usize,
    ) {
        self.routing_table[prefix_length as usize].insert(
            u32::from(prefix),
            Route {
                next_hop,
                interface_idx,
            },
        );
    }

    /// Drain every interface's inbound queue and route each datagram
    pub fn route(&mut self) {
        for i in 0..self.interfaces.len() {
            loop {
                let dgram = match self.interfaces[i].datagrams_received_mut().pop_front() {
                    Some(dgram) => dgram,
                    None => break,
                };
                self.route_one_datagram(dgram);
            }
        }
    }

    /// Find the longest matching prefix and forward. Datagrams that match
    /// nothing, or whose TTL is spent, are dropped without ceremony.
    pub fn route_one_datagram(&mut self, mut dgram: Ipv4Datagram) {
        let dst = u32::from(dgram.header.dst_ip);

        for prefix_length in (0..=32u32).rev() {
            let mask = if prefix_length == 0 {
                0
            } else {
                u32::MAX << (32 - prefix_length)
            };

            let route = match self.routing_table[prefix_length as usize].get(&(dst & mask)) {
                Some(route) => route.clone(),
                None => continue,
            };

            // Only a forwarded datagram spends TTL; one that would hit
            // zero is dropped instead
            if dgram.header.ttl <= 1 {
                return;
            }
            dgram.header.ttl -= 1;

            let next_hop = route.next_hop.unwrap_or(dgram.header.dst_ip);
            self.interfaces[route.interface_idx].send_datagram(dgram, next_hop);
            return;
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// -- Unit tests --
