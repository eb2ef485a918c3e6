use crate::ip::datagram::Ipv4Datagram;
use crate::link::arp::{ArpMessage, OPCODE_REPLY, OPCODE_REQUEST};
use crate::link::ethernet::{
    EthernetAddress, EthernetFrame, EthernetHeader, ETHERNET_BROADCAST, ETHERNET_ZERO, TYPE_ARP,
    TYPE_IPV4,
};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

/// How long to wait before re-broadcasting an unanswered ARP request, in ms
pub const ARP_WAIT_TIME: u64 = 5000;
/// How long a learned ARP mapping stays valid, in ms
pub const ARP_STALE_TIME: u64 = 30000;

#[derive(Debug, Clone, Copy)]
struct ArpEntry {
    ethernet: EthernetAddress,
    reachable: bool, // false while the ARP request is still unanswered
    expire_time: u64,
}

/// A network interface that connects IP with Ethernet.
///
/// Outbound datagrams are wrapped in Ethernet frames once the next hop's
/// hardware address is known, resolving it over ARP when it is not.
/// Datagrams waiting on a resolution are queued per next hop and flushed,
/// in order, when the reply comes in. Inbound frames are filtered by
/// destination address and demultiplexed by EtherType.
#[derive(Debug)]
pub struct NetworkInterface {
    ethernet_address: EthernetAddress,
    ip_address: Ipv4Addr,
    current_time: u64, // ms since construction, advanced by tick
    frames_out: VecDeque<EthernetFrame>,
    datagrams_received: VecDeque<Ipv4Datagram>,
    pending_datagrams: HashMap<u32, VecDeque<Ipv4Datagram>>, // Keyed by next-hop IP
    arp_table: HashMap<u32, ArpEntry>,
}

impl NetworkInterface {
    pub fn new(ethernet_address: EthernetAddress, ip_address: Ipv4Addr) -> Self {
        NetworkInterface {
            ethernet_address,
            ip_address,
            current_time: 0,
            frames_out: VecDeque::new(),
            datagrams_received: VecDeque::new(),
            pending_datagrams: HashMap::new(),
            arp_table: HashMap::new(),
        }
    }

    pub fn ethernet_address(&self) -> EthernetAddress {
        self.ethernet_address
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.ip_address
    }

    /// Send `dgram` toward `next_hop`, resolving its hardware address first
    /// if necessary. Unresolved datagrams wait in a per-hop queue; at most
    /// one ARP request per hop goes out every `ARP_WAIT_TIME` ms.
    pub fn send_datagram(&mut self, dgram: Ipv4Datagram, next_hop: Ipv4Addr) {
        let next_hop_ip = u32::from(next_hop);

        match self.arp_table.get(&next_hop_ip).copied() {
            None => {
                self.pending_datagrams
                    .entry(next_hop_ip)
                    .or_default()
                    .push_back(dgram);
                self.send_arp_message(OPCODE_REQUEST, next_hop_ip, ETHERNET_ZERO);
                self.arp_table.insert(
                    next_hop_ip,
                    ArpEntry {
                        ethernet: ETHERNET_ZERO,
                        reachable: false,
                        expire_time: self.current_time + ARP_WAIT_TIME,
                    },
                );
            }
            Some(entry) if !entry.reachable => {
                self.pending_datagrams
                    .entry(next_hop_ip)
                    .or_default()
                    .push_back(dgram);

                // Re-request only once the previous request has gone stale
                if self.current_time >= entry.expire_time {
                    self.send_arp_message(OPCODE_REQUEST, next_hop_ip, ETHERNET_ZERO);
                    if let Some(entry) = self.arp_table.get_mut(&next_hop_ip) {
                        entry.expire_time = self.current_time + ARP_WAIT_TIME;
                    }
                }
            }
            Some(entry) => self.send_ipv4_datagram(dgram, entry.ethernet),
        }
    }

    /// Accept an inbound Ethernet frame. IPv4 payloads are returned to the
    /// caller; ARP payloads update the table, answer requests, and flush any
    /// datagrams that were waiting on the sender's address.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) -> Option<Ipv4Datagram> {
        if frame.header.dst != self.ethernet_address && frame.header.dst != ETHERNET_BROADCAST {
            return None;
        }

        if frame.header.ethertype == TYPE_IPV4 {
            return Ipv4Datagram::parse(&frame.payload).ok();
        }

        if frame.header.ethertype == TYPE_ARP {
            if let Ok(msg) = ArpMessage::parse(&frame.payload) {
                let sender_ip = u32::from(msg.sender_ip);

                // Learn only if we are the target or the sender is already known
                if msg.target_ip == self.ip_address || self.arp_table.contains_key(&sender_ip) {
                    self.arp_table.insert(
                        sender_ip,
                        ArpEntry {
                            ethernet: msg.sender_ethernet,
                            reachable: true,
                            expire_time: self.current_time + ARP_STALE_TIME,
                        },
                    );

                    if msg.opcode == OPCODE_REQUEST {
                        self.send_arp_message(OPCODE_REPLY, sender_ip, msg.sender_ethernet);
                    }

                    // The sender is resolvable now; release its queue in order
                    if let Some(mut queue) = self.pending_datagrams.remove(&sender_ip) {
                        for dgram in queue.drain(..) {
                            self.send_ipv4_datagram(dgram, msg.sender_ethernet);
                        }
                    }
                }
            }
        }

        None
    }

    /// `recv_frame`, but IPv4 datagrams land on the inbound queue for a
    /// router to drain instead of being handed back
    pub fn recv_frame_queued(&mut self, frame: &EthernetFrame) {
        if let Some(dgram) = self.recv_frame(frame) {
            self.datagrams_received.push_back(dgram);
        }
    }

    /// Advance the clock and evict expired ARP entries, both stale learned
    /// mappings and requests that were never answered
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        self.current_time += ms_since_last_tick;

        let now = self.current_time;
        self.arp_table.retain(|_, entry| now < entry.expire_time);
    }

    /// Outbound Ethernet frames awaiting transmission
    pub fn frames_out_mut(&mut self) -> &mut VecDeque<EthernetFrame> {
        &mut self.frames_out
    }

    /// Inbound IPv4 datagrams awaiting routing
    pub fn datagrams_received_mut(&mut self) -> &mut VecDeque<Ipv4Datagram> {
        &mut self.datagrams_received
    }

    fn send_ipv4_datagram(&mut self, dgram: Ipv4Datagram, dst: EthernetAddress) {
        let payload = match dgram.serialize() {
            Ok(payload) => payload,
            Err(_) => return, // Unserializable datagrams die here
        };

        self.frames_out.push_back(EthernetFrame {
            header: EthernetHeader {
                dst,
                src: self.ethernet_address,
                ethertype: TYPE_IPV4,
            },
            payload,
        });
    }

    fn send_arp_message(&mut self, opcode: u16, target_ip: u32, target_ethernet: EthernetAddress) {
        let msg = ArpMessage {
            opcode,
            sender_ethernet: self.ethernet_address,
            sender_ip: self.ip_address,
            target_ethernet: if opcode == OPCODE_REQUEST {
                ETHERNET_ZERO
            } else {
                target_ethernet
            },
            target_ip: Ipv4Addr::from(target_ip),
        };

        self.frames_out.push_back(EthernetFrame {
            header: EthernetHeader {
                dst: if opcode == OPCODE_REQUEST {
                    ETHERNET_BROADCAST
                } else {
                    target_ethernet
                },
                src: self.ethernet_address,
                ethertype: TYPE_ARP,
            },
            payload: msg.serialize(),
        });
    }
}

// -- Unit tests --
