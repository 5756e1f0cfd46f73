use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

use crate::ip::ip_header::Ipv4Header;
use crate::net::arp::{ArpMessage, ARP_OPCODE_REPLY, ARP_OPCODE_REQUEST};
use crate::net::ethernet::{EthernetAddress, EthernetFrame, BROADCAST, ETHERTYPE_ARP, ETHERTYPE_IPV4};

/// How long a learned ARP cache entry stays valid.
const ARP_ENTRY_TTL_MS: u64 = 30_000;
/// Minimum gap between repeated ARP broadcasts for the same next hop.
const ARP_RETRY_MS: u64 = 5_000;

struct ArpCacheEntry {
    mac: EthernetAddress,
    age_ms: u64,
}

struct PendingDatagram {
    frame_payload: Vec<u8>,
    time_since_arp_ms: u64,
}

/// A fully in-memory datagram describing an IPv4 datagram: header + payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

/// Bridges IP and Ethernet: resolves next-hop MAC addresses via ARP, queues
/// datagrams while resolution is pending, and answers/learns from incoming
/// ARP traffic.
pub struct NetworkInterface {
    ethernet_address: EthernetAddress,
    ip_address: Ipv4Addr,
    frames_out: VecDeque<EthernetFrame>,
    arp_cache: HashMap<Ipv4Addr, ArpCacheEntry>,
    pending: HashMap<Ipv4Addr, PendingDatagram>,
}

impl NetworkInterface {
    pub fn new(ethernet_address: EthernetAddress, ip_address: Ipv4Addr) -> Self {
        NetworkInterface {
            ethernet_address,
            ip_address,
            frames_out: VecDeque::new(),
            arp_cache: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn frames_out(&mut self) -> &mut VecDeque<EthernetFrame> {
        &mut self.frames_out
    }

    fn ip_payload(dgram: &Ipv4Datagram) -> Vec<u8> {
        let mut buf = vec![0u8; 20 + dgram.payload.len()];
        let n = dgram.header.serialize(&mut buf).unwrap();
        buf.truncate(n);
        buf.extend_from_slice(&dgram.payload);
        buf
    }

    fn push_ethernet(&mut self, dst: EthernetAddress, ethertype: u16, payload: Vec<u8>) {
        self.frames_out.push_back(EthernetFrame {
            dst,
            src: self.ethernet_address,
            ethertype,
            payload,
        });
    }

    fn broadcast_arp_request(&mut self, next_hop: Ipv4Addr) {
        let msg = ArpMessage::request(self.ethernet_address, self.ip_address, next_hop);
        let mut buf = vec![0u8; 28];
        msg.serialize(&mut buf).unwrap();
        self.push_ethernet(BROADCAST, ETHERTYPE_ARP, buf);
    }

    /// Send an IP datagram toward `next_hop`, resolving its MAC via ARP first
    /// if necessary.
    pub fn send_datagram(&mut self, dgram: &Ipv4Datagram, next_hop: Ipv4Addr) {
        let payload = Self::ip_payload(dgram);

        if let Some(entry) = self.arp_cache.get(&next_hop) {
            self.push_ethernet(entry.mac, ETHERTYPE_IPV4, payload);
            return;
        }

        let already_waiting = self.pending.contains_key(&next_hop);
        self.pending
            .entry(next_hop)
            .and_modify(|p| p.frame_payload = payload.clone())
            .or_insert(PendingDatagram { frame_payload: payload, time_since_arp_ms: ARP_RETRY_MS });

        if !already_waiting || self.pending[&next_hop].time_since_arp_ms >= ARP_RETRY_MS {
            self.broadcast_arp_request(next_hop);
            self.pending.get_mut(&next_hop).unwrap().time_since_arp_ms = 0;
        }
    }

    /// Handle an incoming Ethernet frame. Returns a parsed IP datagram if
    /// the frame carried one addressed to us.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) -> Option<Ipv4Datagram> {
        if frame.dst != self.ethernet_address && frame.dst != BROADCAST {
            return None;
        }

        match frame.ethertype {
            ETHERTYPE_IPV4 => {
                let header = Ipv4Header::parse(&frame.payload).ok()?;
                let header_len = header.ihl as usize * 4;
                let payload = frame.payload.get(header_len..)?.to_vec();
                Some(Ipv4Datagram { header, payload })
            }
            ETHERTYPE_ARP => {
                let msg = ArpMessage::parse(&frame.payload).ok()?;
                self.arp_cache.insert(
                    msg.sender_ip_address,
                    ArpCacheEntry { mac: msg.sender_ethernet_address, age_ms: 0 },
                );

                if msg.opcode == ARP_OPCODE_REQUEST && msg.target_ip_address == self.ip_address {
                    let reply = ArpMessage::reply(
                        self.ethernet_address,
                        self.ip_address,
                        msg.sender_ethernet_address,
                        msg.sender_ip_address,
                    );
                    let mut buf = vec![0u8; 28];
                    reply.serialize(&mut buf).unwrap();
                    self.push_ethernet(msg.sender_ethernet_address, ETHERTYPE_ARP, buf);
                } else if msg.opcode == ARP_OPCODE_REPLY {
                    if let Some(pending) = self.pending.remove(&msg.sender_ip_address) {
                        self.push_ethernet(
                            msg.sender_ethernet_address,
                            ETHERTYPE_IPV4,
                            pending.frame_payload,
                        );
                    }
                }
                None
            }
            _ => None,
        }
    }

    pub fn tick(&mut self, ms: u64) {
        self.arp_cache.retain(|_, entry| {
            entry.age_ms += ms;
            entry.age_ms < ARP_ENTRY_TTL_MS
        });

        let stale_targets: Vec<Ipv4Addr> = self
            .pending
            .iter_mut()
            .filter_map(|(&ip, pending)| {
                pending.time_since_arp_ms += ms;
                (pending.time_since_arp_ms >= ARP_RETRY_MS).then_some(ip)
            })
            .collect();

        for ip in stale_targets {
            self.broadcast_arp_request(ip);
            if let Some(pending) = self.pending.get_mut(&ip) {
                pending.time_since_arp_ms = 0;
            }
        }
    }
}
