use std::net::Ipv4Addr;

use crate::net::ethernet::EthernetAddress;
use crate::packet::errors::HeaderError;

pub const ARP_OPCODE_REQUEST: u16 = 1;
pub const ARP_OPCODE_REPLY: u16 = 2;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;

/// RFC 826 ARP message, fixed to Ethernet hardware / IPv4 protocol addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: u16,
    pub sender_ethernet_address: EthernetAddress,
    pub sender_ip_address: Ipv4Addr,
    pub target_ethernet_address: EthernetAddress,
    pub target_ip_address: Ipv4Addr,
}

impl ArpMessage {
    pub fn request(sender_mac: EthernetAddress, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        ArpMessage {
            opcode: ARP_OPCODE_REQUEST,
            sender_ethernet_address: sender_mac,
            sender_ip_address: sender_ip,
            target_ethernet_address: [0; 6],
            target_ip_address: target_ip,
        }
    }

    pub fn reply(
        sender_mac: EthernetAddress,
        sender_ip: Ipv4Addr,
        target_mac: EthernetAddress,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpMessage {
            opcode: ARP_OPCODE_REPLY,
            sender_ethernet_address: sender_mac,
            sender_ip_address: sender_ip,
            target_ethernet_address: target_mac,
            target_ip_address: target_ip,
        }
    }

    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, HeaderError> {
        if buf.len() < 28 {
            return Err(HeaderError::BufferTooSmall { expected: 28, found: buf.len() });
        }

        buf[0..2].copy_from_slice(&HTYPE_ETHERNET.to_be_bytes());
        buf[2..4].copy_from_slice(&PTYPE_IPV4.to_be_bytes());
        buf[4] = 6; // hardware address length
        buf[5] = 4; // protocol address length
        buf[6..8].copy_from_slice(&self.opcode.to_be_bytes());
        buf[8..14].copy_from_slice(&self.sender_ethernet_address);
        buf[14..18].copy_from_slice(&self.sender_ip_address.octets());
        buf[18..24].copy_from_slice(&self.target_ethernet_address);
        buf[24..28].copy_from_slice(&self.target_ip_address.octets());

        Ok(28)
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < 28 {
            return Err(HeaderError::BufferTooSmall { expected: 28, found: buf.len() });
        }

        let htype = u16::from_be_bytes([buf[0], buf[1]]);
        let ptype = u16::from_be_bytes([buf[2], buf[3]]);
        let hlen = buf[4];
        let plen = buf[5];
        if htype != HTYPE_ETHERNET || ptype != PTYPE_IPV4 || hlen != 6 || plen != 4 {
            return Err(HeaderError::UnsupportedArpFormat);
        }

        let opcode = u16::from_be_bytes([buf[6], buf[7]]);

        let mut sender_ethernet_address = [0u8; 6];
        sender_ethernet_address.copy_from_slice(&buf[8..14]);
        let sender_ip_address = Ipv4Addr::new(buf[14], buf[15], buf[16], buf[17]);

        let mut target_ethernet_address = [0u8; 6];
        target_ethernet_address.copy_from_slice(&buf[18..24]);
        let target_ip_address = Ipv4Addr::new(buf[24], buf[25], buf[26], buf[27]);

        Ok(ArpMessage {
            opcode,
            sender_ethernet_address,
            sender_ip_address,
            target_ethernet_address,
            target_ip_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrip() {
        let msg = ArpMessage::request(
            [1, 2, 3, 4, 5, 6],
            Ipv4Addr::new(192, 168, 0, 1),
            Ipv4Addr::new(192, 168, 0, 2),
        );
        let mut buf = vec![0u8; 64];
        let n = msg.serialize(&mut buf).unwrap();
        assert_eq!(ArpMessage::parse(&buf[..n]).unwrap(), msg);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let mut buf = vec![0u8; 28];
        buf[0..2].copy_from_slice(&99u16.to_be_bytes()); // bogus htype
        buf[2..4].copy_from_slice(&PTYPE_IPV4.to_be_bytes());
        buf[4] = 6;
        buf[5] = 4;
        assert_eq!(
            ArpMessage::parse(&buf).unwrap_err(),
            HeaderError::UnsupportedArpFormat
        );
    }
}
