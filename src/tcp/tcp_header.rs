use crate::ip::ip_header::Ipv4Header;
use crate::packet::errors::HeaderError;
use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::wrap32::Wrap32;

/// A wire-format TCP header: fixed 20-byte fields plus variable-length
/// options and payload, as carried over the network.
#[derive(Debug, Clone, PartialEq)]
pub struct TcpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq_no: Wrap32,
    pub ack_no: Wrap32,
    pub data_offset: u8, // Upper 4 bits: header length in 32-bit words
    pub reserved: u8,    // Lower 4 bits
    pub flags: TcpFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent: u16,
    pub options: Vec<u8>,
    pub payload: Vec<u8>,
}

impl Default for TcpHeader {
    fn default() -> Self {
        TcpHeader {
            src_port: 0,
            dst_port: 0,
            seq_no: Wrap32::new(0),
            ack_no: Wrap32::new(0),
            data_offset: 5,
            reserved: 0,
            flags: TcpFlags::ACK,
            window: 0,
            checksum: 0,
            urgent: 0,
            options: vec![],
            payload: vec![],
        }
    }
}

impl TcpHeader {
    pub fn serialize(&self, buf: &mut [u8], iph: &Ipv4Header) -> Result<usize, HeaderError> {
        let header_len = self.data_offset as usize * 4;
        let total_len = header_len + self.payload.len();

        if buf.len() < total_len {
            return Err(HeaderError::BufferTooSmall { expected: total_len, found: buf.len() });
        }

        buf[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        buf[4..8].copy_from_slice(&self.seq_no.value().to_be_bytes());
        buf[8..12].copy_from_slice(&self.ack_no.value().to_be_bytes());
        buf[12] = (self.data_offset << 4) | self.reserved;
        buf[13] = self.flags.bits();
        buf[14..16].copy_from_slice(&self.window.to_be_bytes());
        buf[16..18].fill(0);
        buf[18..20].copy_from_slice(&self.urgent.to_be_bytes());

        if !self.options.is_empty() {
            buf[20..header_len].copy_from_slice(&self.options);
        }

        if !self.payload.is_empty() {
            buf[header_len..total_len].copy_from_slice(&self.payload);
        }

        let checksum = Self::checksum(&buf[..total_len], iph);
        buf[16..18].copy_from_slice(&checksum.to_be_bytes());

        Ok(total_len)
    }

    pub fn parse(buf: &[u8], iph: &Ipv4Header) -> Result<Self, HeaderError> {
        if buf.len() < 20 {
            return Err(HeaderError::BufferTooSmall { expected: 20, found: buf.len() });
        }

        let src_port = u16::from_be_bytes([buf[0], buf[1]]);
        let dst_port = u16::from_be_bytes([buf[2], buf[3]]);
        let seq_no = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let ack_no = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let data_offset = buf[12] >> 4;
        let reserved = buf[12] & 0x0f;
        let flags = TcpFlags::from_bits_truncate(buf[13]);
        let window = u16::from_be_bytes([buf[14], buf[15]]);
        let checksum = u16::from_be_bytes([buf[16], buf[17]]);
        let urgent = u16::from_be_bytes([buf[18], buf[19]]);

        let header_len = data_offset as usize * 4;
        if buf.len() < header_len {
            return Err(HeaderError::BufferTooSmall { expected: header_len, found: buf.len() });
        }

        let options = if header_len > 20 {
            buf[20..header_len].to_vec()
        } else {
            Vec::new()
        };

        let payload = if buf.len() > header_len {
            buf[header_len..].to_vec()
        } else {
            Vec::new()
        };

        if Self::checksum(&buf[..(header_len + payload.len())], iph) != 0 {
            return Err(HeaderError::BadChecksum("TCP".to_string()));
        }

        Ok(TcpHeader {
            src_port,
            dst_port,
            seq_no: Wrap32::new(seq_no),
            ack_no: Wrap32::new(ack_no),
            data_offset,
            reserved,
            flags,
            window,
            checksum,
            urgent,
            options,
            payload,
        })
    }

    /// Checksum over the pseudo-header (src/dst IP, protocol, segment length)
    /// plus the TCP header and payload.
    pub fn checksum(data: &[u8], iph: &Ipv4Header) -> u16 {
        let mut sum: u32 = 0;

        let src_bytes = iph.src_ip.octets();
        let dst_bytes = iph.dst_ip.octets();

        sum += ((src_bytes[0] as u32) << 8) | (src_bytes[1] as u32);
        sum += ((src_bytes[2] as u32) << 8) | (src_bytes[3] as u32);
        sum += ((dst_bytes[0] as u32) << 8) | (dst_bytes[1] as u32);
        sum += ((dst_bytes[2] as u32) << 8) | (dst_bytes[3] as u32);

        sum += iph.protocol as u32;
        sum += data.len() as u32;

        for i in (0..data.len() - 1).step_by(2) {
            sum += ((data[i] as u32) << 8) | (data[i + 1] as u32);
        }

        if data.len() % 2 != 0 {
            sum += (data[data.len() - 1] as u32) << 8;
        }

        let folded = (sum & 0xffff) + (sum >> 16);
        !folded as u16
    }
}
