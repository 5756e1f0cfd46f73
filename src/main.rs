use std::net::Ipv4Addr;

use minitcp::ip::ip_header::Ipv4Header;
use minitcp::net::{EthernetAddress, Ipv4Datagram, NetworkInterface};
use minitcp::tcp::tcp_flags::TcpFlags;
use minitcp::tcp::tcp_header::TcpHeader;
use minitcp::tcp::tcp_segment::TcpSegment;
use minitcp::{TCPConnection, TcpConfig};

const TCP_PROTOCOL: u8 = 6;

/// One side of the demo: a `TCPConnection` paired with the `NetworkInterface`
/// that encapsulates and resolves its segments over simulated Ethernet.
struct Host {
    conn: TCPConnection,
    nic: NetworkInterface,
    ip: Ipv4Addr,
    port: u16,
}

fn segment_to_header(seg: &TcpSegment, src_port: u16, dst_port: u16) -> TcpHeader {
    let mut flags = TcpFlags::empty();
    if seg.syn {
        flags |= TcpFlags::SYN;
    }
    if seg.fin {
        flags |= TcpFlags::FIN;
    }
    if seg.ack {
        flags |= TcpFlags::ACK;
    }
    if seg.rst {
        flags |= TcpFlags::RST;
    }

    TcpHeader {
        src_port,
        dst_port,
        seq_no: seg.seqno,
        ack_no: seg.ackno.unwrap_or(seg.seqno),
        data_offset: 5,
        reserved: 0,
        flags,
        window: seg.win,
        checksum: 0,
        urgent: 0,
        options: Vec::new(),
        payload: seg.payload.clone(),
    }
}

fn header_to_segment(header: &TcpHeader) -> TcpSegment {
    let mut seg = TcpSegment::new(header.seq_no);
    seg.ackno = header.flags.contains(TcpFlags::ACK).then_some(header.ack_no);
    seg.win = header.window;
    seg.syn = header.flags.contains(TcpFlags::SYN);
    seg.fin = header.flags.contains(TcpFlags::FIN);
    seg.ack = header.flags.contains(TcpFlags::ACK);
    seg.rst = header.flags.contains(TcpFlags::RST);
    seg.payload = header.payload.clone();
    seg
}

fn decode_segment(dgram: &Ipv4Datagram) -> Option<TcpSegment> {
    let header = TcpHeader::parse(&dgram.payload, &dgram.header).ok()?;
    Some(header_to_segment(&header))
}

/// Encapsulate every segment currently queued on `from.conn` into an IPv4
/// datagram and hand it to `from.nic`, per the driver contract: read
/// `segments_out`, wrap in IP, push to the network interface.
fn send_queued(from: &mut Host, to_ip: Ipv4Addr, to_port: u16) {
    for seg in from.conn.segments_out().drain(..).collect::<Vec<_>>() {
        let header = segment_to_header(&seg, from.port, to_port);
        let mut iph = Ipv4Header {
            src_ip: from.ip,
            dst_ip: to_ip,
            protocol: TCP_PROTOCOL,
            ..Ipv4Header::default()
        };

        let mut tcp_buf = vec![0u8; 20 + header.payload.len()];
        let n = header.serialize(&mut tcp_buf, &iph).unwrap();
        tcp_buf.truncate(n);
        iph.total_len = 20 + tcp_buf.len() as u16;

        println!(
            "{}:{} -> {}:{} seq={} syn={} fin={} ack={} rst={} len={}",
            from.ip, from.port, to_ip, to_port, seg.seqno, seg.syn, seg.fin, seg.ack, seg.rst, seg.payload.len()
        );

        from.nic.send_datagram(&Ipv4Datagram { header: iph, payload: tcp_buf }, to_ip);
    }
}

/// Drain every Ethernet frame `from.nic` has queued and deliver it to
/// `to.nic`, feeding any decoded TCP segment to `to.conn`. Frames produced
/// as a side effect (ARP replies, a flushed pending datagram) are left for
/// the caller's next pass in the opposite direction.
fn deliver_frames(from: &mut Host, to: &mut Host) {
    while let Some(frame) = from.nic.frames_out().pop_front() {
        if let Some(dgram) = to.nic.recv_frame(&frame) {
            if let Some(seg) = decode_segment(&dgram) {
                to.conn.segment_received(&seg);
            }
        }
    }
}

/// Pump frames and segments back and forth between the two hosts until
/// neither has anything left to send: ARP resolution takes a request/reply
/// round trip before the first real segment can be delivered, and a
/// delivered segment can itself provoke a fresh reply.
fn drive_to_quiescence(a: &mut Host, b: &mut Host) {
    loop {
        let mut progressed = false;

        if !a.conn.segments_out().is_empty() {
            send_queued(a, b.ip, b.port);
            progressed = true;
        }
        if !b.conn.segments_out().is_empty() {
            send_queued(b, a.ip, a.port);
            progressed = true;
        }
        if !a.nic.frames_out().is_empty() {
            deliver_frames(a, b);
            progressed = true;
        }
        if !b.nic.frames_out().is_empty() {
            deliver_frames(b, a);
            progressed = true;
        }

        if !progressed {
            break;
        }
    }
}

fn host(mac: EthernetAddress, ip: Ipv4Addr, port: u16, config: TcpConfig) -> Host {
    Host {
        conn: TCPConnection::new(config),
        nic: NetworkInterface::new(mac, ip),
        ip,
        port,
    }
}

fn main() {
    let config = TcpConfig::default();
    let mut client = host([0x02, 0, 0, 0, 0, 1], Ipv4Addr::new(10, 0, 0, 1), 49152, config);
    let mut server = host([0x02, 0, 0, 0, 0, 2], Ipv4Addr::new(10, 0, 0, 2), 80, config);

    client.conn.connect().unwrap();
    drive_to_quiescence(&mut client, &mut server);

    client.conn.write(b"hello, loopback world").unwrap();
    client.conn.end_input_stream().unwrap();
    drive_to_quiescence(&mut client, &mut server);

    server.conn.end_input_stream().unwrap();
    drive_to_quiescence(&mut client, &mut server);

    println!(
        "client active={} server active={}",
        client.conn.active(),
        server.conn.active()
    );
}
