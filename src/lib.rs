pub mod ip;
pub mod net;
pub mod packet;
pub mod tcp;

pub use tcp::{ByteStream, StreamReassembler, TCPConnection, TCPReceiver, TCPSender, TcpConfig, TcpSegment, Wrap32};
