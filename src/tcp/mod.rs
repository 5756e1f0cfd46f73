pub mod byte_stream;
pub mod config;
pub mod connection;
pub mod errors;
pub mod reassembler;
pub mod receiver;
pub mod retransmission_timer;
pub mod sender;
pub mod tcp_flags;
pub mod tcp_header;
pub mod tcp_segment;
pub mod wrap32;

pub use byte_stream::ByteStream;
pub use config::TcpConfig;
pub use connection::TCPConnection;
pub use errors::TcpError;
pub use reassembler::StreamReassembler;
pub use receiver::TCPReceiver;
pub use retransmission_timer::RetransmissionTimer;
pub use sender::TCPSender;
pub use tcp_segment::TcpSegment;
pub use wrap32::Wrap32;
