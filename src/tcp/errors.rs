use thiserror::Error;

/// Misuse of the connection/sender/receiver API, as opposed to
/// [`crate::packet::errors::HeaderError`] which covers malformed bytes on the wire.
#[derive(Error, Debug, PartialEq)]
pub enum TcpError {
    #[error("cannot write to stream_in before the connection is active")]
    NotConnected,

    #[error("end_input_stream called more than once")]
    AlreadyEnded,

    #[error("connect called on a connection that already has an outstanding SYN or is established")]
    AlreadyConnecting,
}
