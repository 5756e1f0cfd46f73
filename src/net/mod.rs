pub mod arp;
pub mod ethernet;
pub mod network_interface;

pub use ethernet::{EthernetAddress, EthernetFrame};
pub use network_interface::{Ipv4Datagram, NetworkInterface};
