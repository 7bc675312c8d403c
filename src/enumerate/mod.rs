//! Candidate enumerators: expand a compact spec into the list of things to probe.
pub mod cidr;
pub mod ports;
pub mod wordlist;

pub use cidr::{expand_cidr, parse_cidr};
pub use ports::parse_port_spec;
pub use wordlist::load_wordlist;
