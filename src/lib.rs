//! Toolkit for DVB (Digital Video Broadcasting) Service Information processing.
//!
//! Three subsystems carry the weight:
//!
//! - [`Codec`], a mode-polymorphic bit-stream engine: the same `io(codec)` description of
//!   a message drives parse-binary, construct-binary, parse-text, and construct-text.
//! - [`SectionExtractor`], a per-PID state machine reassembling DVB SI sections out of
//!   188-byte MPEG-2 TS packets.
//! - [`SectionPacketizer`], the inverse: fragmenting sections back into TS packets.
//!
//! A small catalog of concrete message types ([`NetworkInformationSection`],
//! [`Descriptor`] and its variants) exercises the codec end-to-end.
//!
//! # Usage
//! Simply add this crate as a dependency in your `Cargo.toml`.
//!
//! ```toml
//! [dependencies]
//! dvb-si-io = "~0.1.0"
//! ```
//!
//! ```
//! use dvb_si_io::{Codec, NetworkInformationSection};
//!
//! let mut nit = NetworkInformationSection {
//!     table_id: 0x40,
//!     section_syntax_indicator: 1,
//!     network_id: 1,
//!     version_number: 0,
//!     current_next_indicator: 1,
//!     section_number: 0,
//!     last_section_number: 0,
//!     network_descriptors: Vec::new(),
//!     ts_loop: Vec::new(),
//!     crc: 0,
//! };
//! let mut buf = [0u8; 32];
//! let mut codec = Codec::construct_binary(&mut buf);
//! nit.io(&mut codec).expect("construct");
//! ```

#![deny(unsafe_code)]

#[macro_use]
mod error;
mod checksum;
mod codec;
mod list;
mod psi;
mod scope;
pub mod schema;

pub use crate::codec::Codec;
pub use crate::error::{CodecError, ErrorKind, FieldInfo, Hint};
pub use crate::psi::{SectionExtractor, SectionPacketizer, MAX_SECTION_SIZE, TS_PACKET_LEN};
pub use crate::schema::{
    AdaptationFieldDataDescriptor, CableDeliverySystemDescriptor, Descriptor,
    ExtendedEventDescriptor, ItemEntry, NetworkInformationSection, Service, ServiceListDescriptor,
    TsSpecification, UnknownDescriptor,
};
