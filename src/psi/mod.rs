//! TS-packet-level plumbing: the section extractor and packetizer. Independent of the
//! codec engine and of each other — both operate on raw section bytes, leaving their
//! interpretation to [`crate::schema`].

pub(crate) mod extractor;
pub(crate) mod packetizer;

pub use extractor::SectionExtractor;
pub use packetizer::SectionPacketizer;

/// Length in bytes of one MPEG-2 Transport Stream packet.
pub const TS_PACKET_LEN: usize = 188;

/// Ceiling on a DVB section's total length (header + payload + CRC), per ETSI EN 300 468.
pub const MAX_SECTION_SIZE: usize = 4096;
