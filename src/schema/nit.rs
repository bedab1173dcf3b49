//! Network Information Table: the one concrete section type this crate ships end-to-end.
//!
//! Grounded field-for-field in `dvb/NIT.h`'s `ts_specification`/
//! `network_information_section`, with two fixes applied rather than replicated (see
//! `DESIGN.md` and `SPEC_FULL.md` §9):
//! - the `section_length > 1021` check runs against the declared block length right after
//!   `named_block_begin` (available via `block_size_left()`), not against a struct field
//!   that in the source was read before it was ever assigned;
//! - CRC late-fix ordering still follows the source exactly: the CRC is written/verified
//!   before `section_length`'s `named_block_end` closes, then recomputed and overwritten
//!   once the section length has settled.

use crate::codec::{Codec, Result};
use crate::error::ErrorKind;
use crate::list::descriptor_list_io;
use crate::list::{vector_io, SchemaIo};
use crate::schema::descriptor::Descriptor;

const MAX_NIT_BODY_BYTES: u32 = 1021;

fn check_nit_size(codec: &Codec, declared_bytes: u32) -> Result<()> {
    if declared_bytes > MAX_NIT_BODY_BYTES {
        return Err(codec.error(
            ErrorKind::LengthExceeded,
            field_info!("section_length"),
            "NIT size exceeds 1024".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsSpecification {
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub transport_descriptors: Vec<Descriptor>,
}

impl SchemaIo for TsSpecification {
    fn io(&mut self, codec: &mut Codec) -> Result<()> {
        let mut transport_stream_id = u32::from(self.transport_stream_id);
        codec.uint(16, &mut transport_stream_id, field_info!("transport_stream_id"))?;
        self.transport_stream_id = transport_stream_id as u16;

        let mut original_network_id = u32::from(self.original_network_id);
        codec.uint(16, &mut original_network_id, field_info!("original_network_id"))?;
        self.original_network_id = original_network_id as u16;

        codec.uint_req(4, 0xF, field_info!("reserved_future_use"))?;
        codec.named_block_begin(12, field_info!("transport_descriptors_length"))?;
        descriptor_list_io(codec, &mut self.transport_descriptors)?;
        codec.named_block_end(field_info!("transport_descriptors_length"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInformationSection {
    pub table_id: u8,
    pub section_syntax_indicator: u8,
    pub network_id: u16,
    pub version_number: u8,
    pub current_next_indicator: u8,
    pub section_number: u8,
    pub last_section_number: u8,
    pub network_descriptors: Vec<Descriptor>,
    pub ts_loop: Vec<TsSpecification>,
    pub crc: u32,
}

impl NetworkInformationSection {
    pub fn io(&mut self, codec: &mut Codec) -> Result<()> {
        let nit_begin = codec.bitpos();

        let mut table_id = u32::from(self.table_id);
        codec.uint(8, &mut table_id, field_info!("table_id"))?;
        self.table_id = table_id as u8;

        let mut ssi = u32::from(self.section_syntax_indicator);
        codec.uint(1, &mut ssi, field_info!("section_syntax_indicator"))?;
        self.section_syntax_indicator = ssi as u8;

        codec.uint_req(1, 1, field_info!("reserved_future_use"))?;
        codec.uint_req(2, 0x3, field_info!("reserved"))?;

        codec.named_block_begin(12, field_info!("section_length"))?;
        if codec.is_parsing() {
            let declared_bytes = codec.block_size_left() / 8;
            check_nit_size(codec, declared_bytes)?;
        }

        let mut network_id = u32::from(self.network_id);
        codec.uint(16, &mut network_id, field_info!("network_id"))?;
        self.network_id = network_id as u16;

        codec.uint_req(2, 0x3, field_info!("reserved"))?;

        let mut version_number = u32::from(self.version_number);
        codec.uint(5, &mut version_number, field_info!("version_number"))?;
        self.version_number = version_number as u8;

        let mut cni = u32::from(self.current_next_indicator);
        codec.uint(1, &mut cni, field_info!("current_next_indicator"))?;
        self.current_next_indicator = cni as u8;

        let mut section_number = u32::from(self.section_number);
        codec.uint(8, &mut section_number, field_info!("section_number"))?;
        self.section_number = section_number as u8;

        let mut last_section_number = u32::from(self.last_section_number);
        codec.uint(8, &mut last_section_number, field_info!("last_section_number"))?;
        self.last_section_number = last_section_number as u8;

        codec.uint_req(4, 0xF, field_info!("reserved_future_use"))?;
        codec.named_block_begin(12, field_info!("network_descriptors_length"))?;
        descriptor_list_io(codec, &mut self.network_descriptors)?;
        codec.named_block_end(field_info!("network_descriptors_length"))?;

        codec.uint_req(4, 0xF, field_info!("reserved_future_use"))?;
        codec.named_block_begin(12, field_info!("transport_stream_loop_length"))?;
        vector_io(codec, &mut self.ts_loop)?;
        codec.named_block_end(field_info!("transport_stream_loop_length"))?;

        let crc_pos = codec.bitpos();
        codec.crc32(nit_begin, &mut self.crc, field_info!("CRC"))?;
        let section_length = codec.named_block_end(field_info!("section_length"))?;
        codec.crc32_late_fix(nit_begin, crc_pos, &mut self.crc, field_info!("CRC"))?;

        if !codec.is_parsing() {
            check_nit_size(codec, section_length)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::descriptor::{AdaptationFieldDataDescriptor, Descriptor};

    fn sample() -> NetworkInformationSection {
        NetworkInformationSection {
            table_id: 0x40,
            section_syntax_indicator: 1,
            network_id: 0x1234,
            version_number: 3,
            current_next_indicator: 1,
            section_number: 0,
            last_section_number: 0,
            network_descriptors: vec![Descriptor::AdaptationFieldData(AdaptationFieldDataDescriptor {
                adaptation_field_data_identifier: 7,
            })],
            ts_loop: vec![TsSpecification {
                transport_stream_id: 1,
                original_network_id: 2,
                transport_descriptors: Vec::new(),
            }],
            crc: 0,
        }
    }

    #[test]
    fn nit_roundtrips_through_binary() {
        let mut buf = [0u8; 64];
        let mut written = sample();
        {
            let mut c = Codec::construct_binary(&mut buf);
            written.io(&mut c).unwrap();
            assert_eq!(c.bitpos() % 8, 0);
        }
        let mut parsed = NetworkInformationSection::default();
        let mut c = Codec::parse_binary(&buf);
        parsed.io(&mut c).unwrap();
        assert_eq!(parsed.table_id, written.table_id);
        assert_eq!(parsed.network_id, written.network_id);
        assert_eq!(parsed.ts_loop, written.ts_loop);
        assert_eq!(parsed.network_descriptors, written.network_descriptors);
        assert_eq!(parsed.crc, written.crc);
    }

    #[test]
    fn nit_roundtrips_through_text() {
        let mut written = sample();
        let mut c = Codec::construct_text();
        written.io(&mut c).unwrap();
        let text = c.into_text();
        assert!(text.contains("table_id: 64"));

        let mut parsed = NetworkInformationSection::default();
        let mut c = Codec::parse_text(&text);
        parsed.io(&mut c).unwrap();
        assert_eq!(parsed.network_id, written.network_id);
        assert_eq!(parsed.ts_loop, written.ts_loop);
    }

    #[test]
    fn oversized_nit_body_is_rejected() {
        let buf = [0u8; 1];
        let c = Codec::parse_binary(&buf);
        assert!(check_nit_size(&c, 1022).is_err());
        assert!(check_nit_size(&c, MAX_NIT_BODY_BYTES).is_ok());
    }
}
