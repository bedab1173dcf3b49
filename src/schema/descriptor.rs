//! Descriptor catalog: tag-length-value attributes embedded in DVB tables.
//!
//! Grounded in `dvb/descriptors.h`/`descriptors.cpp` (`descriptor_factory`,
//! `descriptor_vector`). Tag dispatch lives in [`crate::list::descriptor_list_io`]
//! uniformly for every variant — unlike the source, where `service_list_descriptor` and
//! `cable_delivery_system_descriptor` wrote their own tag in construct mode while
//! `adaptation_field_data_descriptor` never did. Each variant's `io` here only covers its
//! length-prefixed body.
//!
//! Dispatch across variants uses `enum_dispatch`, the same pattern the reference crate
//! uses for its `Span`/`PayloadUnit` enums.

use enum_dispatch::enum_dispatch;
use smallvec::SmallVec;

use crate::codec::{Codec, Result};
use crate::error::Hint;
use crate::list::{vector_io, SchemaIo};

#[enum_dispatch]
pub(crate) trait DescriptorIo {
    fn io(&mut self, codec: &mut Codec) -> Result<()>;
}

/// A single DVB descriptor. Any tag outside the five handled here round-trips opaquely
/// via [`UnknownDescriptor`], preserving exact bytes.
#[enum_dispatch(DescriptorIo)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    ServiceList(ServiceListDescriptor),
    CableDeliverySystem(CableDeliverySystemDescriptor),
    AdaptationFieldData(AdaptationFieldDataDescriptor),
    ExtendedEvent(ExtendedEventDescriptor),
    Unknown(UnknownDescriptor),
}

impl Descriptor {
    pub(crate) fn new_for_tag(tag: u8) -> Self {
        match tag {
            0x41 => Descriptor::ServiceList(ServiceListDescriptor::default()),
            0x44 => Descriptor::CableDeliverySystem(CableDeliverySystemDescriptor::default()),
            0x4E => Descriptor::ExtendedEvent(ExtendedEventDescriptor::default()),
            0x70 => Descriptor::AdaptationFieldData(AdaptationFieldDataDescriptor::default()),
            _ => Descriptor::Unknown(UnknownDescriptor { tag, data: SmallVec::new() }),
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Descriptor::ServiceList(_) => 0x41,
            Descriptor::CableDeliverySystem(_) => 0x44,
            Descriptor::ExtendedEvent(_) => 0x4E,
            Descriptor::AdaptationFieldData(_) => 0x70,
            Descriptor::Unknown(d) => d.tag,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub service_id: u16,
    pub service_type: u8,
}

impl SchemaIo for Service {
    fn io(&mut self, codec: &mut Codec) -> Result<()> {
        let mut service_id = u32::from(self.service_id);
        codec.uint(16, &mut service_id, field_info!("service_id"))?;
        self.service_id = service_id as u16;
        let mut service_type = u32::from(self.service_type);
        codec.uint(8, &mut service_type, field_info!("service_type"))?;
        self.service_type = service_type as u8;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceListDescriptor {
    pub services: Vec<Service>,
}

impl DescriptorIo for ServiceListDescriptor {
    fn io(&mut self, codec: &mut Codec) -> Result<()> {
        codec.named_block_begin(8, field_info!("length"))?;
        vector_io(codec, &mut self.services)?;
        codec.named_block_end(field_info!("descriptor_content"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CableDeliverySystemDescriptor {
    pub frequency: u32,
    pub fec_outer: u8,
    pub modulation: u8,
    pub symbol_rate: u32,
    pub fec_inner: u8,
}

impl DescriptorIo for CableDeliverySystemDescriptor {
    fn io(&mut self, codec: &mut Codec) -> Result<()> {
        codec.named_block_begin(8, field_info!("length"))?;
        codec.uint(32, &mut self.frequency, field_info_hint!("frequency", Hint::Hex))?;
        codec.uint_req(12, 0xFFF, field_info!("reserved_future_use"))?;
        let mut fec_outer = u32::from(self.fec_outer);
        codec.uint(4, &mut fec_outer, field_info!("FEC_outer"))?;
        self.fec_outer = fec_outer as u8;
        let mut modulation = u32::from(self.modulation);
        codec.uint(8, &mut modulation, field_info!("modulation"))?;
        self.modulation = modulation as u8;
        codec.uint(28, &mut self.symbol_rate, field_info!("symbol_rate"))?;
        let mut fec_inner = u32::from(self.fec_inner);
        codec.uint(4, &mut fec_inner, field_info!("FEC_inner"))?;
        self.fec_inner = fec_inner as u8;
        codec.named_block_end(field_info!("descriptor_content"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdaptationFieldDataDescriptor {
    pub adaptation_field_data_identifier: u8,
}

impl DescriptorIo for AdaptationFieldDataDescriptor {
    fn io(&mut self, codec: &mut Codec) -> Result<()> {
        codec.named_block_begin(8, field_info!("length"))?;
        let mut id = u32::from(self.adaptation_field_data_identifier);
        codec.uint(8, &mut id, field_info!("adaptation_field_data_identifier"))?;
        self.adaptation_field_data_identifier = id as u8;
        codec.named_block_end(field_info!("descriptor_content"))?;
        Ok(())
    }
}

/// One `item_description`/`item` pair within an [`ExtendedEventDescriptor`]'s `items` list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemEntry {
    pub item_description: Vec<u8>,
    pub item: Vec<u8>,
}

impl SchemaIo for ItemEntry {
    fn io(&mut self, codec: &mut Codec) -> Result<()> {
        codec.short_string(&mut self.item_description, field_info!("item_description"))?;
        codec.short_string(&mut self.item, field_info!("item"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedEventDescriptor {
    pub descriptor_number: u8,
    pub last_descriptor_number: u8,
    pub iso_639_language_code: Vec<u8>,
    pub items: Vec<ItemEntry>,
    pub text: Vec<u8>,
}

impl DescriptorIo for ExtendedEventDescriptor {
    fn io(&mut self, codec: &mut Codec) -> Result<()> {
        codec.named_block_begin(8, field_info!("length"))?;
        let mut descriptor_number = u32::from(self.descriptor_number);
        codec.uint(4, &mut descriptor_number, field_info!("descriptor_number"))?;
        self.descriptor_number = descriptor_number as u8;
        let mut last_descriptor_number = u32::from(self.last_descriptor_number);
        codec.uint(4, &mut last_descriptor_number, field_info!("last_descriptor_number"))?;
        self.last_descriptor_number = last_descriptor_number as u8;
        codec.fixed_string(&mut self.iso_639_language_code, 3, field_info!("ISO_639_language_code"))?;
        codec.named_block_begin(8, field_info!("length_of_items"))?;
        vector_io(codec, &mut self.items)?;
        codec.named_block_end(field_info!("items"))?;
        codec.short_string(&mut self.text, field_info!("text"))?;
        codec.named_block_end(field_info!("descriptor_content"))?;
        Ok(())
    }
}

/// Catch-all for any tag outside the catalog above: the raw payload bytes (not a scoped
/// block — the source reads/writes `length` as a plain byte, not a `named_block_begin`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownDescriptor {
    pub tag: u8,
    pub data: SmallVec<[u8; 8]>,
}

impl DescriptorIo for UnknownDescriptor {
    fn io(&mut self, codec: &mut Codec) -> Result<()> {
        let mut length = self.data.len() as u32;
        codec.uint(8, &mut length, field_info!("length"))?;
        if length > 0 {
            let mut buf = std::mem::take(&mut self.data).into_vec();
            codec.fixed_string(&mut buf, length as usize, field_info!("data"))?;
            self.data = SmallVec::from_vec(buf);
        } else {
            self.data.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_descriptor_roundtrip() {
        let mut buf = [0u8; 16];
        {
            let mut c = Codec::construct_binary(&mut buf);
            let mut tag = 0x99u32;
            c.uint(8, &mut tag, field_info!("tag")).unwrap();
            let mut d = Descriptor::Unknown(UnknownDescriptor {
                tag: 0x99,
                data: SmallVec::from_slice(&[1, 2, 3]),
            });
            d.io(&mut c).unwrap();
        }
        let mut c = Codec::parse_binary(&buf);
        let mut tag = 0u32;
        c.uint(8, &mut tag, field_info!("tag")).unwrap();
        let mut d = Descriptor::new_for_tag(tag as u8);
        d.io(&mut c).unwrap();
        match d {
            Descriptor::Unknown(u) => assert_eq!(&u.data[..], &[1, 2, 3]),
            other => panic!("expected unknown, got {:?}", other),
        }
    }

    #[test]
    fn cable_delivery_system_descriptor_roundtrip() {
        let mut buf = [0u8; 16];
        {
            let mut c = Codec::construct_binary(&mut buf);
            let mut d = Descriptor::CableDeliverySystem(CableDeliverySystemDescriptor {
                frequency: 0x1234_5678,
                fec_outer: 2,
                modulation: 3,
                symbol_rate: 0x0AB_CDEF,
                fec_inner: 5,
            });
            d.io(&mut c).unwrap();
        }
        let mut c = Codec::parse_binary(&buf);
        let mut d = Descriptor::new_for_tag(0x44);
        d.io(&mut c).unwrap();
        match d {
            Descriptor::CableDeliverySystem(d) => {
                assert_eq!(d.frequency, 0x1234_5678);
                assert_eq!(d.fec_outer, 2);
                assert_eq!(d.modulation, 3);
                assert_eq!(d.symbol_rate, 0x0AB_CDEF);
                assert_eq!(d.fec_inner, 5);
            }
            other => panic!("expected cable delivery system, got {:?}", other),
        }
    }

    #[test]
    fn extended_event_descriptor_roundtrip() {
        let mut buf = [0u8; 64];
        {
            let mut c = Codec::construct_binary(&mut buf);
            let mut d = Descriptor::ExtendedEvent(ExtendedEventDescriptor {
                descriptor_number: 1,
                last_descriptor_number: 3,
                iso_639_language_code: b"eng".to_vec(),
                items: vec![ItemEntry {
                    item_description: b"Director".to_vec(),
                    item: b"Some Name".to_vec(),
                }],
                text: b"summary text".to_vec(),
            });
            d.io(&mut c).unwrap();
        }
        let mut c = Codec::parse_binary(&buf);
        let mut d = Descriptor::new_for_tag(0x4E);
        d.io(&mut c).unwrap();
        match d {
            Descriptor::ExtendedEvent(d) => {
                assert_eq!(d.descriptor_number, 1);
                assert_eq!(d.last_descriptor_number, 3);
                assert_eq!(&d.iso_639_language_code[..], b"eng");
                assert_eq!(d.items.len(), 1);
                assert_eq!(&d.items[0].item_description[..], b"Director");
                assert_eq!(&d.items[0].item[..], b"Some Name");
                assert_eq!(&d.text[..], b"summary text");
            }
            other => panic!("expected extended event, got {:?}", other),
        }
    }
}
