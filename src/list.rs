//! List helpers shared by schema types: a homogeneous drain-and-delegate loop (mirroring
//! the source's `vector_io` template) and a tag-dispatched heterogeneous descriptor list
//! (mirroring `descriptor_vector::io`'s tag-peek/factory/delegate loop).
//!
//! Parsing drains `Codec::block_size_left()`, default-constructing and delegating each
//! element in turn; constructing simply iterates the existing elements. This is value
//! semantics throughout — no analogue of the source's `descriptor_factory`/`dup()`
//! heap-ownership dance is needed.

use crate::codec::{Codec, Result};
use crate::error::Hint;
use crate::schema::descriptor::{Descriptor, DescriptorIo};

/// A schema element whose wire representation is entirely described by its own `io`.
pub(crate) trait SchemaIo: Default {
    fn io(&mut self, codec: &mut Codec) -> Result<()>;
}

/// Drains or emits a homogeneous list of `T` within the enclosing scoped block.
pub(crate) fn vector_io<T: SchemaIo>(codec: &mut Codec, list: &mut Vec<T>) -> Result<()> {
    if codec.is_parsing() {
        list.clear();
        while codec.block_size_left() > 0 {
            let mut item = T::default();
            item.io(codec)?;
            list.push(item);
        }
    } else {
        for item in list.iter_mut() {
            item.io(codec)?;
        }
    }
    Ok(())
}

/// Drains or emits a heterogeneous list of descriptors. The tag byte is read/written
/// here, uniformly for every variant, rather than inside each variant's own `io` — this
/// regularizes the source's inconsistency where some descriptor types wrote their own
/// tag in construct mode and others never did (see `DESIGN.md`).
pub(crate) fn descriptor_list_io(codec: &mut Codec, list: &mut Vec<Descriptor>) -> Result<()> {
    if codec.is_parsing() {
        list.clear();
        while codec.block_size_left() > 0 {
            let mut tag = 0u32;
            codec.uint(8, &mut tag, field_info_hint!("tag", Hint::Hex))?;
            let mut descriptor = Descriptor::new_for_tag(tag as u8);
            descriptor.io(codec)?;
            list.push(descriptor);
        }
    } else {
        for descriptor in list.iter_mut() {
            let mut tag = u32::from(descriptor.tag());
            codec.uint(8, &mut tag, field_info_hint!("tag", Hint::Hex))?;
            descriptor.io(codec)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::descriptor::{AdaptationFieldDataDescriptor, ServiceListDescriptor};

    #[test]
    fn descriptor_list_roundtrip() {
        let mut buf = [0u8; 32];
        let written_len;
        {
            let mut c = Codec::construct_binary(&mut buf);
            c.named_block_begin(12, field_info!("descriptors_length")).unwrap();
            let mut list = vec![
                Descriptor::AdaptationFieldData(AdaptationFieldDataDescriptor { adaptation_field_data_identifier: 9 }),
                Descriptor::ServiceList(ServiceListDescriptor { services: Vec::new() }),
            ];
            descriptor_list_io(&mut c, &mut list).unwrap();
            written_len = c.named_block_end(field_info!("descriptors_length")).unwrap();
        }
        assert!(written_len > 0);

        let mut c = Codec::parse_binary(&buf);
        c.named_block_begin(12, field_info!("descriptors_length")).unwrap();
        let mut list = Vec::new();
        descriptor_list_io(&mut c, &mut list).unwrap();
        c.named_block_end(field_info!("descriptors_length")).unwrap();
        assert_eq!(list.len(), 2);
        match &list[0] {
            Descriptor::AdaptationFieldData(d) => assert_eq!(d.adaptation_field_data_identifier, 9),
            other => panic!("unexpected variant {:?}", other),
        }
    }
}
