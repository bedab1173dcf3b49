//! Concrete DVB message types built on the codec engine: the descriptor catalog and the
//! Network Information Table. Each type is a plain value with an `io(&mut self, codec)`
//! method; there is nothing here the codec engine itself needs to know about.

pub mod descriptor;
pub mod nit;

pub use descriptor::{
    AdaptationFieldDataDescriptor, CableDeliverySystemDescriptor, Descriptor, ExtendedEventDescriptor,
    ItemEntry, Service, ServiceListDescriptor, UnknownDescriptor,
};
pub use nit::{NetworkInformationSection, TsSpecification};
