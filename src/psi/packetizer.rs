//! Section-to-TS packetizer: the inverse of [`super::extractor::SectionExtractor`] for a
//! single PID.
//!
//! Grounded in `sec2ts.cpp`'s `sec2ts_impl::sectionX`/`fix_header`/`flush`. The source
//! specialized `sectionX<DBG_LEVEL>` per debug level via a function-pointer swap; this
//! crate keeps a single implementation and lets `log`'s runtime level filter decide what
//! actually gets printed, per `debug_level`.

use log::{debug, trace};

use super::TS_PACKET_LEN;

const AFC_PAYLOAD: u8 = 1;
const AFC_ADAPTATION: u8 = 2;
const AFC_ADAPTATION_AND_PAYLOAD: u8 = 3;

/// Fragments sections into 188-byte TS packets on a single PID.
pub struct SectionPacketizer {
    pid: u16,
    cc: u8,
    debug_level: u8,
    on_adaptation_field: Option<Box<dyn FnMut(&mut [u8]) -> u32>>,
    on_ts_packet_produced: Option<Box<dyn FnMut(&[u8; TS_PACKET_LEN])>>,
    packet: [u8; TS_PACKET_LEN],
    pusi: bool,
    payload_start: usize,
    payload_end: usize,
}

impl Default for SectionPacketizer {
    fn default() -> Self {
        SectionPacketizer::new()
    }
}

impl SectionPacketizer {
    pub fn new() -> Self {
        SectionPacketizer {
            pid: 0,
            cc: 0,
            debug_level: 0,
            on_adaptation_field: None,
            on_ts_packet_produced: None,
            packet: [0u8; TS_PACKET_LEN],
            pusi: false,
            payload_start: 0,
            payload_end: 0,
        }
    }

    pub fn set_pid(&mut self, pid: u16) {
        self.pid = pid & ((1 << 13) - 1);
    }

    /// `0..=5`; out-of-range values are ignored, matching the source's bounds check.
    pub fn set_debug_level(&mut self, level: u8) {
        if level <= 5 {
            self.debug_level = level;
        }
    }

    /// Registers a hook that may fill adaptation-field bytes at `packet[4..4+N]` and
    /// returns `N`.
    pub fn on_adaptation_field<F>(&mut self, callback: F)
    where
        F: FnMut(&mut [u8]) -> u32 + 'static,
    {
        self.on_adaptation_field = Some(Box::new(callback));
    }

    pub fn on_ts_packet_produced<F>(&mut self, callback: F)
    where
        F: FnMut(&[u8; TS_PACKET_LEN]) + 'static,
    {
        self.on_ts_packet_produced = Some(Box::new(callback));
    }

    fn fix_header(&mut self, pusi: bool, afc: u8) {
        self.packet[0] = 0x47;
        self.packet[1] = (if pusi { 0x40 } else { 0 }) | (self.pid >> 8) as u8;
        self.packet[2] = self.pid as u8;
        self.packet[3] = (afc << 4) | (self.cc & 0xf);
    }

    fn emit(&mut self, pusi: bool) {
        let afc = if self.payload_start > 4 { AFC_ADAPTATION_AND_PAYLOAD } else { AFC_PAYLOAD };
        self.fix_header(pusi, afc);
        if self.debug_level >= 5 {
            trace!("emit packet pusi={} payload_start={} payload_end={}", pusi, self.payload_start, self.payload_end);
        }
        if let Some(callback) = &mut self.on_ts_packet_produced {
            callback(&self.packet);
        }
    }

    fn start_packet(&mut self) {
        let mut adapt_len = 0u32;
        if let Some(callback) = &mut self.on_adaptation_field {
            adapt_len = callback(&mut self.packet[4..TS_PACKET_LEN]);
        }
        self.payload_start = 4 + adapt_len as usize;
        self.payload_end = self.payload_start;
    }

    /// Feeds one complete section's bytes, fragmenting across as many packets as needed.
    pub fn section(&mut self, mut section: &[u8]) {
        debug!("section len={}", section.len());
        let mut wrote_section_start = false;

        if self.payload_start != 0 {
            if !self.pusi {
                if self.payload_end >= TS_PACKET_LEN - 1 {
                    self.packet[TS_PACKET_LEN - 1] = 0xff;
                    self.emit(false);
                    self.payload_start = 0;
                    self.pusi = false;
                    self.cc = (self.cc + 1) & 0xf;
                } else {
                    let shift = self.payload_end - self.payload_start;
                    self.packet.copy_within(
                        self.payload_start..self.payload_start + shift,
                        self.payload_start + 1,
                    );
                    self.packet[self.payload_start] = shift as u8;
                    self.payload_end += 1;
                    wrote_section_start = true;
                    self.pusi = true;
                }
            }

            if self.payload_start != 0 {
                let rem = TS_PACKET_LEN - self.payload_end;
                if rem > section.len() {
                    let len = section.len();
                    self.packet[self.payload_end..self.payload_end + len].copy_from_slice(section);
                    self.payload_end += len;
                    return;
                } else {
                    self.packet[self.payload_end..self.payload_end + rem].copy_from_slice(&section[..rem]);
                    self.payload_end += rem;
                    section = &section[rem..];
                    self.emit(true);
                    self.payload_start = 0;
                    self.pusi = false;
                    self.cc = (self.cc + 1) & 0xf;
                    if section.is_empty() {
                        return;
                    }
                    wrote_section_start = true;
                }
            }
        }

        loop {
            self.start_packet();
            let mut rem = TS_PACKET_LEN - self.payload_end;
            if rem <= 1 {
                self.fix_header(true, AFC_ADAPTATION);
                if let Some(callback) = &mut self.on_ts_packet_produced {
                    callback(&self.packet);
                }
                self.payload_start = 0;
                self.pusi = false;
                continue;
            }

            if !wrote_section_start {
                self.packet[self.payload_end] = 0;
                self.payload_end += 1;
                rem = TS_PACKET_LEN - self.payload_end;
                self.pusi = true;
                wrote_section_start = true;
            }

            if rem > section.len() {
                let len = section.len();
                self.packet[self.payload_end..self.payload_end + len].copy_from_slice(section);
                self.payload_end += len;
                return;
            } else {
                self.packet[self.payload_end..self.payload_end + rem].copy_from_slice(&section[..rem]);
                section = &section[rem..];
                self.emit(self.pusi);
                self.payload_start = 0;
                self.pusi = false;
                self.cc = (self.cc + 1) & 0xf;
                if section.is_empty() {
                    return;
                }
            }
        }
    }

    /// Emits any in-flight partial packet, padded with `0xFF`.
    pub fn flush(&mut self) {
        if self.payload_start != 0 {
            self.fix_header(self.pusi, if self.payload_start > 4 { AFC_ADAPTATION_AND_PAYLOAD } else { AFC_PAYLOAD });
            for b in &mut self.packet[self.payload_end..TS_PACKET_LEN] {
                *b = 0xFF;
            }
            if let Some(callback) = &mut self.on_ts_packet_produced {
                callback(&self.packet);
            }
            self.payload_start = 0;
            self.pusi = false;
            self.cc = (self.cc + 1) & 0xf;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::extractor::SectionExtractor;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn dvb_section(payload_len: u16) -> Vec<u8> {
        let mut s = vec![0x40, 0xF0 | (payload_len >> 8) as u8, payload_len as u8];
        s.extend((0..payload_len).map(|i| i as u8));
        s
    }

    #[test]
    fn small_section_round_trips_through_extractor() {
        let section_bytes = dvb_section(20);
        let mut packetizer = SectionPacketizer::new();
        packetizer.set_pid(0x12);
        let packets = Rc::new(RefCell::new(Vec::new()));
        let packets_clone = packets.clone();
        packetizer.on_ts_packet_produced(move |p| packets_clone.borrow_mut().push(*p));
        packetizer.section(&section_bytes);
        packetizer.flush();
        assert!(!packets.borrow().is_empty());

        let mut extractor = SectionExtractor::new(4096, 0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        extractor.on_section_ready(move |bytes| seen_clone.borrow_mut().push(bytes.to_vec()));
        for packet in packets.borrow().iter() {
            extractor.ts_packet(packet);
        }
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0], section_bytes);
    }

    #[test]
    fn large_section_spans_multiple_packets_and_round_trips() {
        let section_bytes = dvb_section(500);
        let mut packetizer = SectionPacketizer::new();
        packetizer.set_pid(0x20);
        let packets = Rc::new(RefCell::new(Vec::new()));
        let packets_clone = packets.clone();
        packetizer.on_ts_packet_produced(move |p| packets_clone.borrow_mut().push(*p));
        packetizer.section(&section_bytes);
        packetizer.flush();
        assert!(packets.borrow().len() > 1);

        let mut extractor = SectionExtractor::new(4096, 0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        extractor.on_section_ready(move |bytes| seen_clone.borrow_mut().push(bytes.to_vec()));
        for packet in packets.borrow().iter() {
            extractor.ts_packet(packet);
        }
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0], section_bytes);
    }

    #[test]
    fn continuity_counter_advances_only_on_payload_packets() {
        let mut packetizer = SectionPacketizer::new();
        packetizer.set_pid(0x30);
        let ccs = Rc::new(RefCell::new(Vec::new()));
        let ccs_clone = ccs.clone();
        packetizer.on_ts_packet_produced(move |p| ccs_clone.borrow_mut().push(p[3] & 0xf));
        packetizer.section(&dvb_section(10));
        packetizer.flush();
        let recorded = ccs.borrow();
        for window in recorded.windows(2) {
            assert_eq!((window[0] + 1) & 0xf, window[1]);
        }
    }
}
