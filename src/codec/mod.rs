//! The mode-polymorphic codec facade.
//!
//! A single [`Codec`] value replaces the source's six-class `iox`/`ix`/`ox`/`ibx`/`obx`/
//! `icx`/`ocx` hierarchy: one struct, one `Mode` tagged sum, one flat `match` per
//! operation. There is no analogue of the source's `as_ibx()`/`as_ocx()` narrowing casts
//! because Rust never lost the static type in the first place.
//!
//! Error construction inside a `match &mut self.mode { .. }` arm goes through
//! [`crate::error::make_error`] (a free function) rather than a `Codec` method, because a
//! `&self`/`&mut self` method call would borrow the whole struct and conflict with the
//! match scrutinee's borrow of the `mode` field. Plain field reads (`self.bitpos`,
//! `&self.scope_stack`) are unaffected since the borrow checker tracks struct fields
//! independently of each other.

mod bits;
mod text;

use crate::checksum::dvb_crc32;
use crate::error::{make_error, CodecError, ErrorKind, FieldInfo};
use crate::scope::{ScopeFrame, WritePos};

pub type Result<T> = std::result::Result<T, CodecError>;

enum Mode<'a> {
    ParseBinary { data: &'a [u8] },
    ConstructBinary { data: &'a mut [u8] },
    ParseText { text: &'a [u8], pos: usize },
    ConstructText { out: String },
}

/// The single entry point for binary and textual parsing and construction.
///
/// Created via one of the four constructors below, driven through a sequence of `uint`/
/// `named_block_begin`/`named_block_end`/string/CRC calls matching a schema's `io`
/// method, then discarded (binary variants) or converted with [`Codec::into_text`] (text-
/// construct).
pub struct Codec<'a> {
    bitpos: usize,
    bitlimit: usize,
    scope_stack: Vec<ScopeFrame>,
    mode: Mode<'a>,
}

/// Upper bound used for the simulated bit-limit of text-mode root contexts and as the
/// virtual capacity ceiling for an unset enclosing limit.
const UNBOUNDED_BITLIMIT: usize = usize::MAX / 2;

impl<'a> Codec<'a> {
    pub fn parse_binary(data: &'a [u8]) -> Self {
        Codec {
            bitpos: 0,
            bitlimit: data.len() * 8,
            scope_stack: Vec::new(),
            mode: Mode::ParseBinary { data },
        }
    }

    pub fn construct_binary(data: &'a mut [u8]) -> Self {
        let bitlimit = data.len() * 8;
        Codec {
            bitpos: 0,
            bitlimit,
            scope_stack: Vec::new(),
            mode: Mode::ConstructBinary { data },
        }
    }

    pub fn parse_text(text: &'a str) -> Self {
        Codec {
            bitpos: 0,
            bitlimit: UNBOUNDED_BITLIMIT,
            scope_stack: Vec::new(),
            mode: Mode::ParseText { text: text.as_bytes(), pos: 0 },
        }
    }

    pub fn construct_text() -> Codec<'static> {
        Codec {
            bitpos: 0,
            bitlimit: UNBOUNDED_BITLIMIT,
            scope_stack: Vec::new(),
            mode: Mode::ConstructText { out: String::new() },
        }
    }

    /// Consumes a text-construct codec, returning the formatted output.
    ///
    /// Panics if called on any other mode: that would be a programming error, not a
    /// recoverable fault, the same contract the source enforced with its `as_ocx()`
    /// narrowing cast.
    pub fn into_text(self) -> String {
        match self.mode {
            Mode::ConstructText { out } => out,
            _ => panic!("into_text called on a non-text-construct Codec"),
        }
    }

    pub fn is_parsing(&self) -> bool {
        matches!(self.mode, Mode::ParseBinary { .. } | Mode::ParseText { .. })
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.mode, Mode::ParseBinary { .. } | Mode::ConstructBinary { .. })
    }

    pub fn bitpos(&self) -> usize {
        self.bitpos
    }

    pub fn bitlimit(&self) -> usize {
        self.bitlimit
    }

    /// Builds a `CodecError` tagged with this codec's current position and open scopes.
    /// Safe to call from ordinary (non-`match &mut self.mode`-nested) code; schema types
    /// use this for semantic checks the generic engine has no reason to know about (e.g.
    /// a section-specific size cap).
    pub fn error(&self, kind: ErrorKind, info: FieldInfo, cause: String) -> CodecError {
        make_error(kind, info, cause, self.bitpos, self.bitlimit, &self.scope_stack)
    }

    /// Reads (parse modes) or writes (construct modes) an unsigned integer of
    /// `1..=32` bits, MSB-first.
    pub fn uint(&mut self, bitsize: u32, value: &mut u32, info: FieldInfo) -> Result<()> {
        debug_assert!((1..=32).contains(&bitsize));
        match &mut self.mode {
            Mode::ParseBinary { data } => {
                if self.bitpos + bitsize as usize > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                *value = bits::read_bits(data, self.bitpos, bitsize);
                self.bitpos += bitsize as usize;
                Ok(())
            }
            Mode::ConstructBinary { data } => {
                if self.bitpos + bitsize as usize > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                if bitsize < 32 && *value >= (1u32 << bitsize) {
                    return Err(make_error(
                        ErrorKind::ValueTooLarge,
                        info,
                        format!("value {} does not fit in {} bits", value, bitsize),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                bits::write_bits(data, self.bitpos, bitsize, *value);
                self.bitpos += bitsize as usize;
                Ok(())
            }
            Mode::ParseText { text, pos } => {
                if self.bitpos + bitsize as usize > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                text::expect(*text, pos, info.name, info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                text::expect(*text, pos, ":", info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                let parsed =
                    text::parse_uint_token(*text, pos, bitsize, info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                *value = parsed;
                self.bitpos += bitsize as usize;
                Ok(())
            }
            Mode::ConstructText { out } => {
                if bitsize < 32 && *value >= (1u32 << bitsize) {
                    return Err(make_error(
                        ErrorKind::ValueTooLarge,
                        info,
                        format!("value {} does not fit in {} bits", value, bitsize),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                for _ in 0..self.scope_stack.len() {
                    out.push_str("  ");
                }
                out.push_str(info.name);
                out.push_str(": ");
                out.push_str(&text::format_uint_value(*value, info.hint));
                out.push('\n');
                self.bitpos += bitsize as usize;
                Ok(())
            }
        }
    }

    /// Parse: read and require equal to `expected`. Construct: write `expected`.
    pub fn uint_req(&mut self, bitsize: u32, expected: u32, info: FieldInfo) -> Result<()> {
        let mut value = expected;
        self.uint(bitsize, &mut value, info)?;
        if self.is_parsing() && value != expected {
            return Err(make_error(
                ErrorKind::ValueMismatch,
                info,
                format!("expected {} found {}", expected, value),
                self.bitpos,
                self.bitlimit,
                &self.scope_stack,
            ));
        }
        Ok(())
    }

    /// Opens a scoped length block reserving an `bitsize`-bit length prefix (binary) or
    /// the matching simulated advance plus a literal `{` (text). See module docs on why
    /// text never back-patches a real length.
    pub fn named_block_begin(&mut self, bitsize: u32, info: FieldInfo) -> Result<()> {
        debug_assert!((1..=32).contains(&bitsize));
        let bitpos_at_enter = self.bitpos;
        let bitlimit_at_enter = self.bitlimit;
        let cap_bits = (((1u64 << bitsize) - 1) * 8) as usize;

        match &mut self.mode {
            Mode::ParseBinary { data } => {
                if self.bitpos + bitsize as usize > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                let declared_bytes = bits::read_bits(data, self.bitpos, bitsize) as usize;
                self.bitpos += bitsize as usize;
                let new_limit = self.bitpos + declared_bytes * 8;
                if new_limit > bitlimit_at_enter {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "declared block length exceeds enclosing limit".to_string(),
                        self.bitpos,
                        bitlimit_at_enter,
                        &self.scope_stack,
                    ));
                }
                self.bitlimit = new_limit;
                self.scope_stack.push(ScopeFrame {
                    bitpos_at_enter,
                    bitlimit_at_enter,
                    position_for_write: None,
                    info,
                });
                Ok(())
            }
            Mode::ConstructBinary { .. } => {
                if self.bitpos + bitsize as usize > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                let write_pos = self.bitpos;
                self.bitpos += bitsize as usize;
                self.bitlimit = bitlimit_at_enter.min(self.bitpos + cap_bits);
                self.scope_stack.push(ScopeFrame {
                    bitpos_at_enter,
                    bitlimit_at_enter,
                    position_for_write: Some(WritePos::Binary(write_pos, bitsize)),
                    info,
                });
                Ok(())
            }
            Mode::ParseText { text, pos } => {
                text::expect(*text, pos, info.name, info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                text::expect(*text, pos, ":", info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                text::expect(*text, pos, "{", info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                self.bitpos += bitsize as usize;
                self.bitlimit = bitlimit_at_enter.min(self.bitpos + cap_bits);
                self.scope_stack.push(ScopeFrame {
                    bitpos_at_enter,
                    bitlimit_at_enter,
                    position_for_write: None,
                    info,
                });
                Ok(())
            }
            Mode::ConstructText { out } => {
                for _ in 0..self.scope_stack.len() {
                    out.push_str("  ");
                }
                out.push_str(info.name);
                out.push_str(": {\n");
                self.bitpos += bitsize as usize;
                self.bitlimit = bitlimit_at_enter.min(self.bitpos + cap_bits);
                self.scope_stack.push(ScopeFrame {
                    bitpos_at_enter,
                    bitlimit_at_enter,
                    position_for_write: None,
                    info,
                });
                Ok(())
            }
        }
    }

    /// Closes the innermost scope, back-patching its length in the binary-construct
    /// variant, and returns the block's byte length.
    pub fn named_block_end(&mut self, info: FieldInfo) -> Result<u32> {
        if self.bitpos % 8 != 0 {
            return Err(make_error(
                ErrorKind::Alignment,
                info,
                "block end is not byte-aligned".to_string(),
                self.bitpos,
                self.bitlimit,
                &self.scope_stack,
            ));
        }
        let frame = match self.scope_stack.last().copied() {
            Some(frame) => frame,
            None => {
                return Err(make_error(
                    ErrorKind::UnmatchedBlockEnd,
                    info,
                    "named_block_end with no open block".to_string(),
                    self.bitpos,
                    self.bitlimit,
                    &self.scope_stack,
                ));
            }
        };

        // Only a binary-parse block has an exact declared length to validate against;
        // text and construct blocks close on the literal `}`/caller-driven end instead.
        if matches!(self.mode, Mode::ParseBinary { .. }) && self.bitpos != self.bitlimit {
            return Err(make_error(
                ErrorKind::LengthExceeded,
                info,
                "block did not consume its declared length".to_string(),
                self.bitpos,
                self.bitlimit,
                &self.scope_stack,
            ));
        }

        if let Mode::ParseText { text, pos } = &mut self.mode {
            text::expect(*text, pos, "}", info, self.bitpos, self.bitlimit, &self.scope_stack)?;
        }

        let byte_length = ((self.bitpos - frame.bitpos_at_enter) / 8) as u32;

        if let (Mode::ConstructBinary { data }, Some(WritePos::Binary(write_pos, bitsize))) =
            (&mut self.mode, frame.position_for_write)
        {
            bits::write_bits(data, write_pos, bitsize, byte_length);
        }

        if let Mode::ConstructText { out } = &mut self.mode {
            for _ in 0..self.scope_stack.len() - 1 {
                out.push_str("  ");
            }
            out.push_str("}\n");
        }

        self.bitpos = self.bitpos.max(frame.bitpos_at_enter);
        self.bitlimit = frame.bitlimit_at_enter;
        self.scope_stack.pop();
        Ok(byte_length)
    }

    /// Bits remaining in the current scope, or the root context if none is open. In
    /// text-parse mode, returns 0 when the block is about to close (next non-whitespace
    /// token is `}`) or input is exhausted, so list-draining loops terminate correctly.
    pub fn block_size_left(&self) -> u32 {
        if let Mode::ParseText { text, pos } = &self.mode {
            match text::peek_nonws(*text, *pos) {
                Some(b'}') | None => return 0,
                _ => {}
            }
        }
        (self.bitlimit - self.bitpos) as u32
    }

    /// One-byte-length-prefixed (binary) / quoted (text) string, max 255 bytes.
    pub fn short_string(&mut self, value: &mut Vec<u8>, info: FieldInfo) -> Result<()> {
        if self.bitpos % 8 != 0 {
            return Err(make_error(
                ErrorKind::Alignment,
                info,
                "short_string must start byte-aligned".to_string(),
                self.bitpos,
                self.bitlimit,
                &self.scope_stack,
            ));
        }
        match &mut self.mode {
            Mode::ParseBinary { data } => {
                let start_byte = self.bitpos / 8;
                if start_byte + 1 > data.len() {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                let len = data[start_byte] as usize;
                let end_bit = (start_byte + 1 + len) * 8;
                if end_bit > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                value.clear();
                value.extend_from_slice(&data[start_byte + 1..start_byte + 1 + len]);
                self.bitpos = end_bit;
                Ok(())
            }
            Mode::ConstructBinary { data } => {
                if value.len() > 255 {
                    return Err(make_error(
                        ErrorKind::StringTooLong,
                        info,
                        format!("string of {} bytes exceeds 255", value.len()),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                let start_byte = self.bitpos / 8;
                let end_bit = (start_byte + 1 + value.len()) * 8;
                if end_bit > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                data[start_byte] = value.len() as u8;
                data[start_byte + 1..start_byte + 1 + value.len()].copy_from_slice(value);
                self.bitpos = end_bit;
                Ok(())
            }
            Mode::ParseText { text, pos } => {
                text::expect(*text, pos, info.name, info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                text::expect(*text, pos, ":", info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                let parsed = text::parse_quoted_string(*text, pos, info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                if parsed.len() > 255 {
                    return Err(make_error(
                        ErrorKind::StringTooLong,
                        info,
                        format!("string of {} bytes exceeds 255", parsed.len()),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                self.bitpos += (1 + parsed.len()) * 8;
                *value = parsed;
                Ok(())
            }
            Mode::ConstructText { out } => {
                if value.len() > 255 {
                    return Err(make_error(
                        ErrorKind::StringTooLong,
                        info,
                        format!("string of {} bytes exceeds 255", value.len()),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                for _ in 0..self.scope_stack.len() {
                    out.push_str("  ");
                }
                out.push_str(info.name);
                out.push_str(": ");
                out.push_str(&text::format_quoted_string(value));
                out.push('\n');
                self.bitpos += (1 + value.len()) * 8;
                Ok(())
            }
        }
    }

    /// Exactly `len` bytes, no length prefix.
    pub fn fixed_string(&mut self, value: &mut Vec<u8>, len: usize, info: FieldInfo) -> Result<()> {
        if self.bitpos % 8 != 0 {
            return Err(make_error(
                ErrorKind::Alignment,
                info,
                "fixed_string must start byte-aligned".to_string(),
                self.bitpos,
                self.bitlimit,
                &self.scope_stack,
            ));
        }
        match &mut self.mode {
            Mode::ParseBinary { data } => {
                let start_byte = self.bitpos / 8;
                let end_bit = (start_byte + len) * 8;
                if end_bit > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                value.clear();
                value.extend_from_slice(&data[start_byte..start_byte + len]);
                self.bitpos = end_bit;
                Ok(())
            }
            Mode::ConstructBinary { data } => {
                if value.len() != len {
                    return Err(make_error(
                        ErrorKind::ValueTooLarge,
                        info,
                        format!("fixed_string expected {} bytes, got {}", len, value.len()),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                let start_byte = self.bitpos / 8;
                let end_bit = (start_byte + len) * 8;
                if end_bit > self.bitlimit {
                    return Err(make_error(
                        ErrorKind::OutOfSpace,
                        info,
                        "out of space".to_string(),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                data[start_byte..start_byte + len].copy_from_slice(value);
                self.bitpos = end_bit;
                Ok(())
            }
            Mode::ParseText { text, pos } => {
                text::expect(*text, pos, info.name, info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                text::expect(*text, pos, ":", info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                let parsed = text::parse_quoted_string(*text, pos, info, self.bitpos, self.bitlimit, &self.scope_stack)?;
                if parsed.len() != len {
                    return Err(make_error(
                        ErrorKind::ValueTooLarge,
                        info,
                        format!("fixed_string expected {} bytes, got {}", len, parsed.len()),
                        self.bitpos,
                        self.bitlimit,
                        &self.scope_stack,
                    ));
                }
                self.bitpos += len * 8;
                *value = parsed;
                Ok(())
            }
            Mode::ConstructText { out } => {
                for _ in 0..self.scope_stack.len() {
                    out.push_str("  ");
                }
                out.push_str(info.name);
                out.push_str(": ");
                out.push_str(&text::format_quoted_string(value));
                out.push('\n');
                self.bitpos += len * 8;
                Ok(())
            }
        }
    }

    /// Reads (parse, comparing) or writes (construct, computing) a DVB CRC-32 over the
    /// bytes `[started_at, self.bitpos)`. No-op verification in text mode: the CRC is
    /// carried as a plain integer field there, per the external text format.
    pub fn crc32(&mut self, started_at: usize, crc: &mut u32, info: FieldInfo) -> Result<()> {
        if started_at % 8 != 0 || self.bitpos % 8 != 0 {
            return Err(make_error(
                ErrorKind::Alignment,
                info,
                "CRC block is not byte-aligned".to_string(),
                self.bitpos,
                self.bitlimit,
                &self.scope_stack,
            ));
        }
        let binary = self.is_binary();
        let parsing = self.is_parsing();
        let calculated = if binary {
            let bytes = (self.bitpos - started_at) / 8;
            let start_byte = started_at / 8;
            let data: &[u8] = match &self.mode {
                Mode::ParseBinary { data } => data,
                Mode::ConstructBinary { data } => data,
                _ => unreachable!("binary flag implies a binary mode variant"),
            };
            Some(dvb_crc32(&data[start_byte..start_byte + bytes]))
        } else {
            None
        };

        if binary && parsing {
            self.uint(32, crc, info)?;
            let calc = calculated.unwrap();
            if *crc != calc {
                return Err(make_error(
                    ErrorKind::CrcMismatch,
                    info,
                    format!("CRC mismatch: read={:08x} calculated={:08x}", crc, calc),
                    self.bitpos,
                    self.bitlimit,
                    &self.scope_stack,
                ));
            }
        } else if binary {
            *crc = calculated.unwrap();
            self.uint(32, crc, info)?;
        } else {
            self.uint(32, crc, info)?;
        }
        Ok(())
    }

    /// Recomputes and overwrites a CRC already written by [`Codec::crc32`], once later
    /// length fields that the CRC's own span covers have settled. No-op outside
    /// binary-construct mode.
    pub fn crc32_late_fix(&mut self, started_at: usize, crc_pos: usize, crc: &mut u32, info: FieldInfo) -> Result<()> {
        if started_at % 8 != 0 || crc_pos % 8 != 0 {
            return Err(make_error(
                ErrorKind::Alignment,
                info,
                "CRC block is not byte-aligned".to_string(),
                self.bitpos,
                self.bitlimit,
                &self.scope_stack,
            ));
        }
        if let Mode::ConstructBinary { data } = &mut self.mode {
            let bytes = (crc_pos - started_at) / 8;
            let start_byte = started_at / 8;
            let calculated = dvb_crc32(&data[start_byte..start_byte + bytes]);
            *crc = calculated;
            bits::write_bits(data, crc_pos, 32, calculated);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Hint;

    #[test]
    fn binary_roundtrip_uint_and_block() {
        let mut buf = [0u8; 8];
        {
            let mut c = Codec::construct_binary(&mut buf);
            let mut v = 42u32;
            c.uint(8, &mut v, field_info!("a")).unwrap();
            c.named_block_begin(8, field_info!("blk")).unwrap();
            let mut inner = 7u32;
            c.uint(8, &mut inner, field_info!("b")).unwrap();
            let len = c.named_block_end(field_info!("blk")).unwrap();
            assert_eq!(len, 1);
        }
        let mut c = Codec::parse_binary(&buf);
        let mut v = 0u32;
        c.uint(8, &mut v, field_info!("a")).unwrap();
        assert_eq!(v, 42);
        c.named_block_begin(8, field_info!("blk")).unwrap();
        let mut inner = 0u32;
        c.uint(8, &mut inner, field_info!("b")).unwrap();
        assert_eq!(inner, 7);
        c.named_block_end(field_info!("blk")).unwrap();
    }

    #[test]
    fn construct_binary_value_too_large_errors() {
        let mut buf = [0u8; 1];
        let mut c = Codec::construct_binary(&mut buf);
        let mut v = 16u32;
        let err = c.uint(4, &mut v, field_info!("x")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueTooLarge);
    }

    #[test]
    fn uint_req_mismatch_on_parse() {
        let buf = [0xAAu8];
        let mut c = Codec::parse_binary(&buf);
        let err = c.uint_req(8, 0x55, field_info!("x")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueMismatch);
    }

    #[test]
    fn unmatched_block_end_errors() {
        let buf = [0u8; 1];
        let mut c = Codec::parse_binary(&buf);
        let err = c.named_block_end(field_info!("x")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnmatchedBlockEnd);
    }

    #[test]
    fn text_construct_then_parse_roundtrip() {
        let mut c = Codec::construct_text();
        let mut v = 64u32;
        c.uint(8, &mut v, field_info_hint!("table_id", Hint::Decimal)).unwrap();
        c.named_block_begin(12, field_info!("descriptors_length")).unwrap();
        let mut tag = 0x41u32;
        c.uint(8, &mut tag, field_info_hint!("tag", Hint::Hex)).unwrap();
        c.named_block_end(field_info!("descriptors_length")).unwrap();
        let text = c.into_text();
        assert!(text.contains("table_id: 64"));
        assert!(text.contains("descriptors_length: {"));
        assert!(text.contains("tag: 0x41"));
        assert!(text.contains("}"));

        let mut c2 = Codec::parse_text(&text);
        let mut v2 = 0u32;
        c2.uint(8, &mut v2, field_info!("table_id")).unwrap();
        assert_eq!(v2, 64);
        c2.named_block_begin(12, field_info!("descriptors_length")).unwrap();
        let mut tag2 = 0u32;
        c2.uint(8, &mut tag2, field_info!("tag")).unwrap();
        assert_eq!(tag2, 0x41);
        c2.named_block_end(field_info!("descriptors_length")).unwrap();
    }

    #[test]
    fn crc_roundtrip_with_late_fix() {
        let mut buf = [0u8; 16];
        let crc_pos;
        {
            let mut c = Codec::construct_binary(&mut buf);
            let mut v = 1u32;
            c.uint(8, &mut v, field_info!("a")).unwrap();
            crc_pos = c.bitpos();
            let mut crc = 0u32;
            c.crc32(0, &mut crc, field_info!("crc")).unwrap();
            // simulate a later field settling after the CRC slot was written
            c.crc32_late_fix(0, crc_pos, &mut crc, field_info!("crc")).unwrap();
        }
        let mut c = Codec::parse_binary(&buf);
        let mut v = 0u32;
        c.uint(8, &mut v, field_info!("a")).unwrap();
        let mut crc = 0u32;
        c.crc32(0, &mut crc, field_info!("crc")).unwrap();
    }
}
