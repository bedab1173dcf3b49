//! Tokenizer and formatter for the textual wire format: `name: value` lines, `0x`/`0b`/
//! decimal integers, quoted escaped strings, and `{`/`}` block delimiters.
//!
//! Text is treated as ASCII (the external format is UTF-8 ASCII-only per the
//! specification), so byte offsets double as character offsets. Every function here
//! takes the current scope stack solely to attach it to any error it raises
//! ([`make_error`] snapshots it innermost-first).

use crate::error::{make_error, CodecError, ErrorKind, FieldInfo};
use crate::scope::ScopeFrame;

fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n'
}

/// Advances `pos` past any run of whitespace.
pub(crate) fn skip_ws(text: &[u8], pos: &mut usize) {
    while *pos < text.len() && is_ws(text[*pos]) {
        *pos += 1;
    }
}

/// Returns the next non-whitespace byte without consuming it, or `None` at end of input.
pub(crate) fn peek_nonws(text: &[u8], pos: usize) -> Option<u8> {
    let mut p = pos;
    skip_ws(text, &mut p);
    text.get(p).copied()
}

/// Consumes whitespace then the literal byte string `lit`, erroring if it is not found.
pub(crate) fn expect(
    text: &[u8],
    pos: &mut usize,
    lit: &str,
    info: FieldInfo,
    bitpos: usize,
    bitlimit: usize,
    scope_stack: &[ScopeFrame],
) -> Result<(), CodecError> {
    skip_ws(text, pos);
    let lit_bytes = lit.as_bytes();
    if *pos + lit_bytes.len() > text.len() || &text[*pos..*pos + lit_bytes.len()] != lit_bytes {
        return Err(make_error(
            ErrorKind::UnexpectedToken,
            info,
            format!("expected '{}'", lit),
            bitpos,
            bitlimit,
            scope_stack,
        ));
    }
    *pos += lit_bytes.len();
    Ok(())
}

fn hex_digit(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some(u32::from(c - b'0')),
        b'A'..=b'F' => Some(10 + u32::from(c - b'A')),
        b'a'..=b'f' => Some(10 + u32::from(c - b'a')),
        _ => None,
    }
}

/// Parses an unsigned integer token: `0x` hex, `0b` binary, else decimal. Errors if the
/// value does not fit in `bitsize` bits, matching the source's `read_dec`/`read_hex`/
/// `read_bin` bound check.
pub(crate) fn parse_uint_token(
    text: &[u8],
    pos: &mut usize,
    bitsize: u32,
    info: FieldInfo,
    bitpos: usize,
    bitlimit: usize,
    scope_stack: &[ScopeFrame],
) -> Result<u32, CodecError> {
    skip_ws(text, pos);
    let no_digits = |pos: usize| {
        make_error(
            ErrorKind::UnexpectedToken,
            info,
            format!("expected integer at byte {}", pos),
            bitpos,
            bitlimit,
            scope_stack,
        )
    };
    let too_large = |val: u64| {
        make_error(
            ErrorKind::ValueTooLarge,
            info,
            format!("value {} does not fit in {} bits", val, bitsize),
            bitpos,
            bitlimit,
            scope_stack,
        )
    };
    let check = |val: u64| -> Result<u32, CodecError> {
        if bitsize < 32 && val >= (1u64 << bitsize) {
            return Err(too_large(val));
        }
        Ok(val as u32)
    };

    if text[*pos..].starts_with(b"0x") || text[*pos..].starts_with(b"0X") {
        *pos += 2;
        let digits_start = *pos;
        let mut val: u64 = 0;
        while let Some(d) = text.get(*pos).copied().and_then(hex_digit) {
            val = val * 16 + u64::from(d);
            *pos += 1;
        }
        if *pos == digits_start {
            return Err(no_digits(digits_start));
        }
        check(val)
    } else if text[*pos..].starts_with(b"0b") || text[*pos..].starts_with(b"0B") {
        *pos += 2;
        let digits_start = *pos;
        let mut val: u64 = 0;
        while matches!(text.get(*pos), Some(b'0') | Some(b'1')) {
            val = val * 2 + u64::from(text[*pos] - b'0');
            *pos += 1;
        }
        if *pos == digits_start {
            return Err(no_digits(digits_start));
        }
        check(val)
    } else {
        let digits_start = *pos;
        let mut val: u64 = 0;
        while matches!(text.get(*pos), Some(b'0'..=b'9')) {
            val = val * 10 + u64::from(text[*pos] - b'0');
            *pos += 1;
        }
        if *pos == digits_start {
            return Err(no_digits(digits_start));
        }
        check(val)
    }
}

/// Formats `value` per `hint`, matching the textual grammar's value syntax.
pub(crate) fn format_uint_value(value: u32, hint: crate::error::Hint) -> String {
    use crate::error::Hint;
    match hint {
        Hint::Decimal => format!("{}", value),
        Hint::Hex => format!("0x{:x}", value),
        Hint::Binary => {
            if value == 0 {
                "0b0".to_string()
            } else {
                let mut s = String::from("0b");
                let bits = 32 - value.leading_zeros();
                for i in (0..bits).rev() {
                    s.push(if (value >> i) & 1 == 1 { '1' } else { '0' });
                }
                s
            }
        }
    }
}

/// Parses a single-quoted escaped string, consuming the opening and closing quotes.
/// Escapes: `\\`, `\'`, `\r`, `\n`, and three-digit octal `\NNN` for bytes outside
/// printable ASCII.
pub(crate) fn parse_quoted_string(
    text: &[u8],
    pos: &mut usize,
    info: FieldInfo,
    bitpos: usize,
    bitlimit: usize,
    scope_stack: &[ScopeFrame],
) -> Result<Vec<u8>, CodecError> {
    expect(text, pos, "'", info, bitpos, bitlimit, scope_stack)?;
    let mut out = Vec::new();
    loop {
        let unterminated = |cause: &str| {
            make_error(ErrorKind::UnexpectedToken, info, cause.to_string(), bitpos, bitlimit, scope_stack)
        };
        let illegal = |cause: String| make_error(ErrorKind::IllegalChar, info, cause, bitpos, bitlimit, scope_stack);

        let c = *text.get(*pos).ok_or_else(|| unterminated("unterminated string"))?;
        *pos += 1;
        if c == b'\'' {
            break;
        }
        if c == b'\\' {
            let e = *text.get(*pos).ok_or_else(|| unterminated("unterminated escape"))?;
            *pos += 1;
            match e {
                b'\'' | b'\\' | b'\r' | b'\n' => out.push(e),
                b'0'..=b'7' => {
                    let mut val: u32 = u32::from(e - b'0');
                    for _ in 0..2 {
                        let d = *text.get(*pos).ok_or_else(|| illegal("truncated octal escape".to_string()))?;
                        if !(b'0'..=b'7').contains(&d) {
                            return Err(illegal(format!("illegal char in octal escape `\\{}`", d as char)));
                        }
                        val = val * 8 + u32::from(d - b'0');
                        *pos += 1;
                    }
                    if val > 255 {
                        return Err(illegal("octal escape value too big".to_string()));
                    }
                    out.push(val as u8);
                }
                _ => return Err(illegal(format!("illegal char `\\{}`", e as char))),
            }
            continue;
        }
        if (32..127).contains(&c) {
            out.push(c);
            continue;
        }
        return Err(illegal(format!("illegal char `{:#o}`", c)));
    }
    Ok(out)
}

/// Formats `bytes` as a single-quoted escaped string (without surrounding field name).
pub(crate) fn format_quoted_string(bytes: &[u8]) -> String {
    let mut s = String::from("'");
    for &c in bytes {
        match c {
            b'\'' | b'\\' | b'\r' | b'\n' => {
                s.push('\\');
                s.push(c as char);
            }
            32..=126 => s.push(c as char),
            _ => {
                s.push('\\');
                s.push(char::from(b'0' + ((c >> 6) & 0x7)));
                s.push(char::from(b'0' + ((c >> 3) & 0x7)));
                s.push(char::from(b'0' + (c & 0x7)));
            }
        }
    }
    s.push('\'');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Hint;

    fn info() -> FieldInfo {
        field_info!("x")
    }

    #[test]
    fn parses_hex_binary_and_decimal() {
        let mut pos = 0;
        assert_eq!(parse_uint_token(b"0x2A", &mut pos, 32, info(), 0, 1000, &[]).unwrap(), 42);
        pos = 0;
        assert_eq!(parse_uint_token(b"0b101010", &mut pos, 32, info(), 0, 1000, &[]).unwrap(), 42);
        pos = 0;
        assert_eq!(parse_uint_token(b"42", &mut pos, 32, info(), 0, 1000, &[]).unwrap(), 42);
    }

    #[test]
    fn hex_digits_above_nine_are_correct() {
        let mut pos = 0;
        assert_eq!(parse_uint_token(b"0xAB", &mut pos, 32, info(), 0, 1000, &[]).unwrap(), 0xAB);
        pos = 0;
        assert_eq!(parse_uint_token(b"0xab", &mut pos, 32, info(), 0, 1000, &[]).unwrap(), 0xAB);
    }

    #[test]
    fn value_exceeding_bitsize_is_rejected() {
        let mut pos = 0;
        let err = parse_uint_token(b"0x100", &mut pos, 8, info(), 0, 1000, &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueTooLarge);
    }

    #[test]
    fn formats_match_hint() {
        assert_eq!(format_uint_value(42, Hint::Decimal), "42");
        assert_eq!(format_uint_value(42, Hint::Hex), "0x2a");
        assert_eq!(format_uint_value(5, Hint::Binary), "0b101");
    }

    #[test]
    fn string_escape_roundtrip() {
        let raw = b"it's\\a\ttest\x01".to_vec();
        let formatted = format_quoted_string(&raw);
        let mut pos = 0;
        let parsed = parse_quoted_string(formatted.as_bytes(), &mut pos, info(), 0, 1000, &[]).unwrap();
        assert_eq!(parsed, raw);
    }
}
