//! Error taxonomy for the codec engine.
//!
//! The extractor and packetizer are infallible by design (they self-heal or mask bad
//! input, logging through the `log` crate); `CodecError` is the sole fallible surface in
//! this crate.

use std::fmt;

/// Formatting hint attached to an integer field for textual I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Decimal,
    Hex,
    Binary,
}

/// Static, cheap-to-capture descriptor of a field being read or written.
///
/// Constructed via [`field_info!`] or [`field_info_hint!`], which capture
/// `file!()`/`line!()` at the call site the way the source's `DVB_INFO` macro captured
/// `__FILE__`/`__LINE__`.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    pub file: &'static str,
    pub line: u32,
    pub name: &'static str,
    pub hint: Hint,
}

impl FieldInfo {
    pub const fn new(file: &'static str, line: u32, name: &'static str) -> Self {
        FieldInfo { file, line, name, hint: Hint::Decimal }
    }

    pub const fn with_hint(file: &'static str, line: u32, name: &'static str, hint: Hint) -> Self {
        FieldInfo { file, line, name, hint }
    }
}

/// Captures `file!()`/`line!()` alongside a field name, with decimal formatting hint.
#[macro_export]
macro_rules! field_info {
    ($name:expr) => {
        $crate::FieldInfo::new(file!(), line!(), $name)
    };
}

/// Same as [`field_info!`] but with an explicit formatting [`Hint`].
#[macro_export]
macro_rules! field_info_hint {
    ($name:expr, $hint:expr) => {
        $crate::FieldInfo::with_hint(file!(), line!(), $name, $hint)
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OutOfSpace,
    Alignment,
    ValueTooLarge,
    ValueMismatch,
    CrcMismatch,
    LengthExceeded,
    UnexpectedToken,
    IllegalChar,
    StringTooLong,
    UnmatchedBlockEnd,
}

/// A snapshot of one open scope frame, taken at the moment an error is raised.
#[derive(Debug, Clone)]
pub struct ScopeSnapshot {
    pub name: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub bitpos_at_enter: usize,
    pub bitlimit_at_enter: usize,
}

/// A structured fault from the codec engine, carrying enough context to reproduce the
/// source's `Exception` message: cause, current position, originating location, and the
/// full open-scope trace (innermost first).
#[derive(Debug, Clone)]
pub struct CodecError {
    pub kind: ErrorKind,
    pub cause: String,
    pub info: FieldInfo,
    pub bitpos: usize,
    pub bitlimit: usize,
    pub scopes: Vec<ScopeSnapshot>,
}

fn byte_dot_bit(bits: usize) -> String {
    format!("{}.{}", bits / 8, bits % 8)
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} when parsing/building '{}' position {} limit {} declared in ({}:{})",
            self.cause,
            self.info.name,
            byte_dot_bit(self.bitpos),
            byte_dot_bit(self.bitlimit),
            self.info.file,
            self.info.line,
        )?;
        for scope in &self.scopes {
            write!(
                f,
                "\nin block '{}' position {} limit {} declared in ({}:{})",
                scope.name,
                byte_dot_bit(scope.bitpos_at_enter),
                byte_dot_bit(scope.bitlimit_at_enter),
                scope.file,
                scope.line,
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for CodecError {}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Builds a `CodecError`, snapshotting the scope stack innermost-first (matching the
/// source's `Exception` trace order). A free function rather than a `Codec` method so it
/// can be called from inside a `match &mut self.mode { .. }` arm without fighting the
/// borrow checker over a second borrow of `self`.
pub(crate) fn make_error(
    kind: ErrorKind,
    info: FieldInfo,
    cause: String,
    bitpos: usize,
    bitlimit: usize,
    scope_stack: &[crate::scope::ScopeFrame],
) -> CodecError {
    CodecError {
        kind,
        cause,
        info,
        bitpos,
        bitlimit,
        scopes: scope_stack
            .iter()
            .rev()
            .map(|f| ScopeSnapshot {
                name: f.info.name,
                file: f.info.file,
                line: f.info.line,
                bitpos_at_enter: f.bitpos_at_enter,
                bitlimit_at_enter: f.bitlimit_at_enter,
            })
            .collect(),
    }
}
