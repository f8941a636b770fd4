//! Error definition for BER-TLV data as defined in [ISO/IEC 8825-1][ber].
//!
//! [ber]: https://www.iso.org/standard/54522.html

use std::fmt;

/// Error definition for BER-TLV data.
///
/// A single coded error carries the reason a decode, encode, or tree
/// mutation failed. External consumers switch on the variant rather than
/// on a message string.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TlvError {
  /// Negative/out-of-range occurrence count, bad class, or an attempt to
  /// append a node to itself.
  InvalidParam,
  /// A tag's raw encoding would need more than 4 octets, or an encoded
  /// tag number is not representable (>= 32767).
  IllegalSize,
  /// An observer was called on a tag that was never initialized.
  EmptyTag,
  /// An observer was called on a TLV node that was never initialized.
  EmptyTlv,
  /// Tag bytes fail well-formedness (bad long-form continuation, etc.).
  MalformedTag,
  /// TLV bytes fail well-formedness (declared length inconsistent with
  /// the bytes actually read, wrong variant for the tag's constructed
  /// bit, and similar).
  MalformedTlv,
  /// A fixed-capacity buffer or child list would need to grow, but
  /// automatic expansion is disabled for it.
  InsufficientStorage,
  /// Reserved: a tag's raw size exceeds 127 octets. Not reachable for
  /// any input this crate accepts; kept for parity with the source
  /// error taxonomy.
  TagSizeTooLarge,
  /// A decoded long-form tag number exceeds the 32767 limit.
  TagNumberTooLarge,
  /// A composed TLV's total encoded size exceeds 32767.
  TlvSizeTooLarge,
  /// A decoded or encoded value length exceeds 32767.
  TlvLengthTooLarge,
  /// An input buffer ended before the bytes an operation needed were
  /// available. Distinct from `MalformedTlv`: this is a caller error
  /// (short buffer), not a data-format error.
  OutOfBounds,
  /// An operation required a non-empty buffer or tag and received an
  /// empty one.
  NullInput,
}

impl fmt::Display for TlvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::InvalidParam => "invalid parameter",
      Self::IllegalSize => "illegal tag or number size",
      Self::EmptyTag => "observer called on an uninitialized tag",
      Self::EmptyTlv => "observer called on an uninitialized TLV",
      Self::MalformedTag => "malformed tag bytes",
      Self::MalformedTlv => "malformed TLV bytes",
      Self::InsufficientStorage => "capacity exceeded and expansion disabled",
      Self::TagSizeTooLarge => "tag size greater than 127",
      Self::TagNumberTooLarge => "tag number greater than 32767",
      Self::TlvSizeTooLarge => "TLV size greater than 32767",
      Self::TlvLengthTooLarge => "TLV length greater than 32767",
      Self::OutOfBounds => "input buffer too short",
      Self::NullInput => "required buffer or tag was empty",
    };
    write!(f, "{s}")
  }
}

impl std::error::Error for TlvError {}

impl From<untrusted::EndOfInput> for TlvError {
  fn from(_: untrusted::EndOfInput) -> Self {
    Self::OutOfBounds
  }
}
