//! This crate provides tools and utilities for handling BER-TLV data as
//! defined in [ISO/IEC 8825-1][ber], the encoding most smart-card and
//! EMV/GlobalPlatform command/response payloads are built from.
//!
//! A [`Tlv`] is either primitive (opaque value bytes) or constructed
//! (an ordered list of child `Tlv`s) and owns its subtree outright —
//! there is no shared or aliased state between nodes. Build one with
//! [`Tlv::new_primitive`]/[`Tlv::new_constructed`], parse one from the
//! wire with [`Tlv::from_bytes`]/[`Tlv::parse`], or parse a bare
//! sequence of TLVs with no enclosing tag via [`Tlv::parse_stream`].
//!
//! The [`raw`] module offers the same lookups and mutations directly
//! over byte buffers, for callers editing a TLV in place inside a fixed
//! APDU buffer without paying for a tree parse. The [`template`] module
//! fills a skeleton tree's placeholder leaves from a tag-keyed map of
//! replacement values.
//!
//! [ber]: https://www.iso.org/standard/54522.html

#![deny(missing_docs)]

// internal organization
mod error;
mod length;
mod list;
mod octet;
pub mod raw;
mod tag;
pub mod template;
mod tlv;

// custom reexport (structs at same level for users)
pub use error::TlvError;
pub use length::MAX_LENGTH;
pub use list::TlvList;
pub use tag::{Class, Tag};
pub use tlv::Tlv;

/// This crate's result type: every fallible operation fails with a
/// [`TlvError`].
pub type Result<T> = std::result::Result<T, TlvError>;
