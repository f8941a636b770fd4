//! The TLV node model (spec.md §4.3) and the recursive parser/factory
//! that builds it from bytes (spec.md §4.5).
//!
//! A node is a tagged variant: [`Tlv::Primitive`] owns opaque value
//! bytes, [`Tlv::Constructed`] owns an ordered list of child nodes and
//! has no byte buffer of its own (spec.md §9, "Polymorphism"). Common
//! observers dispatch on the variant; operations that only make sense
//! for one variant fail with `INVALID_PARAM` on the other.

use std::fmt;

use crate::length::{self, MAX_LENGTH};
use crate::list::TlvList;
use crate::tag::Tag;
use crate::{Result, TlvError};

/// A primitive TLV: a tag plus its opaque value bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
  tag: Tag,
  value: Vec<u8>,
  capacity: Option<usize>,
}

impl Primitive {
  /// The value bytes.
  #[must_use]
  pub fn value(&self) -> &[u8] {
    &self.value
  }
}

/// A constructed TLV: a tag plus its ordered child nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Constructed {
  tag: Tag,
  children: TlvList,
}

impl Constructed {
  /// The child nodes, in order.
  #[must_use]
  pub fn children(&self) -> &TlvList {
    &self.children
  }
}

/// A BER-TLV data object: either [`Primitive`] or [`Constructed`].
///
/// > Each BER-TLV data object consists of two or three consecutive
/// > fields: a mandatory tag field, a mandatory length field and a
/// > conditional value field. If the length is zero, there is no value
/// > field.
#[derive(Clone, Debug, PartialEq)]
pub enum Tlv {
  /// Primitive data object; the value is opaque bytes.
  Primitive(Primitive),
  /// Constructed data object; the value is the concatenation of child
  /// TLVs' own encodings.
  Constructed(Constructed),
}

impl Tlv {
  /// Builds a primitive TLV. `value` may grow later via
  /// [`Tlv::append_value`]/[`Tlv::replace_value`].
  ///
  /// # Errors
  /// `MalformedTlv` if `tag`'s constructed bit is set.
  /// `TlvLengthTooLarge` if `value` is already longer than 32767.
  pub fn new_primitive(tag: Tag, value: Vec<u8>) -> Result<Self> {
    if tag.is_constructed() {
      return Err(TlvError::MalformedTlv);
    }
    if value.len() > MAX_LENGTH {
      return Err(TlvError::TlvLengthTooLarge);
    }
    Ok(Self::Primitive(Primitive { tag, value, capacity: None }))
  }

  /// Builds a primitive TLV whose value buffer refuses to grow past
  /// `capacity` (the "automatic expansion disabled" mode of spec.md
  /// §5).
  ///
  /// # Errors
  /// `MalformedTlv` if `tag`'s constructed bit is set.
  pub fn with_capacity_primitive(tag: Tag, capacity: usize) -> Result<Self> {
    if tag.is_constructed() {
      return Err(TlvError::MalformedTlv);
    }
    Ok(Self::Primitive(Primitive {
      tag,
      value: Vec::with_capacity(capacity),
      capacity: Some(capacity),
    }))
  }

  /// Builds a constructed TLV from already-built children.
  ///
  /// # Errors
  /// `MalformedTlv` if `tag`'s constructed bit is clear.
  /// `InsufficientStorage` is unreachable here since the backing list
  /// is growable; it can only arise via
  /// [`Tlv::with_capacity_constructed`].
  pub fn new_constructed(tag: Tag, children: Vec<Tlv>) -> Result<Self> {
    if !tag.is_constructed() {
      return Err(TlvError::MalformedTlv);
    }
    let mut list = TlvList::new();
    for child in children {
      list.append(child)?;
    }
    Ok(Self::Constructed(Constructed { tag, children: list }))
  }

  /// Builds an empty constructed TLV whose child list refuses to grow
  /// past `capacity`.
  ///
  /// # Errors
  /// `MalformedTlv` if `tag`'s constructed bit is clear.
  pub fn with_capacity_constructed(tag: Tag, capacity: usize) -> Result<Self> {
    if !tag.is_constructed() {
      return Err(TlvError::MalformedTlv);
    }
    Ok(Self::Constructed(Constructed {
      tag,
      children: TlvList::fixed(capacity),
    }))
  }

  /// The node's tag.
  #[must_use]
  pub fn tag(&self) -> &Tag {
    match self {
      Self::Primitive(p) => &p.tag,
      Self::Constructed(c) => &c.tag,
    }
  }

  /// Whether this is a [`Tlv::Constructed`] node.
  #[must_use]
  pub fn is_constructed(&self) -> bool {
    matches!(self, Self::Constructed(_))
  }

  /// Byte length of the value field: the raw value for a primitive, or
  /// the sum of the children's own [`Tlv::size`] for a constructed
  /// node (spec.md §4.4's `dataLength`, inclusive of its over-32767
  /// per-child exclusion quirk).
  ///
  /// # Errors
  /// `TlvLengthTooLarge` if the length exceeds 32767.
  pub fn length(&self) -> Result<usize> {
    let len = match self {
      Self::Primitive(p) => p.value.len(),
      Self::Constructed(c) => c.children.data_length(),
    };
    if len > MAX_LENGTH {
      return Err(TlvError::TlvLengthTooLarge);
    }
    Ok(len)
  }

  /// Total encoded size: tag octets + length-prefix octets + value
  /// octets.
  ///
  /// # Errors
  /// As per [`Tlv::length`], plus `TlvSizeTooLarge` if the total
  /// itself exceeds 32767.
  pub fn size(&self) -> Result<usize> {
    let len = self.length()?;
    let total = self.tag().len() + length::length_of_length(len as u32) + len;
    if total > MAX_LENGTH {
      return Err(TlvError::TlvSizeTooLarge);
    }
    Ok(total)
  }

  /// Serializes this node at `off` in `out`: tag, length prefix, then
  /// the body (value bytes, or children's own encodings in order).
  /// Returns the number of bytes written.
  ///
  /// # Errors
  /// As per [`Tlv::length`]. `OutOfBounds` if `out` is too short.
  pub fn write(&self, out: &mut [u8], off: usize) -> Result<usize> {
    let len = self.length()?;
    let mut pos = off;
    pos += self.tag().write(out, pos)?;
    pos += length::encode(len as u32, out, pos)?;
    match self {
      Self::Primitive(p) => {
        crate::octet::copy_bounded(&p.value, 0, out, pos, len)?;
        pos += len;
      }
      Self::Constructed(c) => {
        pos += c.children.write_data(out, pos)?;
      }
    }
    Ok(pos - off)
  }

  /// Serializes this node into a freshly allocated vector.
  ///
  /// # Errors
  /// As per [`Tlv::size`] and [`Tlv::write`].
  pub fn to_vec(&self) -> Result<Vec<u8>> {
    let size = self.size()?;
    let mut out = vec![0u8; size];
    self.write(&mut out, 0)?;
    Ok(out)
  }

  /// Appends `bytes` to this node's value.
  ///
  /// # Errors
  /// `InvalidParam` if this is a [`Tlv::Constructed`] node.
  /// `InsufficientStorage` if a fixed capacity would be exceeded.
  /// `TlvLengthTooLarge` if the result would exceed 32767 bytes.
  pub fn append_value(&mut self, bytes: &[u8]) -> Result<()> {
    match self {
      Self::Primitive(p) => {
        let new_len = p.value.len() + bytes.len();
        if let Some(cap) = p.capacity {
          if new_len > cap {
            return Err(TlvError::InsufficientStorage);
          }
        }
        if new_len > MAX_LENGTH {
          return Err(TlvError::TlvLengthTooLarge);
        }
        p.value.extend_from_slice(bytes);
        Ok(())
      }
      Self::Constructed(_) => Err(TlvError::InvalidParam),
    }
  }

  /// Replaces this node's value outright.
  ///
  /// # Errors
  /// As per [`Tlv::append_value`].
  pub fn replace_value(&mut self, bytes: &[u8]) -> Result<()> {
    match self {
      Self::Primitive(p) => {
        if let Some(cap) = p.capacity {
          if bytes.len() > cap {
            return Err(TlvError::InsufficientStorage);
          }
        }
        if bytes.len() > MAX_LENGTH {
          return Err(TlvError::TlvLengthTooLarge);
        }
        p.value = bytes.to_vec();
        Ok(())
      }
      Self::Constructed(_) => Err(TlvError::InvalidParam),
    }
  }

  /// Copies this node's value into `out` at `off`.
  ///
  /// # Errors
  /// `InvalidParam` if this is a [`Tlv::Constructed`] node.
  pub fn get_value(&self, out: &mut [u8], off: usize) -> Result<usize> {
    match self {
      Self::Primitive(p) => {
        crate::octet::copy_bounded(&p.value, 0, out, off, p.value.len())?;
        Ok(p.value.len())
      }
      Self::Constructed(_) => Err(TlvError::InvalidParam),
    }
  }

  /// Borrows this node's value directly, without copying.
  ///
  /// # Errors
  /// `InvalidParam` if this is a [`Tlv::Constructed`] node.
  pub fn value(&self) -> Result<&[u8]> {
    match self {
      Self::Primitive(p) => Ok(&p.value),
      Self::Constructed(_) => Err(TlvError::InvalidParam),
    }
  }

  /// Appends `child` to this node's children.
  ///
  /// # Errors
  /// `InvalidParam` if this is a [`Tlv::Primitive`] node, or if the
  /// fixed capacity (if any) of the child list is already full.
  ///
  /// Self-appending a node to itself is not representable in this
  /// owned-tree model (a node cannot be moved into its own child list
  /// while also being mutated through `self`), so unlike the source
  /// this never needs a runtime cycle check.
  pub fn append(&mut self, child: Tlv) -> Result<()> {
    match self {
      Self::Constructed(c) => c.children.append(child),
      Self::Primitive(_) => Err(TlvError::InvalidParam),
    }
  }

  /// Removes and returns the `occurrence`-th (1-based) child whose tag
  /// equals `tag`.
  ///
  /// # Errors
  /// `InvalidParam` if this is a [`Tlv::Primitive`] node,
  /// `occurrence <= 0`, or no such occurrence exists.
  pub fn delete(&mut self, tag: &Tag, occurrence: i32) -> Result<Tlv> {
    match self {
      Self::Constructed(c) => c.children.delete(tag, occurrence),
      Self::Primitive(_) => Err(TlvError::InvalidParam),
    }
  }

  /// The first child matching `tag` (or the first child at all, if
  /// `tag` is `None`).
  ///
  /// # Errors
  /// `InvalidParam` if this is a [`Tlv::Primitive`] node.
  pub fn find(&self, tag: Option<&Tag>) -> Result<Option<&Tlv>> {
    match self {
      Self::Constructed(c) => Ok(c.children.find(tag)),
      Self::Primitive(_) => Err(TlvError::InvalidParam),
    }
  }

  /// The `occurrence`-th (1-based) match for `tag` found after `after`.
  ///
  /// # Errors
  /// `InvalidParam` if this is a [`Tlv::Primitive`] node, `after` is
  /// not one of this node's children, or `occurrence <= 0`.
  pub fn find_next(&self, tag: Option<&Tag>, after: &Tlv, occurrence: i32) -> Result<Option<&Tlv>> {
    match self {
      Self::Constructed(c) => c.children.find_next(tag, after, occurrence),
      Self::Primitive(_) => Err(TlvError::InvalidParam),
    }
  }

  /// Borrows this node's children.
  ///
  /// # Errors
  /// `InvalidParam` if this is a [`Tlv::Primitive`] node.
  pub fn children(&self) -> Result<&TlvList> {
    match self {
      Self::Constructed(c) => Ok(&c.children),
      Self::Primitive(_) => Err(TlvError::InvalidParam),
    }
  }

  /// Reads one TLV starting at `off` in `buf`. Returns the node and
  /// the number of bytes it occupies, recursing into children for a
  /// constructed tag.
  ///
  /// # Errors
  /// `OutOfBounds` if `buf` ends before the declared length does.
  /// `MalformedTlv` if a child's declared size overruns its parent.
  /// Plus whatever [`Tag::read`]/length decoding report.
  pub fn parse_one(buf: &[u8], off: usize) -> Result<(Self, usize)> {
    let (tag, tag_size) = Tag::read(buf, off)?;
    let (len, len_size) = length::decode(buf, off + tag_size)?;
    if len > MAX_LENGTH {
      return Err(TlvError::TlvLengthTooLarge);
    }
    let data_off = off + tag_size + len_size;
    let data_end = data_off.checked_add(len).ok_or(TlvError::OutOfBounds)?;
    if data_end > buf.len() {
      return Err(TlvError::OutOfBounds);
    }
    let node = if tag.is_constructed() {
      let children = TlvList::init(buf, data_off, len)?;
      Self::Constructed(Constructed { tag, children })
    } else {
      Self::Primitive(Primitive {
        tag,
        value: buf[data_off..data_end].to_vec(),
        capacity: None,
      })
    };
    Ok((node, tag_size + len_size + len))
  }

  /// Parses a byte slice into a single TLV, returning it along with
  /// whatever bytes were left unconsumed.
  #[must_use]
  pub fn parse(input: &[u8]) -> (Result<Self>, &[u8]) {
    match Self::parse_one(input, 0) {
      Ok((node, consumed)) => (Ok(node), &input[consumed..]),
      Err(e) => (Err(e), input),
    }
  }

  /// Parses a byte slice that must contain exactly one TLV, with no
  /// trailing bytes.
  ///
  /// # Errors
  /// `MalformedTlv` if any bytes are left over. Otherwise as per
  /// [`Tlv::parse_one`].
  pub fn from_bytes(input: &[u8]) -> Result<Self> {
    let (result, rest) = Self::parse(input);
    let node = result?;
    if !rest.is_empty() {
      return Err(TlvError::MalformedTlv);
    }
    Ok(node)
  }

  /// Whether `buf` is parseable as a single well-formed TLV with no
  /// trailing bytes.
  ///
  /// This implements the *intended* semantics spec.md §9 calls for
  /// ("true iff parseable without error") rather than the inverted
  /// behavior the source exhibits.
  #[must_use]
  pub fn verify_format(buf: &[u8]) -> bool {
    Self::from_bytes(buf).is_ok()
  }

  /// Parses `buf` as a sequential stream of zero or more concatenated
  /// TLVs with no enclosing tag (spec.md §4.4), e.g. a Select-AID
  /// response listing several application templates back to back.
  ///
  /// # Errors
  /// As per [`TlvList::init`].
  pub fn parse_stream(buf: &[u8]) -> Result<TlvList> {
    TlvList::init(buf, 0, buf.len())
  }

  /// A human-readable, indented rendering of this node and its
  /// children. Indentation is `+-- ` at the first level and four
  /// spaces per additional level, as spec.md §6 specifies; the exact
  /// text is not part of the contract.
  #[must_use]
  pub fn describe(&self, level: usize) -> String {
    let mut out = String::new();
    let prefix = format!("{}+-- ", "    ".repeat(level));
    out.push_str(&prefix);
    out.push_str(&self.tag().to_string());
    match self {
      Self::Primitive(p) => {
        out.push_str(&format!(" len={} value=", p.value.len()));
        for b in &p.value {
          out.push_str(&format!("{b:02X}"));
        }
        out.push('\n');
      }
      Self::Constructed(c) => {
        out.push('\n');
        for child in c.children.iter() {
          out.push_str(&child.describe(level + 1));
        }
      }
    }
    out
  }
}

impl fmt::Display for Tlv {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.describe(0))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tag::Class;
  use rand_core::{RngCore, SeedableRng};

  #[test]
  fn parse_810100() {
    // spec.md §8 scenario 1.
    let (result, rest) = Tlv::parse(&[0x81, 0x01, 0x00]);
    let tlv = result.unwrap();
    assert!(rest.is_empty());
    assert_eq!(1, tlv.tag().number());
    assert!(!tlv.is_constructed());
    assert_eq!(1, tlv.length().unwrap());
    assert_eq!(&[0x00], tlv.value().unwrap());
  }

  #[test]
  fn primitive_append_value_scenario() {
    // spec.md §8 scenario 3.
    let tag = Tag::new(Class::Private, false, 8).unwrap();
    let mut tlv = Tlv::new_primitive(tag, vec![0x00]).unwrap();
    tlv.append_value(&[0x12, 0x34, 0x56, 0x78]).unwrap();
    assert_eq!(vec![0xC8, 0x05, 0x00, 0x12, 0x34, 0x56, 0x78], tlv.to_vec().unwrap());
  }

  #[test]
  fn primitive_replace_value_scenario() {
    // spec.md §8 scenario 4.
    let tag = Tag::new(Class::Private, false, 8).unwrap();
    let mut tlv = Tlv::new_primitive(tag, vec![0x00]).unwrap();
    tlv.replace_value(&[0x12, 0x34, 0x56, 0x78]).unwrap();
    assert_eq!(vec![0xC8, 0x04, 0x12, 0x34, 0x56, 0x78], tlv.to_vec().unwrap());
  }

  #[test]
  fn round_trip_parse_to_vec() {
    let bytes = hex_literal::hex!("7F 22 03 80 01 AA");
    let tlv = Tlv::from_bytes(&bytes).unwrap();
    assert_eq!(bytes.to_vec(), tlv.to_vec().unwrap());
  }

  #[test]
  fn size_identity_holds_for_constructed_nodes() {
    let leaf = Tlv::new_primitive(Tag::new(Class::ContextSpecific, false, 1).unwrap(), vec![0, 1]).unwrap();
    let parent = Tlv::new_constructed(Tag::new(Class::Application, true, 2).unwrap(), vec![leaf.clone(), leaf]).unwrap();
    let child_sum: usize = parent.children().unwrap().iter().map(|c| c.size().unwrap()).sum();
    assert_eq!(child_sum, parent.length().unwrap());
    assert_eq!(parent.tag().len() + 1 + child_sum, parent.size().unwrap());
  }

  #[test]
  fn wrong_variant_operations_fail_with_invalid_param() {
    let mut primitive = Tlv::new_primitive(Tag::new(Class::Universal, false, 1).unwrap(), vec![]).unwrap();
    assert_eq!(Err(TlvError::InvalidParam), primitive.append(primitive.clone()));
    assert_eq!(Err(TlvError::InvalidParam), primitive.find(None));

    let mut constructed = Tlv::new_constructed(Tag::new(Class::Universal, true, 1).unwrap(), vec![]).unwrap();
    assert_eq!(Err(TlvError::InvalidParam), constructed.append_value(&[0]));
    assert_eq!(Err(TlvError::InvalidParam), constructed.replace_value(&[0]));
  }

  #[test]
  fn constructor_rejects_mismatched_constructed_bit() {
    let primitive_tag = Tag::new(Class::Universal, false, 1).unwrap();
    assert_eq!(Err(TlvError::MalformedTlv), Tlv::new_constructed(primitive_tag, vec![]));
    let constructed_tag = Tag::new(Class::Universal, true, 1).unwrap();
    assert_eq!(Err(TlvError::MalformedTlv), Tlv::new_primitive(constructed_tag, vec![]));
  }

  #[test]
  fn from_bytes_rejects_trailing_data() {
    let bytes = [0x80u8, 0x01, 0x00, 0xFF];
    assert_eq!(Err(TlvError::MalformedTlv), Tlv::from_bytes(&bytes));
  }

  #[test]
  fn verify_format_matches_parseability() {
    assert!(Tlv::verify_format(&[0x80, 0x01, 0x00]));
    assert!(!Tlv::verify_format(&[0x80, 0x05, 0x00]));
    assert!(!Tlv::verify_format(&[0x80, 0x01, 0x00, 0xFF]));
  }

  #[test]
  fn capacity_limited_primitive_reports_insufficient_storage() {
    let tag = Tag::new(Class::Universal, false, 1).unwrap();
    let mut tlv = Tlv::with_capacity_primitive(tag, 2).unwrap();
    tlv.append_value(&[1, 2]).unwrap();
    assert_eq!(Err(TlvError::InsufficientStorage), tlv.append_value(&[3]));
  }

  #[test]
  fn capacity_limited_constructed_reports_insufficient_storage() {
    let tag = Tag::new(Class::Universal, true, 1).unwrap();
    let mut tlv = Tlv::with_capacity_constructed(tag, 1).unwrap();
    let leaf = Tlv::new_primitive(Tag::new(Class::ContextSpecific, false, 1).unwrap(), vec![0]).unwrap();
    tlv.append(leaf.clone()).unwrap();
    assert_eq!(Err(TlvError::InsufficientStorage), tlv.append(leaf));
  }

  #[test]
  fn serialize_then_parse_round_trips_for_random_tags_and_values() {
    let mut rng = rand_xorshift::XorShiftRng::seed_from_u64(10);
    for number in 1_u16..200 {
      let value_len = (rng.next_u32() % 300) as usize;
      let value: Vec<u8> = (0..value_len).map(|_| rng.next_u32() as u8).collect();
      let tag = Tag::new(Class::ContextSpecific, false, number).unwrap();
      let tlv = Tlv::new_primitive(tag, value.clone()).unwrap();
      let encoded = tlv.to_vec().unwrap();
      let decoded = Tlv::from_bytes(&encoded).unwrap();
      assert_eq!(tlv, decoded);
      assert_eq!(&value, decoded.value().unwrap());
    }
  }

  #[test]
  fn describe_indents_children_one_level_deeper() {
    let leaf = Tlv::new_primitive(Tag::new(Class::ContextSpecific, false, 1).unwrap(), vec![0xAA]).unwrap();
    let parent = Tlv::new_constructed(Tag::new(Class::Application, true, 2).unwrap(), vec![leaf]).unwrap();
    let text = parent.describe(0);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("+-- "));
    assert!(lines[1].starts_with("    +-- "));
  }
}
