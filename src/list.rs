//! Ordered, resizable collection of TLV nodes (spec.md §4.4).
//!
//! A single list type backs both a constructed node's children and a
//! standalone top-level sequence of TLVs with no enclosing tag — the
//! two are the same shape, spec.md §9 ("Sequential vs constructed")
//! asks for one shared type rather than two.

use crate::length::MAX_LENGTH;
use crate::tag::Tag;
use crate::tlv::Tlv;
use crate::{Result, TlvError};

/// An ordered list of [`Tlv`] nodes.
///
/// Growable by default, like any `Vec`. [`TlvList::fixed`] opts into a
/// capacity ceiling past which [`TlvList::append`] fails with
/// `INSUFFICIENT_STORAGE` instead of reallocating — the "automatic
/// expansion disabled" mode spec.md §5 describes.
#[derive(Clone, Debug, PartialEq)]
pub struct TlvList {
  items: Vec<Tlv>,
  capacity: Option<usize>,
}

impl TlvList {
  /// An empty, growable list.
  #[must_use]
  pub fn new() -> Self {
    Self { items: Vec::new(), capacity: None }
  }

  /// An empty, growable list with `capacity` pre-reserved.
  #[must_use]
  pub fn with_capacity(capacity: usize) -> Self {
    Self { items: Vec::with_capacity(capacity), capacity: None }
  }

  /// An empty list that refuses to grow past `capacity`.
  #[must_use]
  pub fn fixed(capacity: usize) -> Self {
    Self { items: Vec::with_capacity(capacity), capacity: Some(capacity) }
  }

  /// Number of children currently held.
  #[must_use]
  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// Whether the list holds no children.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Iterates over the children in order.
  pub fn iter(&self) -> std::slice::Iter<'_, Tlv> {
    self.items.iter()
  }

  /// Appends `child`.
  ///
  /// # Errors
  /// `InsufficientStorage` if this list has a fixed capacity and is
  /// already full.
  pub fn append(&mut self, child: Tlv) -> Result<()> {
    if let Some(cap) = self.capacity {
      if self.items.len() >= cap {
        return Err(TlvError::InsufficientStorage);
      }
    }
    self.items.push(child);
    Ok(())
  }

  /// Removes and returns the `occurrence`-th (1-based) child whose tag
  /// equals `tag`, shifting later children down.
  ///
  /// # Errors
  /// `InvalidParam` if `occurrence <= 0` or no such occurrence exists.
  pub fn delete(&mut self, tag: &Tag, occurrence: i32) -> Result<Tlv> {
    if occurrence <= 0 {
      return Err(TlvError::InvalidParam);
    }
    let mut remaining = occurrence;
    let mut found = None;
    for (i, item) in self.items.iter().enumerate() {
      if item.tag() == tag {
        remaining -= 1;
        if remaining == 0 {
          found = Some(i);
          break;
        }
      }
    }
    let idx = found.ok_or(TlvError::InvalidParam)?;
    Ok(self.items.remove(idx))
  }

  /// The first child matching `tag`, or the very first child if `tag`
  /// is `None`.
  #[must_use]
  pub fn find(&self, tag: Option<&Tag>) -> Option<&Tlv> {
    match tag {
      None => self.items.first(),
      Some(t) => self.items.iter().find(|c| c.tag() == t),
    }
  }

  /// The `occurrence`-th (1-based) child matching `tag` found strictly
  /// after `after` in iteration order (or, if `tag` is `None`, simply
  /// the `occurrence`-th child after `after`).
  ///
  /// # Errors
  /// `InvalidParam` if `after` is not one of this list's children, or
  /// `occurrence <= 0`.
  pub fn find_next(&self, tag: Option<&Tag>, after: &Tlv, occurrence: i32) -> Result<Option<&Tlv>> {
    if occurrence <= 0 {
      return Err(TlvError::InvalidParam);
    }
    let start = self
      .items
      .iter()
      .position(|c| std::ptr::eq(c, after))
      .ok_or(TlvError::InvalidParam)?;
    let mut remaining = occurrence;
    for item in &self.items[start + 1..] {
      let is_match = match tag {
        None => true,
        Some(t) => item.tag() == t,
      };
      if is_match {
        remaining -= 1;
        if remaining == 0 {
          return Ok(Some(item));
        }
      }
    }
    Ok(None)
  }

  /// Serializes children in order at `off` in `out`. Returns the
  /// number of bytes written.
  pub fn write_data(&self, out: &mut [u8], off: usize) -> Result<usize> {
    let mut pos = off;
    for item in &self.items {
      pos += item.write(out, pos)?;
    }
    Ok(pos - off)
  }

  /// Sum of the children's encoded [`Tlv::size`].
  ///
  /// Preserves a documented quirk (spec.md §9, §4.4): a child whose own
  /// size would exceed 32767 — or that otherwise fails to compute a
  /// size at all — is silently excluded from the sum rather than
  /// propagating an error. The parent's own `size()` still reports
  /// `TLV_LENGTH_GREATER_THAN_32767`/`TLV_SIZE_GREATER_THAN_32767` in
  /// the ordinary way if the (correctly excluding) total itself is too
  /// large.
  #[must_use]
  pub fn data_length(&self) -> usize {
    self
      .items
      .iter()
      .filter_map(|c| match c.size() {
        Ok(s) if s <= MAX_LENGTH => Some(s),
        _ => None,
      })
      .sum()
  }

  /// Parses `len` bytes starting at `off` in `buf` as a sequence of
  /// TLVs, appending each to a freshly built list. A lone `0x00`
  /// end-of-content octet between children is skipped rather than
  /// parsed as a tag (spec.md glossary, "EOC octet").
  ///
  /// # Errors
  /// `OutOfBounds` if `buf` is shorter than `off + len`.
  /// `MalformedTlv` if a child's declared size does not fit evenly
  /// within the remaining bytes.
  pub fn init(buf: &[u8], off: usize, len: usize) -> Result<Self> {
    let end = off.checked_add(len).ok_or(TlvError::OutOfBounds)?;
    if end > buf.len() {
      return Err(TlvError::OutOfBounds);
    }
    let mut items = Vec::new();
    let mut pos = off;
    while pos < end {
      if buf[pos] == 0x00 {
        pos += 1;
        continue;
      }
      let (child, consumed) = Tlv::parse_one(buf, pos)?;
      pos += consumed;
      if pos > end {
        return Err(TlvError::MalformedTlv);
      }
      items.push(child);
    }
    Ok(Self { items, capacity: None })
  }
}

impl Default for TlvList {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tag::Class;

  fn leaf(number: u16, value: &[u8]) -> Tlv {
    Tlv::new_primitive(Tag::new(Class::ContextSpecific, false, number).unwrap(), value.to_vec()).unwrap()
  }

  #[test]
  fn append_respects_fixed_capacity() {
    let mut list = TlvList::fixed(1);
    list.append(leaf(1, &[0])).unwrap();
    assert_eq!(Err(TlvError::InsufficientStorage), list.append(leaf(2, &[0])));
  }

  #[test]
  fn with_capacity_preallocates_but_still_grows_freely() {
    let mut list = TlvList::with_capacity(1);
    assert!(list.is_empty());
    list.append(leaf(1, &[0])).unwrap();
    list.append(leaf(2, &[0])).unwrap();
    list.append(leaf(3, &[0])).unwrap();
    assert_eq!(3, list.len());
  }

  #[test]
  fn delete_rejects_non_positive_occurrence() {
    let mut list = TlvList::new();
    list.append(leaf(1, &[0])).unwrap();
    let tag = Tag::new(Class::ContextSpecific, false, 1).unwrap();
    assert_eq!(Err(TlvError::InvalidParam), list.delete(&tag, 0));
    assert_eq!(Err(TlvError::InvalidParam), list.delete(&tag, -1));
  }

  #[test]
  fn delete_removes_nth_occurrence_and_shifts() {
    let mut list = TlvList::new();
    list.append(leaf(1, &[1])).unwrap();
    list.append(leaf(1, &[2])).unwrap();
    list.append(leaf(1, &[3])).unwrap();
    let tag = Tag::new(Class::ContextSpecific, false, 1).unwrap();
    let removed = list.delete(&tag, 2).unwrap();
    assert_eq!(&[2], removed.value().unwrap());
    assert_eq!(2, list.len());
    assert_eq!(&[1], list.find(Some(&tag)).unwrap().value().unwrap());
  }

  #[test]
  fn find_with_no_tag_returns_first_child() {
    let mut list = TlvList::new();
    list.append(leaf(1, &[1])).unwrap();
    list.append(leaf(2, &[2])).unwrap();
    assert_eq!(&[1], list.find(None).unwrap().value().unwrap());
  }

  #[test]
  fn find_next_walks_forward_from_a_known_child() {
    let mut list = TlvList::new();
    list.append(leaf(1, &[1])).unwrap();
    list.append(leaf(1, &[2])).unwrap();
    list.append(leaf(1, &[3])).unwrap();
    let tag = Tag::new(Class::ContextSpecific, false, 1).unwrap();
    let first = list.find(Some(&tag)).unwrap();
    let next = list.find_next(Some(&tag), first, 1).unwrap().unwrap();
    assert_eq!(&[2], next.value().unwrap());
  }

  #[test]
  fn data_length_excludes_oversized_children() {
    let mut list = TlvList::new();
    list.append(leaf(1, &[1, 2, 3])).unwrap();
    let huge = Tlv::new_primitive(Tag::new(Class::ContextSpecific, false, 2).unwrap(), vec![0u8; 32_765]).unwrap();
    list.append(huge).unwrap();
    // The first child's size (3 bytes) is counted; the huge one's size
    // (tag 1 + len-of-len 3 + 32765 = 32769) exceeds 32767 and is
    // silently excluded.
    assert_eq!(3, list.data_length());
  }

  #[test]
  fn init_skips_eoc_octets_between_children() {
    let buf = [0x80u8, 0x01, 0xAA, 0x00, 0x81, 0x01, 0xBB];
    let list = TlvList::init(&buf, 0, buf.len()).unwrap();
    assert_eq!(2, list.len());
  }
}
