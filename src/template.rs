//! Template fill (spec.md §4.6): build a concrete TLV tree from a
//! "skeleton" tree whose primitive leaves carry placeholder tags, and a
//! map from packed tag to the bytes that should replace each
//! placeholder's value.
//!
//! The skeleton itself is an ordinary [`Tlv`] tree — there is no
//! separate skeleton type. A leaf is "missing" when the map has no
//! entry for its packed tag (see [`crate::raw::pack_tag`]); what
//! happens to a missing leaf is controlled by `remove_missing`.

use std::collections::HashMap;

use crate::raw::pack_tag;
use crate::tag::Tag;
use crate::tlv::Tlv;
use crate::{Result, TlvError};

/// Depth-first walks `skeleton`, replacing each primitive leaf's value
/// with `values[pack_tag(leaf.tag())]` when present.
///
/// When a leaf's tag has no entry in `values`:
/// - `remove_missing == true`: the leaf reports *absent*; its parent
///   drops it from the reserialized tree.
/// - `remove_missing == false`: the leaf is kept with an empty value
///   and reports *absent* (it still carries no replacement, it is just
///   not pruned).
///
/// A constructed node reports *present* iff at least one of its
/// children (before pruning) reported *present*; it never deletes
/// itself on that basis — only its own parent decides whether to keep
/// it. The top-level skeleton is therefore always reserialized, even
/// when every leaf underneath it is absent and `remove_missing` is
/// set: it simply collapses to an empty body (spec.md §4.6).
///
/// # Errors
/// `InvalidParam` if a leaf's tag cannot be packed (spec.md §4.6 limits
/// template tags to one or two raw octets).
pub fn fill_template(skeleton: &Tlv, values: &HashMap<u16, Vec<u8>>, remove_missing: bool) -> Result<Tlv> {
  Ok(fill(skeleton, values, remove_missing)?.0)
}

/// Returns the filled node alongside whether its own subtree reported
/// *present* (spec.md §4.6's depth-first present/absent traversal).
fn fill(node: &Tlv, values: &HashMap<u16, Vec<u8>>, remove_missing: bool) -> Result<(Tlv, bool)> {
  match node {
    Tlv::Primitive(_) => {
      let key = pack_tag(node.tag())?;
      match values.get(&key) {
        Some(bytes) => Ok((Tlv::new_primitive(node.tag().clone(), bytes.clone())?, true)),
        None => Ok((Tlv::new_primitive(node.tag().clone(), Vec::new())?, false)),
      }
    }
    Tlv::Constructed(c) => {
      let mut kept = Vec::new();
      let mut any_present = false;
      for child in c.children().iter() {
        let (filled_child, present) = fill(child, values, remove_missing)?;
        any_present |= present;
        if present || !remove_missing {
          kept.push(filled_child);
        }
      }
      Ok((Tlv::new_constructed(node.tag().clone(), kept)?, any_present))
    }
  }
}

/// Serializes `skeleton` as-is (every leaf keeping whatever value it
/// already carries), the degenerate case of template fill where the
/// caller supplies no replacement map at all (spec.md §8 scenario 7).
///
/// # Errors
/// As per [`Tlv::to_vec`].
pub fn write_tlv_structure(skeleton: &Tlv) -> Result<Vec<u8>> {
  skeleton.to_vec()
}

/// Packs a tag's raw octets into the 2-byte key `fill_template` indexes
/// its value map by. Thin wrapper over [`crate::raw::pack_tag`] kept
/// here since callers building a values map for this module should not
/// need to know it lives in `raw`.
///
/// # Errors
/// As per [`crate::raw::pack_tag`].
pub fn pack(tag: &Tag) -> Result<u16> {
  pack_tag(tag)
}
