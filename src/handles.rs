//! Handle slot lookup.
//!
//! The host's node-type registry knows, for every node type, the order in
//! which its input handles are declared. The arranger only ever asks for that
//! ordinal; it never interprets handle ids itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only `(node type, handle id) -> declared slot` lookup.
///
/// Returning `None` means "unknown"; callers treat it as slot `0`, which puts
/// no reordering pressure on the source.
pub trait HandleSlotIndex {
    fn slot_index(&self, node_type: &str, handle_id: &str) -> Option<usize>;
}

impl<F> HandleSlotIndex for F
where
    F: Fn(&str, &str) -> Option<usize>,
{
    fn slot_index(&self, node_type: &str, handle_id: &str) -> Option<usize> {
        self(node_type, handle_id)
    }
}

/// Lookup that knows no handles at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandleSlots;

impl HandleSlotIndex for NoHandleSlots {
    fn slot_index(&self, _node_type: &str, _handle_id: &str) -> Option<usize> {
        None
    }
}

/// Node type -> handle ids in declaration order.
///
/// Serialized as a plain JSON object, e.g. `{"merge": ["left", "right"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleRegistry {
    types: BTreeMap<String, Vec<String>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or redeclares) the input handles of `node_type`.
    pub fn register<I, S>(&mut self, node_type: impl Into<String>, handles: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handles = handles.into_iter().map(Into::into).collect();
        self.types.insert(node_type.into(), handles);
        self
    }

    /// Entries of `other` replace entries of the same node type.
    pub fn extend(&mut self, other: HandleRegistry) {
        self.types.extend(other.types);
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }
}

impl HandleSlotIndex for HandleRegistry {
    fn slot_index(&self, node_type: &str, handle_id: &str) -> Option<usize> {
        self.types
            .get(node_type)?
            .iter()
            .position(|handle| handle == handle_id)
    }
}

/// Slot of `handle` on a node of `node_type`, `0` when either side is missing
/// or the lookup does not know the pair.
pub(crate) fn resolve_slot(
    lookup: &dyn HandleSlotIndex,
    node_type: Option<&str>,
    handle: Option<&str>,
) -> usize {
    match (node_type, handle) {
        (Some(node_type), Some(handle)) => lookup.slot_index(node_type, handle).unwrap_or(0),
        _ => 0,
    }
}
