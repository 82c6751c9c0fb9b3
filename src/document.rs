//! The host editor's graph snapshot as JSON.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handles::HandleRegistry;
use crate::ir::{Edge, Node};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid graph document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Handle declarations shipped with the snapshot, merged over any
    /// registry from configuration.
    #[serde(default, skip_serializing_if = "HandleRegistry::is_empty")]
    pub handles: HandleRegistry,
}

impl GraphDocument {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            handles: HandleRegistry::default(),
        }
    }

    /// Parses and validates a document.
    pub fn from_json_str(input: &str) -> Result<Self, DocumentError> {
        let document: GraphDocument = serde_json::from_str(input)?;
        document.validate()?;
        Ok(document)
    }

    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects documents where two nodes share an id. Dangling edges are
    /// allowed; the layout ignores them.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(DocumentError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(())
    }

    /// Replaces each node's position with the one from `arranged`, matched
    /// by index.
    pub fn with_positions(&self, arranged: &[Node]) -> Self {
        let mut next = self.clone();
        for (node, placed) in next.nodes.iter_mut().zip(arranged) {
            node.position = placed.position;
        }
        next
    }
}
