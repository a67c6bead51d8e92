//! The dispatch graph: nodes, guarded edges and a builder.
//!
//! Each node is an effect factory. Edges leaving a node are tried in the
//! order they were added; the first whose guard passes (or that has no
//! guard) is followed.

use super::state::ConversationState;
use super::DispatchError;
use crate::core::Guard;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;
use thiserror::Error;

/// A step of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Intake,
    ParseActions,
    ValidateActions,
    ExecuteHardware,
    UpdateHistory,
    CheckEnd,
    ClarifyOrContinue,
}

impl Node {
    pub fn name(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::ParseActions => "parse_actions",
            Self::ValidateActions => "validate_actions",
            Self::ExecuteHardware => "execute_hardware",
            Self::UpdateHistory => "update_history",
            Self::CheckEnd => "check_end",
            Self::ClarifyOrContinue => "clarify_or_continue",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an edge leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Node(Node),
    /// Leave the graph; the pass is over.
    End,
}

impl From<Node> for Target {
    fn from(node: Node) -> Self {
        Target::Node(node)
    }
}

/// Effect factory run when the graph reaches a node. It receives a copy of
/// the conversation record and produces the updated one.
pub type NodeAction<Env> = Arc<
    dyn Fn(ConversationState) -> BoxedEffect<ConversationState, DispatchError, Env> + Send + Sync,
>;

/// A directed edge, optionally guarded.
#[derive(Clone)]
pub struct Edge {
    pub from: Node,
    pub to: Target,
    pub guard: Option<Guard<ConversationState>>,
}

impl Edge {
    /// Whether this edge may be followed out of `current` (pure).
    pub fn can_follow(&self, current: Node, state: &ConversationState) -> bool {
        self.from == current && self.guard.as_ref().is_none_or(|g| g.check(state))
    }
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edge")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// Errors found while assembling a graph.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("entry node not specified. Call .entry(node) before .build()")]
    MissingEntry,

    #[error("no edges defined. Add at least one edge")]
    NoEdges,

    #[error("node '{node}' is reachable but has no action")]
    MissingAction { node: Node },

    #[error("node '{node}' has no outgoing edge")]
    DeadEnd { node: Node },
}

/// A validated dispatch graph.
pub struct DispatchGraph<Env> {
    entry: Node,
    actions: HashMap<Node, NodeAction<Env>>,
    edges: Vec<Edge>,
}

impl<Env> DispatchGraph<Env> {
    pub fn entry(&self) -> Node {
        self.entry
    }

    pub fn action(&self, node: Node) -> Option<&NodeAction<Env>> {
        self.actions.get(&node)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Where to go after `node` produced `state` (pure).
    pub fn next(&self, node: Node, state: &ConversationState) -> Option<Target> {
        self.edges
            .iter()
            .find(|e| e.can_follow(node, state))
            .map(|e| e.to)
    }
}

impl<Env> std::fmt::Debug for DispatchGraph<Env> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut nodes: Vec<&Node> = self.actions.keys().collect();
        nodes.sort_by_key(|n| n.name());
        f.debug_struct("DispatchGraph")
            .field("entry", &self.entry)
            .field("nodes", &nodes)
            .field("edges", &self.edges)
            .finish()
    }
}

/// Fluent builder for [`DispatchGraph`].
pub struct GraphBuilder<Env> {
    entry: Option<Node>,
    actions: HashMap<Node, NodeAction<Env>>,
    edges: Vec<Edge>,
}

impl<Env> Default for GraphBuilder<Env> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Env> GraphBuilder<Env> {
    pub fn new() -> Self {
        Self {
            entry: None,
            actions: HashMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn entry(mut self, node: Node) -> Self {
        self.entry = Some(node);
        self
    }

    /// Register the action run at `node`, replacing any earlier one.
    pub fn node(mut self, node: Node, action: NodeAction<Env>) -> Self {
        self.actions.insert(node, action);
        self
    }

    /// Unconditional edge.
    pub fn edge(mut self, from: Node, to: impl Into<Target>) -> Self {
        self.edges.push(Edge {
            from,
            to: to.into(),
            guard: None,
        });
        self
    }

    /// Edge followed only when `guard` holds for the record `from` produced.
    pub fn branch(
        mut self,
        from: Node,
        to: impl Into<Target>,
        guard: Guard<ConversationState>,
    ) -> Self {
        self.edges.push(Edge {
            from,
            to: to.into(),
            guard: Some(guard),
        });
        self
    }

    pub fn build(self) -> Result<DispatchGraph<Env>, BuildError> {
        let entry = self.entry.ok_or(BuildError::MissingEntry)?;
        if self.edges.is_empty() {
            return Err(BuildError::NoEdges);
        }

        let reachable = std::iter::once(entry).chain(self.edges.iter().filter_map(|e| match e.to {
            Target::Node(node) => Some(node),
            Target::End => None,
        }));
        for node in reachable {
            if !self.actions.contains_key(&node) {
                return Err(BuildError::MissingAction { node });
            }
        }

        for node in self.actions.keys() {
            if !self.edges.iter().any(|e| e.from == *node) {
                return Err(BuildError::DeadEnd { node: *node });
            }
        }

        Ok(DispatchGraph {
            entry,
            actions: self.actions,
            edges: self.edges,
        })
    }
}
