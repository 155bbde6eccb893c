//! Role inheritance graph with cycle detection and memoized closures
//!
//! Roles live in an index-based arena; inheritance edges are stored as
//! upward adjacency (child → parents), so no reference cycles can exist
//! at the language level regardless of the input data. Cycle detection
//! runs at load time with a white/gray/black coloring walk; a back-edge
//! to an in-progress node is a cycle and fails the load. Ancestor sets
//! are computed once per role during load (memoized post-order DFS), so a
//! published graph is fully immutable and closure reads need no locking.

use crate::error::{AuthzError, Result};
use rolegate_core::{HierarchyEdgeRecord, RoleId, RoleRecord};
use std::collections::{BTreeSet, HashMap, HashSet};

/// DFS coloring states
const WHITE: u8 = 0;
const GRAY: u8 = 1;
const BLACK: u8 = 2;

/// In-memory role hierarchy.
///
/// The inheritance relation must form a DAG: a child inherits every
/// permission (and scope) of its parents, transitively.
#[derive(Debug, Clone)]
pub struct RoleGraph {
    /// Role arena; indices are stable for the lifetime of the graph
    roles: Vec<RoleRecord>,

    /// Role id → arena index
    ids: HashMap<RoleId, usize>,

    /// Upward adjacency: parents[child] lists the child's direct parents
    parents: Vec<Vec<usize>>,

    /// Memoized ancestor sets, excluding the role itself
    ancestors: Vec<HashSet<usize>>,
}

impl RoleGraph {
    /// Build the graph from role rows and parent→child edges.
    ///
    /// # Errors
    ///
    /// - `DuplicateRole` if a role id appears twice
    /// - `DanglingEdge` if an edge references an unknown role
    /// - `CyclicHierarchy` if the edges contain a cycle; the message
    ///   carries the offending path
    pub fn load(roles: Vec<RoleRecord>, edges: &[HierarchyEdgeRecord]) -> Result<Self> {
        let mut ids: HashMap<RoleId, usize> = HashMap::with_capacity(roles.len());
        for (index, role) in roles.iter().enumerate() {
            if ids.insert(role.id.clone(), index).is_some() {
                return Err(AuthzError::DuplicateRole(role.id.clone()));
            }
        }

        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); roles.len()];
        for edge in edges {
            let (Some(&parent), Some(&child)) = (ids.get(&edge.parent), ids.get(&edge.child))
            else {
                return Err(AuthzError::DanglingEdge {
                    parent: edge.parent.clone(),
                    child: edge.child.clone(),
                });
            };
            if !parents[child].contains(&parent) {
                parents[child].push(parent);
            }
        }

        let mut graph = Self {
            ancestors: Vec::new(),
            ids,
            parents,
            roles,
        };

        graph.check_acyclic()?;
        graph.ancestors = graph.compute_ancestors();
        Ok(graph)
    }

    /// All roles reachable by following parent edges transitively,
    /// excluding the role itself
    pub fn ancestors(&self, role: &str) -> Result<BTreeSet<RoleId>> {
        let index = self.index_of(role)?;
        Ok(self.ancestors[index]
            .iter()
            .map(|&ancestor| self.roles[ancestor].id.clone())
            .collect())
    }

    /// `ancestors(role) ∪ {role}`
    pub fn closure(&self, role: &str) -> Result<BTreeSet<RoleId>> {
        let mut set = self.ancestors(role)?;
        set.insert(role.to_string());
        Ok(set)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.ids.contains_key(role)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub(crate) fn index_of(&self, role: &str) -> Result<usize> {
        self.ids
            .get(role)
            .copied()
            .ok_or_else(|| AuthzError::UnknownRole(role.to_string()))
    }

    pub(crate) fn role_id(&self, index: usize) -> &RoleId {
        &self.roles[index].id
    }

    /// Ancestor indices of an arena index, excluding the role itself
    pub(crate) fn ancestor_indices(&self, index: usize) -> &HashSet<usize> {
        &self.ancestors[index]
    }

    /// Coloring walk over the upward adjacency. Any edge into a gray
    /// (in-progress) node closes a cycle.
    fn check_acyclic(&self) -> Result<()> {
        let mut state = vec![WHITE; self.roles.len()];
        let mut path = Vec::new();

        for start in 0..self.roles.len() {
            if state[start] == WHITE {
                self.visit(start, &mut state, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit(&self, node: usize, state: &mut [u8], path: &mut Vec<usize>) -> Result<()> {
        match state[node] {
            GRAY => {
                // Back-edge: the cycle is the path suffix from the first
                // occurrence of this node
                let start = path.iter().position(|&n| n == node).unwrap_or(0);
                let cycle: Vec<&str> = path[start..]
                    .iter()
                    .chain(std::iter::once(&node))
                    .map(|&n| self.roles[n].id.as_str())
                    .collect();
                return Err(AuthzError::CyclicHierarchy(cycle.join(" -> ")));
            }
            BLACK => return Ok(()),
            _ => {}
        }

        state[node] = GRAY;
        path.push(node);

        for &parent in &self.parents[node] {
            self.visit(parent, state, path)?;
        }

        state[node] = BLACK;
        path.pop();
        Ok(())
    }

    /// Memoized post-order DFS: each role's ancestor set is computed
    /// exactly once and reused by every descendant that shares it,
    /// O(V+E) walks amortized across the whole graph.
    fn compute_ancestors(&self) -> Vec<HashSet<usize>> {
        let mut memo: Vec<Option<HashSet<usize>>> = vec![None; self.roles.len()];
        for index in 0..self.roles.len() {
            self.fill_ancestors(index, &mut memo);
        }
        memo.into_iter().map(|set| set.unwrap_or_default()).collect()
    }

    fn fill_ancestors(&self, node: usize, memo: &mut Vec<Option<HashSet<usize>>>) {
        if memo[node].is_some() {
            return;
        }
        let mut set = HashSet::new();
        for &parent in &self.parents[node] {
            self.fill_ancestors(parent, memo);
            set.insert(parent);
            if let Some(parent_ancestors) = &memo[parent] {
                set.extend(parent_ancestors.iter().copied());
            }
        }
        memo[node] = Some(set);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: &str) -> RoleRecord {
        RoleRecord::new(id, id)
    }

    fn edge(parent: &str, child: &str) -> HierarchyEdgeRecord {
        HierarchyEdgeRecord::new(parent, child)
    }

    #[test]
    fn test_empty_graph() {
        let graph = RoleGraph::load(Vec::new(), &[]).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_linear_ancestors() {
        // staff → senior → lead (each child inherits its parent)
        let graph = RoleGraph::load(
            vec![role("staff"), role("senior"), role("lead")],
            &[edge("staff", "senior"), edge("senior", "lead")],
        )
        .unwrap();

        assert!(graph.ancestors("staff").unwrap().is_empty());
        assert_eq!(
            graph.ancestors("lead").unwrap(),
            BTreeSet::from(["staff".to_string(), "senior".to_string()])
        );
        assert_eq!(
            graph.closure("senior").unwrap(),
            BTreeSet::from(["staff".to_string(), "senior".to_string()])
        );
    }

    #[test]
    fn test_diamond_ancestors() {
        // base is inherited through two distinct paths; the closure must
        // contain it once
        let graph = RoleGraph::load(
            vec![role("base"), role("left"), role("right"), role("apex")],
            &[
                edge("base", "left"),
                edge("base", "right"),
                edge("left", "apex"),
                edge("right", "apex"),
            ],
        )
        .unwrap();

        assert_eq!(
            graph.ancestors("apex").unwrap(),
            BTreeSet::from([
                "base".to_string(),
                "left".to_string(),
                "right".to_string()
            ])
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let result = RoleGraph::load(
            vec![role("a"), role("b"), role("c")],
            &[edge("a", "b"), edge("b", "c"), edge("c", "a")],
        );

        match result {
            Err(AuthzError::CyclicHierarchy(path)) => {
                assert!(path.contains("a") && path.contains("b") && path.contains("c"));
            }
            other => panic!("expected CyclicHierarchy, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_self_edge_rejected() {
        let result = RoleGraph::load(vec![role("a")], &[edge("a", "a")]);
        assert!(matches!(result, Err(AuthzError::CyclicHierarchy(_))));
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let result = RoleGraph::load(vec![role("a")], &[edge("a", "ghost")]);
        match result {
            Err(AuthzError::DanglingEdge { parent, child }) => {
                assert_eq!(parent, "a");
                assert_eq!(child, "ghost");
            }
            other => panic!("expected DanglingEdge, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let result = RoleGraph::load(vec![role("a"), role("a")], &[]);
        assert!(matches!(result, Err(AuthzError::DuplicateRole(_))));
    }

    #[test]
    fn test_unknown_role_lookup() {
        let graph = RoleGraph::load(vec![role("a")], &[]).unwrap();
        assert!(matches!(
            graph.ancestors("ghost"),
            Err(AuthzError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let graph = RoleGraph::load(
            vec![role("parent"), role("child")],
            &[edge("parent", "child"), edge("parent", "child")],
        )
        .unwrap();
        assert_eq!(graph.ancestors("child").unwrap().len(), 1);
    }
}
