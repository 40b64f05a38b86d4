/// Arena-backed size tree with an iterative bottom-up aggregation pass.
///
/// All directory nodes live in a single `Vec<SizeNode>`, and a path index
/// maps each directory to its `NodeIndex`. Scanner workers share the tree
/// behind one `RwLock` (see [`crate::scanner::SharedTree`]) and hold the
/// write lock only long enough to commit one directory listing.
use super::size_node::{NodeIndex, SizeNode};
use crate::error::{Result, ScanError};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Serialize a path as a string, replacing non-UTF-8 bytes with U+FFFD.
pub fn serialize_path_lossy<P, S>(path: &P, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    P: AsRef<Path>,
    S: Serializer,
{
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}

/// One row of the final report: a directory and its cumulative size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeEntry {
    #[serde(serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
    /// Cumulative size in bytes.
    pub size: u64,
    pub depth: u32,
}

/// The directory tree produced by a scan.
#[derive(Debug, Clone, Default)]
pub struct SizeTree {
    /// Arena: every directory node in a flat vector.
    pub nodes: Vec<SizeNode>,

    /// Root node indices. A normal scan has exactly one.
    pub roots: Vec<NodeIndex>,

    /// Path → node lookup, used for idempotent creation.
    index: HashMap<PathBuf, NodeIndex>,
}

impl SizeTree {
    /// Create an empty tree with pre-allocated capacity.
    pub fn with_capacity(estimated_dirs: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(estimated_dirs),
            roots: Vec::new(),
            index: HashMap::with_capacity(estimated_dirs),
        }
    }

    fn add_node(&mut self, node: SizeNode) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.index.insert(node.path.clone(), idx);
        self.nodes.push(node);
        idx
    }

    /// Add a scan root, or return the existing node for `path`.
    pub fn add_root(&mut self, path: &Path) -> NodeIndex {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let idx = self.add_node(SizeNode::new_root(path.to_path_buf()));
        self.roots.push(idx);
        idx
    }

    /// Return the node for `path`, creating it (and recording it under its
    /// parent) if it does not exist yet.
    pub fn get_or_create(&mut self, path: &Path) -> NodeIndex {
        self.get_or_create_entry(path).0
    }

    /// Like [`get_or_create`](Self::get_or_create), also reporting whether the
    /// node was created by this call.
    ///
    /// Missing ancestors between the nearest registered ancestor and `path`
    /// are created on the way down. A path with no registered ancestor at all
    /// becomes a new root.
    pub fn get_or_create_entry(&mut self, path: &Path) -> (NodeIndex, bool) {
        if let Some(&idx) = self.index.get(path) {
            return (idx, false);
        }

        let mut missing: Vec<PathBuf> = vec![path.to_path_buf()];
        let mut anchor = None;
        let mut current = path.parent();
        while let Some(p) = current {
            if let Some(&idx) = self.index.get(p) {
                anchor = Some(idx);
                break;
            }
            missing.push(p.to_path_buf());
            current = p.parent();
        }

        let Some(mut parent_idx) = anchor else {
            return (self.add_root(path), true);
        };

        for dir in missing.into_iter().rev() {
            let depth = self.nodes[parent_idx.idx()].depth + 1;
            let idx = self.add_node(SizeNode::new_dir(dir, Some(parent_idx), depth));
            self.nodes[parent_idx.idx()].children.push(idx);
            parent_idx = idx;
        }
        (parent_idx, true)
    }

    /// Commit the immediate size of an already-created node.
    ///
    /// A directory is listed exactly once; a second commit is an invariant
    /// violation and returns [`ScanError::DuplicateScan`].
    pub fn commit_immediate(&mut self, node: NodeIndex, size: u64) -> Result<()> {
        let node = &mut self.nodes[node.idx()];
        if node.scanned {
            return Err(ScanError::DuplicateScan {
                path: node.path.clone(),
            });
        }
        node.immediate_size = size;
        node.scanned = true;
        Ok(())
    }

    /// Path-keyed form of [`commit_immediate`](Self::commit_immediate).
    pub fn set_immediate_size(&mut self, path: &Path, size: u64) -> Result<()> {
        let idx = self.get_or_create(path);
        self.commit_immediate(idx, size)
    }

    /// Flag a directory whose listing failed part-way.
    pub fn mark_error(&mut self, node: NodeIndex) {
        self.nodes[node.idx()].is_error = true;
    }

    /// Compute `cumulative_size` for every node reachable from a root.
    ///
    /// Post-order walk with an explicit stack, so very deep trees cannot
    /// overflow the call stack. A visited set guards against a node being
    /// reached twice. Safe to call repeatedly.
    pub fn aggregate(&mut self) {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(NodeIndex, bool)> = Vec::new();

        for &root in &self.roots {
            stack.push((root, false));
            while let Some((idx, children_done)) = stack.pop() {
                if children_done {
                    let node = &self.nodes[idx.idx()];
                    let total = node
                        .children
                        .iter()
                        .filter_map(|c| self.nodes[c.idx()].cumulative_size)
                        .fold(node.immediate_size, u64::saturating_add);
                    self.nodes[idx.idx()].cumulative_size = Some(total);
                    continue;
                }
                if visited[idx.idx()] {
                    continue;
                }
                visited[idx.idx()] = true;
                self.nodes[idx.idx()].cumulative_size = None;

                stack.push((idx, true));
                for &child in &self.nodes[idx.idx()].children {
                    if !visited[child.idx()] {
                        stack.push((child, false));
                    }
                }
            }
        }
    }

    /// Report rows for every directory whose listing completed, sorted by path.
    ///
    /// With `top_level_only`, only nodes at depth ≤ 1 are kept. Call
    /// [`aggregate`](Self::aggregate) first; unaggregated nodes are skipped.
    pub fn entries(&self, top_level_only: bool) -> Vec<SizeEntry> {
        let mut entries: Vec<SizeEntry> = self
            .nodes
            .iter()
            .filter(|n| n.scanned && (!top_level_only || n.depth <= 1))
            .filter_map(|n| {
                n.cumulative_size.map(|size| SizeEntry {
                    path: n.path.clone(),
                    size,
                    depth: n.depth,
                })
            })
            .collect();
        entries.sort_unstable_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// Sum of immediate sizes over all scanned nodes.
    pub fn scanned_bytes(&self) -> u64 {
        self.nodes
            .iter()
            .filter(|n| n.scanned)
            .map(|n| n.immediate_size)
            .sum()
    }

    /// Look up a node by path.
    pub fn find(&self, path: &Path) -> Option<NodeIndex> {
        self.index.get(path).copied()
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &SizeNode {
        &self.nodes[index.idx()]
    }

    /// Direct children of a node.
    #[inline]
    pub fn children(&self, parent: NodeIndex) -> &[NodeIndex] {
        &self.nodes[parent.idx()].children
    }

    /// Total number of directory nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree contains no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
