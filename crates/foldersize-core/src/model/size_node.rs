/// A single directory node in the arena-allocated size tree.
///
/// Nodes are stored in a flat `Vec<SizeNode>`. Parent-child relationships
/// use indices rather than pointers, so the tree can be shared behind one
/// lock and walked without reference counting.
use std::path::PathBuf;

/// Lightweight index into the arena `Vec<SizeNode>`.
///
/// Uses `u32` to keep nodes small — supports up to ~4 billion directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`, panicking in debug builds if it exceeds `u32::MAX`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// One directory discovered during a scan.
#[derive(Debug, Clone)]
pub struct SizeNode {
    /// Full path of the directory. Unique per node; the tree key.
    pub path: PathBuf,

    /// Distance from the scan root (root = 0).
    pub depth: u32,

    /// Index of the parent node. `None` for scan roots.
    pub parent: Option<NodeIndex>,

    /// Directly-contained subdirectories. Each child appears at most once.
    pub children: Vec<NodeIndex>,

    /// Sum of the byte lengths of regular files directly inside this directory.
    pub immediate_size: u64,

    /// Immediate size plus the cumulative size of every child.
    /// `None` until the aggregation pass has run.
    pub cumulative_size: Option<u64>,

    /// `true` once this directory's own listing has been committed.
    pub scanned: bool,

    /// `true` if listing this directory failed part-way (or entirely).
    /// The node stays in the tree with whatever was accumulated.
    pub is_error: bool,
}

impl SizeNode {
    /// Create an unscanned directory node with zero size and no children.
    pub fn new_dir(path: PathBuf, parent: Option<NodeIndex>, depth: u32) -> Self {
        Self {
            path,
            depth,
            parent,
            children: Vec::new(),
            immediate_size: 0,
            cumulative_size: None,
            scanned: false,
            is_error: false,
        }
    }

    /// Create a scan-root node.
    pub fn new_root(path: PathBuf) -> Self {
        Self::new_dir(path, None, 0)
    }
}
