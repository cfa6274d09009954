//! Page-reference tree built from slash-delimited page keys.
//!
//! Counts start out on the nodes that terminate an inserted path and are
//! summed upward by [`PathTreeNode::propagate_counts`].

use std::collections::HashMap;

use crate::error::{LogFacetsError, Result};

/// Name given to the sentinel root of every tree.
pub const ROOT_NAME: &str = "/";

/// Count carried by a node before and after propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefCount {
    #[default]
    Unset,
    Assigned(u64),
}

impl RefCount {
    /// Unset counts read as zero.
    pub fn value(self) -> u64 {
        match self {
            RefCount::Unset => 0,
            RefCount::Assigned(count) => count,
        }
    }

    pub fn is_set(self) -> bool {
        matches!(self, RefCount::Assigned(_))
    }
}

#[derive(Debug, Clone)]
pub struct PathTreeNode {
    name: String,
    ref_count: RefCount,
    children: HashMap<String, PathTreeNode>,
}

impl PathTreeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ref_count: RefCount::Unset,
            children: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ref_count(&self) -> RefCount {
        self.ref_count
    }

    pub fn count(&self) -> u64 {
        self.ref_count.value()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&PathTreeNode> {
        self.children.get(name)
    }

    /// Follows `path` segment by segment from this node.
    pub fn find(&self, path: &str) -> Option<&PathTreeNode> {
        segments(path)
            .into_iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Snapshot of the children, sorted by name.
    pub fn children(&self) -> Vec<&PathTreeNode> {
        let mut children: Vec<&PathTreeNode> = self.children.values().collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        children
    }

    /// Returns the child called `name`, creating it if absent.
    pub fn add_child(&mut self, name: &str) -> &mut PathTreeNode {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| PathTreeNode::new(name))
    }

    /// Inserts `path` below this node and assigns `count` to its last segment.
    ///
    /// Empty segments are dropped, so `/a//b/` and `a/b` name the same node.
    /// A path without any non-empty segment is rejected.
    pub fn insert_path(&mut self, path: &str, count: u64) -> Result<()> {
        let segments = segments(path);
        if segments.is_empty() {
            return Err(LogFacetsError::InvalidPath {
                path: path.to_string(),
                reason: "path has no non-empty segment",
            });
        }

        let mut node: &mut PathTreeNode = self;
        for segment in segments {
            node = node.add_child(segment);
        }
        node.ref_count = RefCount::Assigned(count);
        Ok(())
    }

    /// Post-order sum of leaf counts. Internal nodes take the sum of their
    /// children; childless nodes keep what they hold, with `Unset` counting
    /// as zero.
    pub fn propagate_counts(&mut self) -> u64 {
        if self.children.is_empty() {
            return self.ref_count.value();
        }

        let sum: u64 = self
            .children
            .values_mut()
            .map(PathTreeNode::propagate_counts)
            .sum();
        self.ref_count = RefCount::Assigned(sum);
        sum
    }

    /// Paths (relative to this node) of childless descendants that never
    /// received a count.
    pub fn unset_leaves(&self) -> Vec<String> {
        let mut found = Vec::new();
        for child in self.children() {
            child.collect_unset(String::new(), &mut found);
        }
        found
    }

    fn collect_unset(&self, prefix: String, found: &mut Vec<String>) {
        let path = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", prefix, self.name)
        };

        if self.children.is_empty() {
            if !self.ref_count.is_set() {
                found.push(path);
            }
            return;
        }

        for child in self.children() {
            child.collect_unset(path.clone(), found);
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Builds a tree under a fresh `/` root from `(path, count)` pairs and
/// propagates the counts.
pub fn build_tree<I, S>(pairs: I) -> Result<PathTreeNode>
where
    I: IntoIterator<Item = (S, u64)>,
    S: AsRef<str>,
{
    let mut root = PathTreeNode::new(ROOT_NAME);
    for (path, count) in pairs {
        root.insert_path(path.as_ref(), count)?;
    }
    root.propagate_counts();
    Ok(root)
}
