//! Nested parameter structure and its dotted-path flattening

/// A module's parameters: tensors at the leaves, ordered string-keyed
/// nodes above them.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamTree<T> {
    Leaf(T),
    Node(Vec<(String, ParamTree<T>)>),
}

impl<T> ParamTree<T> {
    /// Empty node (a module with no parameters).
    pub fn empty() -> Self {
        ParamTree::Node(Vec::new())
    }

    /// Append a child under `key`. A leaf is first turned into an empty node.
    pub fn with(mut self, key: impl Into<String>, child: ParamTree<T>) -> Self {
        if let ParamTree::Leaf(_) = self {
            self = ParamTree::empty();
        }
        if let ParamTree::Node(children) = &mut self {
            children.push((key.into(), child));
        }
        self
    }

    /// Append a leaf under `key`.
    pub fn with_leaf(self, key: impl Into<String>, value: T) -> Self {
        self.with(key, ParamTree::Leaf(value))
    }

    /// Depth-first `(path, leaf)` pairs, keys joined with `"."`, in
    /// insertion order.
    ///
    /// A bare leaf at the root has the empty path.
    pub fn into_flat(self) -> Vec<(String, T)> {
        let mut out = Vec::new();
        self.flatten_into(String::new(), &mut out);
        out
    }

    fn flatten_into(self, prefix: String, out: &mut Vec<(String, T)>) {
        match self {
            ParamTree::Leaf(value) => out.push((prefix, value)),
            ParamTree::Node(children) => {
                for (key, child) in children {
                    let path = if prefix.is_empty() {
                        key
                    } else {
                        format!("{prefix}.{key}")
                    };
                    child.flatten_into(path, out);
                }
            }
        }
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        match self {
            ParamTree::Leaf(_) => 1,
            ParamTree::Node(children) => children.iter().map(|(_, c)| c.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
