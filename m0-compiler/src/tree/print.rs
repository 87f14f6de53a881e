//! Depth-first, pre-order tree dump.
//!
//! ```text
//! FUNCTION : int @1 {
//!    ID [f] : int @1
//!    ...
//! }
//! ```

use super::{NodeId, NodeKind, SyntaxTree};
use std::fmt;

const INDENT: &str = "   ";

/// `Display` adapter for a subtree.
pub struct TreeDisplay<'a> {
    tree: &'a SyntaxTree,
    root: NodeId,
}

impl SyntaxTree {
    pub fn display(&self, root: NodeId) -> TreeDisplay<'_> {
        TreeDisplay { tree: self, root }
    }

    /// Render the subtree rooted at `root` as text.
    pub fn render(&self, root: NodeId) -> String {
        self.display(root).to_string()
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = self.node(id);
        for _ in 0..depth {
            f.write_str(INDENT)?;
        }

        f.write_str(node.kind.name())?;
        match node.kind {
            NodeKind::Ident | NodeKind::StringLit => {
                write!(f, " [{}]", node.text.as_deref().unwrap_or(""))?
            }
            NodeKind::IntLit => write!(f, " [{}]", node.int_value)?,
            _ => {}
        }
        if let Some(ty) = node.ty {
            write!(f, " : {ty}")?;
        }
        write!(f, " @{}", node.line)?;

        if node.first_child().is_some() {
            f.write_str(" {\n")?;
            for child in self.children(id) {
                self.write_node(f, child, depth + 1)?;
            }
            for _ in 0..depth {
                f.write_str(INDENT)?;
            }
            f.write_str("}")?;
        }
        f.write_str("\n")
    }
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tree.write_node(f, self.root, 0)
    }
}
