//! Syntax tree storage and editing.
//!
//! Nodes live in an arena owned by [`SyntaxTree`] and point at each other
//! through [`NodeId`] indices. Each node keeps parent, first/last child and
//! previous/next sibling links, which is what the parser's semantic actions
//! need to glue partial sibling lists together in O(list length).

mod kind;
mod print;

pub use kind::NodeKind;
pub use print::TreeDisplay;

use crate::sema::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub line: u32,
    /// Payload of `IntLit`.
    pub int_value: i32,
    /// Payload of `Ident` and `StringLit`.
    pub text: Option<String>,
    /// Filled in by the type checker.
    pub ty: Option<Type>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    prev_sibling: Option<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, line: u32) -> Self {
        Self {
            kind,
            line,
            int_value: 0,
            text: None,
            ty: None,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Construction ────────────────────────────────────────────────────

    pub fn new_node(&mut self, kind: NodeKind, line: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, line));
        id
    }

    /// Leaf carrying an integer payload (`IntLit`).
    pub fn new_int(&mut self, kind: NodeKind, value: i32, line: u32) -> NodeId {
        let id = self.new_node(kind, line);
        self.nodes[id.0].int_value = value;
        id
    }

    /// Leaf carrying a string payload (`Ident`, `StringLit`).
    pub fn new_text(&mut self, kind: NodeKind, text: impl Into<String>, line: u32) -> NodeId {
        let id = self.new_node(kind, line);
        self.nodes[id.0].text = Some(text.into());
        id
    }

    // ── Access ──────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn line(&self, id: NodeId) -> u32 {
        self.nodes[id.0].line
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    pub fn ty(&self, id: NodeId) -> Option<Type> {
        self.nodes[id.0].ty
    }

    pub fn set_type(&mut self, id: NodeId, ty: Type) {
        self.nodes[id.0].ty = Some(ty);
    }

    /// Iterate over the direct children of `id`, in order.
    pub fn children(&self, id: NodeId) -> Siblings<'_> {
        Siblings {
            tree: self,
            next: self.nodes[id.0].first_child,
        }
    }

    /// Iterate over `id` and every sibling after it.
    pub fn siblings_from(&self, id: Option<NodeId>) -> Siblings<'_> {
        Siblings {
            tree: self,
            next: id,
        }
    }

    pub fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.children(id).nth(n)
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    fn head_of(&self, mut id: NodeId) -> NodeId {
        while let Some(prev) = self.nodes[id.0].prev_sibling {
            id = prev;
        }
        id
    }

    fn tail_of(&self, mut id: NodeId) -> NodeId {
        while let Some(next) = self.nodes[id.0].next_sibling {
            id = next;
        }
        id
    }

    /// Take the list starting at `head` away from its parent, if it has one.
    fn detach_list(&mut self, head: NodeId) {
        let Some(old) = self.nodes[head.0].parent else {
            return;
        };
        self.nodes[old.0].first_child = None;
        self.nodes[old.0].last_child = None;
        let mut cur = Some(head);
        while let Some(id) = cur {
            self.nodes[id.0].parent = None;
            cur = self.nodes[id.0].next_sibling;
        }
    }

    // ── Editing ─────────────────────────────────────────────────────────

    /// Append a single detached node to `parent`'s children.
    ///
    /// Does nothing when either side is absent, so optional grammar pieces
    /// (a missing return type, say) can be passed straight through.
    pub fn add_child(&mut self, parent: impl Into<Option<NodeId>>, child: impl Into<Option<NodeId>>) {
        let (Some(parent), Some(child)) = (parent.into(), child.into()) else {
            return;
        };
        debug_assert!(
            self.nodes[child.0].parent.is_none()
                && self.nodes[child.0].prev_sibling.is_none()
                && self.nodes[child.0].next_sibling.is_none(),
            "add_child expects a detached node; use add_children for lists"
        );

        let last = self.nodes[parent.0].last_child;
        {
            let c = &mut self.nodes[child.0];
            c.parent = Some(parent);
            c.prev_sibling = last;
        }
        match last {
            Some(last) => self.nodes[last.0].next_sibling = Some(child),
            None => self.nodes[parent.0].first_child = Some(child),
        }
        self.nodes[parent.0].last_child = Some(child);
    }

    /// Splice a whole sibling list onto the end of `parent`'s children.
    ///
    /// `list` may point anywhere inside the list; the head is found by
    /// walking backwards. A list that already has a parent is moved.
    pub fn add_children(&mut self, parent: impl Into<Option<NodeId>>, list: impl Into<Option<NodeId>>) {
        let (Some(parent), Some(list)) = (parent.into(), list.into()) else {
            return;
        };
        let head = self.head_of(list);
        self.detach_list(head);

        let last = self.nodes[parent.0].last_child;
        self.nodes[head.0].prev_sibling = last;
        match last {
            Some(last) => self.nodes[last.0].next_sibling = Some(head),
            None => self.nodes[parent.0].first_child = Some(head),
        }

        let mut cur = Some(head);
        let mut tail = head;
        while let Some(id) = cur {
            self.nodes[id.0].parent = Some(parent);
            tail = id;
            cur = self.nodes[id.0].next_sibling;
        }
        self.nodes[parent.0].last_child = Some(tail);
    }

    /// Join two sibling lists into one, `first` before `second`.
    ///
    /// Either argument may point anywhere inside its list. An absent list is
    /// the identity. Returns the head of the joined list. If `first` already
    /// belongs to a parent, the nodes of `second` are adopted by it; any
    /// parent `second` had loses its children.
    pub fn concat_siblings(&mut self, first: Option<NodeId>, second: Option<NodeId>) -> Option<NodeId> {
        let first = match first {
            Some(f) => f,
            None => return second.map(|s| self.head_of(s)),
        };
        let Some(second) = second else {
            return Some(self.head_of(first));
        };

        let tail = self.tail_of(first);
        let head = self.head_of(second);
        debug_assert_ne!(self.head_of(first), head, "cannot join a list with itself");
        self.detach_list(head);

        self.nodes[tail.0].next_sibling = Some(head);
        self.nodes[head.0].prev_sibling = Some(tail);

        if let Some(parent) = self.nodes[tail.0].parent {
            let mut cur = Some(head);
            let mut new_tail = head;
            while let Some(id) = cur {
                self.nodes[id.0].parent = Some(parent);
                new_tail = id;
                cur = self.nodes[id.0].next_sibling;
            }
            if self.nodes[parent.0].last_child == Some(tail) {
                self.nodes[parent.0].last_child = Some(new_tail);
            }
        }

        Some(self.head_of(first))
    }
}

/// Forward iterator over a sibling chain.
pub struct Siblings<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.tree.nodes[cur.0].next_sibling;
        Some(cur)
    }
}
