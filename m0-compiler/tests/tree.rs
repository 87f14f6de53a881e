use m0_compiler::sema::Type;
use m0_compiler::tree::{NodeId, NodeKind, SyntaxTree};

// ── add_child ────────────────────────────────────────────────────────────

#[test]
fn add_child_appends_in_order() {
    let mut t = SyntaxTree::new();
    let block = t.new_node(NodeKind::Block, 1);
    let a = t.new_int(NodeKind::IntLit, 1, 1);
    let b = t.new_int(NodeKind::IntLit, 2, 2);
    t.add_child(block, a);
    t.add_child(block, b);

    assert_eq!(children(&t, block), vec![a, b]);
    assert_eq!(t.node(a).parent(), Some(block));
    assert_eq!(t.node(b).prev_sibling(), Some(a));
    assert_eq!(t.node(block).last_child(), Some(b));
}

#[test]
fn add_child_ignores_absent_side() {
    let mut t = SyntaxTree::new();
    let func = t.new_node(NodeKind::Function, 1);
    let name = t.new_text(NodeKind::Ident, "f", 1);

    t.add_child(func, None::<NodeId>);
    t.add_child(None::<NodeId>, name);
    assert_eq!(t.child_count(func), 0);
    assert_eq!(t.node(name).parent(), None);
}

// ── add_children ─────────────────────────────────────────────────────────

#[test]
fn add_children_splices_from_any_member() {
    let mut t = SyntaxTree::new();
    let params = t.new_node(NodeKind::Params, 1);
    let list = sibling_list(&mut t, 3);

    // Hand over the tail; the head is found by walking back.
    t.add_children(params, list[2]);

    assert_eq!(children(&t, params), list);
    for &id in &list {
        assert_eq!(t.node(id).parent(), Some(params));
    }
    assert_eq!(t.node(params).last_child(), Some(list[2]));
}

#[test]
fn add_children_after_existing_child() {
    let mut t = SyntaxTree::new();
    let block = t.new_node(NodeKind::Block, 1);
    let first = t.new_int(NodeKind::IntLit, 0, 1);
    t.add_child(block, first);
    let rest = sibling_list(&mut t, 2);
    t.add_children(block, rest[0]);

    assert_eq!(children(&t, block), vec![first, rest[0], rest[1]]);
    assert_eq!(t.node(rest[0]).prev_sibling(), Some(first));
}

// ── concat_siblings ──────────────────────────────────────────────────────

#[test]
fn concat_preserves_order_for_all_small_lengths() {
    for n in 0..4 {
        for m in 0..4 {
            let mut t = SyntaxTree::new();
            let a = sibling_list(&mut t, n);
            let b = sibling_list(&mut t, m);

            let head = t.concat_siblings(a.last().copied(), b.first().copied());
            let joined: Vec<NodeId> = t.siblings_from(head).collect();

            let expected: Vec<NodeId> = a.iter().chain(b.iter()).copied().collect();
            assert_eq!(joined, expected, "lengths {n} + {m}");
        }
    }
}

#[test]
fn concat_with_absent_list_is_identity() {
    let mut t = SyntaxTree::new();
    let a = sibling_list(&mut t, 2);
    assert_eq!(t.concat_siblings(Some(a[1]), None), Some(a[0]));
    assert_eq!(t.concat_siblings(None, Some(a[1])), Some(a[0]));
    assert_eq!(t.concat_siblings(None, None), None);
}

#[test]
fn concat_into_parented_list_updates_parent() {
    let mut t = SyntaxTree::new();
    let block = t.new_node(NodeKind::Block, 1);
    let a = sibling_list(&mut t, 2);
    t.add_children(block, a[0]);
    let b = sibling_list(&mut t, 2);

    t.concat_siblings(Some(a[0]), Some(b[1]));

    assert_eq!(children(&t, block), vec![a[0], a[1], b[0], b[1]]);
    assert_eq!(t.node(b[0]).parent(), Some(block));
    assert_eq!(t.node(block).last_child(), Some(b[1]));
}

#[test]
fn concat_moves_second_list_out_of_its_parent() {
    let mut t = SyntaxTree::new();
    let old = t.new_node(NodeKind::Block, 1);
    let b = sibling_list(&mut t, 2);
    t.add_children(old, b[0]);
    let a = sibling_list(&mut t, 2);

    let head = t.concat_siblings(Some(a[1]), Some(b[0]));

    assert_eq!(head, Some(a[0]));
    assert_eq!(t.siblings_from(head).collect::<Vec<_>>(), vec![a[0], a[1], b[0], b[1]]);
    assert!(children(&t, old).is_empty());
    assert_eq!(t.node(old).last_child(), None);
    assert_eq!(t.node(b[0]).parent(), None);
}

#[test]
fn add_children_moves_list_between_parents() {
    let mut t = SyntaxTree::new();
    let from = t.new_node(NodeKind::Block, 1);
    let to = t.new_node(NodeKind::Block, 2);
    let a = sibling_list(&mut t, 3);
    t.add_children(from, a[1]);

    t.add_children(to, a[0]);

    assert!(children(&t, from).is_empty());
    assert_eq!(children(&t, to), a);
    assert_eq!(t.node(a[2]).parent(), Some(to));
}

// ── Printer ──────────────────────────────────────────────────────────────

#[test]
fn render_shows_payloads_types_and_lines() {
    let mut t = SyntaxTree::new();
    let decl = t.new_node(NodeKind::VarDecl, 3);
    let name = t.new_text(NodeKind::Ident, "xs", 3);
    let arr = t.new_node(NodeKind::ArrayOf, 3);
    let int = t.new_node(NodeKind::IntType, 3);
    t.add_child(arr, int);
    t.add_child(decl, name);
    t.add_child(decl, arr);
    t.set_type(name, Type::INT.array_of().array_of());

    let text = t.render(decl);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "VARDECL @3 {");
    assert_eq!(lines[1], "   ID [xs] : [][]int @3");
    assert_eq!(lines[2], "   ARRAY_OF @3 {");
    assert_eq!(lines[3], "      INT @3");
    assert_eq!(lines[4], "   }");
    assert_eq!(lines[5], "}");
}

#[test]
fn render_int_literal_payload() {
    let mut t = SyntaxTree::new();
    let lit = t.new_int(NodeKind::IntLit, -7, 9);
    assert_eq!(t.render(lit), "INT_LIT [-7] @9\n");
    assert_eq!(t.display(lit).to_string(), t.render(lit));
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn children(t: &SyntaxTree, id: NodeId) -> Vec<NodeId> {
    t.children(id).collect()
}

/// Build a detached sibling list of `n` int literals.
fn sibling_list(t: &mut SyntaxTree, n: usize) -> Vec<NodeId> {
    let ids: Vec<NodeId> = (0..n)
        .map(|i| t.new_int(NodeKind::IntLit, i as i32, 1))
        .collect();
    for pair in ids.windows(2) {
        t.concat_siblings(Some(pair[0]), Some(pair[1]));
    }
    ids
}
