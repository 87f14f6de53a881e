use m0_compiler::sema::{annotate, BaseType, Diagnostics, SemanticErrorKind, Type};
use m0_compiler::tree::{NodeId, NodeKind, SyntaxTree};
use m0_compiler::{check_tree, CompileError};

// ── Scopes ───────────────────────────────────────────────────────────────

#[test]
fn inner_declaration_shadows_global() {
    let mut b = Builder::new();
    let g = b.decl("x", Ty::Int);
    let local = b.decl("x", Ty::Bool);
    let target = b.var("x", &[]);
    let value = b.leaf(NodeKind::True);
    let assign = b.node(NodeKind::Assign, &[target, value]);
    let body = b.node(NodeKind::Block, &[local, assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[g, f]);

    let diags = annotate(&mut b.t, root);
    assert!(diags.is_empty(), "{:?}", diags.errors());
    assert_eq!(b.t.ty(target), Some(Type::BOOL));
}

#[test]
fn redeclaration_in_same_scope_is_rejected() {
    let mut b = Builder::new();
    let a = b.decl("n", Ty::Int);
    let again = b.decl("n", Ty::Int);
    let body = b.node(NodeKind::Block, &[a, again]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.count_of(SemanticErrorKind::AlreadyDeclared), 1);
}

#[test]
fn redeclaration_in_nested_block_is_accepted() {
    let mut b = Builder::new();
    let outer = b.decl("n", Ty::Int);
    let inner = b.decl("n", Ty::Char);
    let inner_block = b.node(NodeKind::Block, &[inner]);
    let cond = b.leaf(NodeKind::True);
    let w = b.node(NodeKind::While, &[cond, inner_block]);
    let body = b.node(NodeKind::Block, &[outer, w]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    assert!(annotate(&mut b.t, root).is_empty());
}

#[test]
fn parameter_and_body_share_a_scope() {
    let mut b = Builder::new();
    let p = b.decl("a", Ty::Int);
    let dup = b.decl("a", Ty::Int);
    let body = b.node(NodeKind::Block, &[dup]);
    let f = b.func("f", &[p], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.count_of(SemanticErrorKind::AlreadyDeclared), 1);
}

#[test]
fn undeclared_reference_reports_once() {
    let mut b = Builder::new();
    // y[true] = 1 with y never declared: the bad index is not checked.
    let idx = b.leaf(NodeKind::True);
    let target = b.at(4).var("y", &[idx]);
    let one = b.int(1);
    let assign = b.node(NodeKind::Assign, &[target, one]);
    let body = b.node(NodeKind::Block, &[assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.error_count(), 1);
    let err = &diags.errors()[0];
    assert_eq!(err.kind, SemanticErrorKind::Undeclared);
    assert_eq!(err.name, "y");
    assert_eq!(err.line, 4);
}

// ── Indexing ─────────────────────────────────────────────────────────────

#[test]
fn full_indexing_yields_scalar() {
    let mut b = Builder::new();
    let m = b.decl("m", Ty::Array(2, BaseType::Char));
    let c = b.decl("c", Ty::Char);
    let i = b.int(0);
    let j = b.int(1);
    let elem = b.var("m", &[i, j]);
    let target = b.var("c", &[]);
    let assign = b.node(NodeKind::Assign, &[target, elem]);
    let body = b.node(NodeKind::Block, &[m, c, assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert!(diags.is_empty(), "{:?}", diags.errors());
    assert_eq!(b.t.ty(elem), Some(Type::CHAR));
}

#[test]
fn partial_indexing_reduces_indirection() {
    let mut b = Builder::new();
    let m = b.decl("m", Ty::Array(3, BaseType::Int));
    let i = b.int(0);
    let row = b.var("m", &[i]);
    let expr_stmt = b.node(NodeKind::Block, &[row]);
    let body = b.node(NodeKind::Block, &[m, expr_stmt]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    annotate(&mut b.t, root);
    assert_eq!(b.t.ty(row), Some(Type::new(BaseType::Int, 2)));
}

#[test]
fn indexing_past_scalar_is_one_mismatch() {
    let mut b = Builder::new();
    let a = b.decl("a", Ty::Array(1, BaseType::Int));
    let n = b.decl("n", Ty::Int);
    let i = b.int(0);
    let j = b.int(0);
    let k = b.int(0);
    let over = b.var("a", &[i, j, k]);
    let target = b.var("n", &[]);
    let assign = b.node(NodeKind::Assign, &[target, over]);
    let body = b.node(NodeKind::Block, &[a, n, assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.count_of(SemanticErrorKind::TypeMismatch), 1);
}

#[test]
fn index_must_be_int() {
    let mut b = Builder::new();
    let a = b.decl("a", Ty::Array(1, BaseType::Int));
    let idx = b.leaf(NodeKind::False);
    let elem = b.var("a", &[idx]);
    let one = b.int(1);
    let assign = b.node(NodeKind::Assign, &[elem, one]);
    let body = b.node(NodeKind::Block, &[a, assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.count_of(SemanticErrorKind::IndexNotInt), 1);
}

// ── Conditions ───────────────────────────────────────────────────────────

#[test]
fn equality_condition_is_fine() {
    let mut b = Builder::new();
    let l = b.int(1);
    let r = b.int(1);
    let cond = b.node(NodeKind::Eq, &[l, r]);
    let then = b.node(NodeKind::Block, &[]);
    let iff = b.node(NodeKind::If, &[cond, then]);
    let body = b.node(NodeKind::Block, &[iff]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    assert!(annotate(&mut b.t, root).is_empty());
    assert_eq!(b.t.ty(cond), Some(Type::BOOL));
}

#[test]
fn int_condition_is_one_error_at_any_depth() {
    for depth in 0..4 {
        let mut b = Builder::new();
        let cond = b.int(1);
        let then = b.node(NodeKind::Block, &[]);
        let mut stmt = b.node(NodeKind::If, &[cond, then]);
        for _ in 0..depth {
            let inner = b.node(NodeKind::Block, &[stmt]);
            let t = b.leaf(NodeKind::True);
            stmt = b.node(NodeKind::While, &[t, inner]);
        }
        let body = b.node(NodeKind::Block, &[stmt]);
        let f = b.func("f", &[], body, None);
        let root = b.node(NodeKind::Program, &[f]);

        let diags = annotate(&mut b.t, root);
        assert_eq!(diags.error_count(), 1, "depth {depth}");
        assert_eq!(diags.count_of(SemanticErrorKind::ConditionNotBool), 1);
    }
}

#[test]
fn else_if_chain_checks_every_condition() {
    let mut b = Builder::new();
    let c1 = b.leaf(NodeKind::True);
    let b1 = b.node(NodeKind::Block, &[]);
    let c2 = b.int(0);
    let b2 = b.node(NodeKind::Block, &[]);
    let otherwise = b.node(NodeKind::Block, &[]);
    let iff = b.node(NodeKind::If, &[c1, b1, c2, b2, otherwise]);
    let body = b.node(NodeKind::Block, &[iff]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    assert_eq!(annotate(&mut b.t, root).count_of(SemanticErrorKind::ConditionNotBool), 1);
}

// ── Assignments and operators ────────────────────────────────────────────

#[test]
fn assignment_mismatches_do_not_stop_the_walk() {
    let mut b = Builder::new();
    let n = b.decl("n", Ty::Int);
    let t1 = b.var("n", &[]);
    let v1 = b.leaf(NodeKind::True);
    let a1 = b.node(NodeKind::Assign, &[t1, v1]);
    let t2 = b.var("n", &[]);
    let v2 = b.string("no");
    let a2 = b.node(NodeKind::Assign, &[t2, v2]);
    let body = b.node(NodeKind::Block, &[n, a1, a2]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.count_of(SemanticErrorKind::TypeMismatch), 2);
}

#[test]
fn string_literal_is_int_array() {
    let mut b = Builder::new();
    let s = b.decl("s", Ty::Str);
    let ints = b.decl("xs", Ty::Array(1, BaseType::Int));
    let chars = b.decl("cs", Ty::Array(1, BaseType::Char));
    let t1 = b.var("s", &[]);
    let v1 = b.string("hi");
    let a1 = b.node(NodeKind::Assign, &[t1, v1]);
    let t2 = b.var("xs", &[]);
    let v2 = b.string("hi");
    let a2 = b.node(NodeKind::Assign, &[t2, v2]);
    let t3 = b.var("cs", &[]);
    let v3 = b.string("hi");
    let a3 = b.node(NodeKind::Assign, &[t3, v3]);
    let body = b.node(NodeKind::Block, &[s, ints, chars, a1, a2, a3]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.errors()[0].name, "cs");
    assert_eq!(b.t.ty(v1), Some(Type::INT.array_of()));
}

#[test]
fn arithmetic_on_bool_names_the_operator() {
    let mut b = Builder::new();
    let n = b.decl("n", Ty::Int);
    let l = b.int(1);
    let r = b.leaf(NodeKind::False);
    let sum = b.node(NodeKind::Add, &[l, r]);
    let target = b.var("n", &[]);
    let assign = b.node(NodeKind::Assign, &[target, sum]);
    let body = b.node(NodeKind::Block, &[n, assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    // The failed sum has no type, so the assignment adds nothing.
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.errors()[0].name, "+");
}

#[test]
fn ordering_and_logic_rules() {
    let mut b = Builder::new();
    let l = b.int(1);
    let r = b.int(2);
    let lt = b.node(NodeKind::Lt, &[l, r]);
    let t = b.leaf(NodeKind::True);
    let and = b.node(NodeKind::And, &[lt, t]);
    let not = b.node(NodeKind::Not, &[and]);
    let then = b.node(NodeKind::Block, &[]);
    let iff = b.node(NodeKind::If, &[not, then]);
    let body = b.node(NodeKind::Block, &[iff]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    assert!(annotate(&mut b.t, root).is_empty());
    assert_eq!(b.t.ty(not), Some(Type::BOOL));
}

#[test]
fn new_adds_one_level() {
    let mut b = Builder::new();
    let xs = b.decl("xs", Ty::Array(2, BaseType::Int));
    let size = b.int(10);
    let elem = b.ty(Ty::Array(1, BaseType::Int));
    let alloc = b.node(NodeKind::New, &[size, elem]);
    let target = b.var("xs", &[]);
    let assign = b.node(NodeKind::Assign, &[target, alloc]);
    let body = b.node(NodeKind::Block, &[xs, assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    assert!(annotate(&mut b.t, root).is_empty());
    assert_eq!(b.t.ty(alloc), Some(Type::new(BaseType::Int, 2)));
}

#[test]
fn new_with_bool_size_still_has_a_type() {
    let mut b = Builder::new();
    let xs = b.decl("xs", Ty::Array(1, BaseType::Bool));
    let size = b.leaf(NodeKind::True);
    let elem = b.ty(Ty::Bool);
    let alloc = b.node(NodeKind::New, &[size, elem]);
    let target = b.var("xs", &[]);
    let assign = b.node(NodeKind::Assign, &[target, alloc]);
    let body = b.node(NodeKind::Block, &[xs, assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.errors()[0].name, "new");
}

// ── Functions, returns and calls ─────────────────────────────────────────

#[test]
fn function_type_comes_from_trailing_child() {
    let mut b = Builder::new();
    let body = b.node(NodeKind::Block, &[]);
    let f = b.func("f", &[], body, Some(Ty::Array(1, BaseType::Char)));
    let body2 = b.node(NodeKind::Block, &[]);
    let g = b.func("g", &[], body2, None);
    let root = b.node(NodeKind::Program, &[f, g]);

    annotate(&mut b.t, root);
    assert_eq!(b.t.ty(f), Some(Type::CHAR.array_of()));
    assert_eq!(b.t.ty(g), Some(Type::VOID));
}

#[test]
fn return_rules() {
    let mut b = Builder::new();
    // void f() { return 1; }
    let one = b.int(1);
    let r1 = b.node(NodeKind::Return, &[one]);
    let body = b.node(NodeKind::Block, &[r1]);
    let f = b.func("f", &[], body, None);
    // int g() { return; }
    let r2 = b.node(NodeKind::Return, &[]);
    let body = b.node(NodeKind::Block, &[r2]);
    let g = b.func("g", &[], body, Some(Ty::Int));
    // int h() { return true; }
    let t = b.leaf(NodeKind::True);
    let r3 = b.node(NodeKind::Return, &[t]);
    let body = b.node(NodeKind::Block, &[r3]);
    let h = b.func("h", &[], body, Some(Ty::Int));
    // int k() { return 2; }
    let two = b.int(2);
    let r4 = b.node(NodeKind::Return, &[two]);
    let body = b.node(NodeKind::Block, &[r4]);
    let k = b.func("k", &[], body, Some(Ty::Int));
    let root = b.node(NodeKind::Program, &[f, g, h, k]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.error_count(), 3);
    assert_eq!(diags.count_of(SemanticErrorKind::ReturnMismatch), 3);
    let names: Vec<&str> = diags.errors().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["f", "g", "h"]);
}

#[test]
fn call_types_as_return_type_and_ignores_arity() {
    let mut b = Builder::new();
    let p = b.decl("n", Ty::Int);
    let body = b.node(NodeKind::Block, &[]);
    let sq = b.func("sq", &[p], body, Some(Ty::Int));

    let r = b.decl("r", Ty::Int);
    let a1 = b.int(1);
    let a2 = b.leaf(NodeKind::True);
    let call = b.call("sq", &[a1, a2]);
    let target = b.var("r", &[]);
    let assign = b.node(NodeKind::Assign, &[target, call]);
    let body = b.node(NodeKind::Block, &[r, assign]);
    let main = b.func("main", &[], body, None);
    let root = b.node(NodeKind::Program, &[sq, main]);

    let diags = annotate(&mut b.t, root);
    assert!(diags.is_empty(), "{:?}", diags.errors());
    assert_eq!(b.t.ty(call), Some(Type::INT));
}

#[test]
fn recursive_call_resolves() {
    let mut b = Builder::new();
    let p = b.decl("n", Ty::Int);
    let arg = b.var("n", &[]);
    let call = b.call("fact", &[arg]);
    let ret = b.node(NodeKind::Return, &[call]);
    let body = b.node(NodeKind::Block, &[ret]);
    let fact = b.func("fact", &[p], body, Some(Ty::Int));
    let root = b.node(NodeKind::Program, &[fact]);

    assert!(annotate(&mut b.t, root).is_empty());
}

#[test]
fn call_errors() {
    let mut b = Builder::new();
    let v = b.decl("v", Ty::Int);
    let body = b.node(NodeKind::Block, &[]);
    let f = b.func("f", &[], body, Some(Ty::Int));

    let n = b.decl("n", Ty::Int);
    // n = v(1)
    let one = b.int(1);
    let bad_call = b.call("v", &[one]);
    let t1 = b.var("n", &[]);
    let a1 = b.node(NodeKind::Assign, &[t1, bad_call]);
    // n = f
    let t2 = b.var("n", &[]);
    let fref = b.var("f", &[]);
    let a2 = b.node(NodeKind::Assign, &[t2, fref]);
    // nope()
    let missing = b.call("nope", &[]);
    let body = b.node(NodeKind::Block, &[n, a1, a2, missing]);
    let main = b.func("main", &[], body, None);
    let root = b.node(NodeKind::Program, &[v, f, main]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.count_of(SemanticErrorKind::NotAFunction), 1);
    assert_eq!(diags.count_of(SemanticErrorKind::NotAVariable), 1);
    assert_eq!(diags.count_of(SemanticErrorKind::Undeclared), 1);
    assert_eq!(diags.error_count(), 3);
}

#[test]
fn bare_function_name_is_not_a_value() {
    let mut b = Builder::new();
    let body = b.node(NodeKind::Block, &[]);
    let f = b.func("f", &[], body, Some(Ty::Int));

    let n = b.decl("n", Ty::Int);
    // n = f, with f as a plain identifier
    let target = b.var("n", &[]);
    let fref = b.at(4).ident("f");
    let assign = b.node(NodeKind::Assign, &[target, fref]);
    let body = b.node(NodeKind::Block, &[n, assign]);
    let main = b.func("main", &[], body, None);
    let root = b.node(NodeKind::Program, &[f, main]);

    let diags = annotate(&mut b.t, root);
    assert_eq!(diags.count_of(SemanticErrorKind::NotAVariable), 1);
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.errors()[0].line, 4);
}

// ── Reporting ────────────────────────────────────────────────────────────

#[test]
fn diagnostics_render_one_line_each() {
    let mut b = Builder::new();
    let target = b.at(7).var("ghost", &[]);
    let one = b.int(1);
    let assign = b.node(NodeKind::Assign, &[target, one]);
    let body = b.node(NodeKind::Block, &[assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    let diags: Diagnostics = annotate(&mut b.t, root);
    let mut out = Vec::new();
    diags.write_to(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "line 7: ghost: undeclared identifier\n");
}

#[test]
fn errors_block_later_stages() {
    let mut b = Builder::new();
    let target = b.var("ghost", &[]);
    let one = b.int(1);
    let assign = b.node(NodeKind::Assign, &[target, one]);
    let body = b.node(NodeKind::Block, &[assign]);
    let f = b.func("f", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);

    match check_tree(&mut b.t, root) {
        Err(CompileError::Semantic { count, errors }) => {
            assert_eq!(count, 1);
            assert_eq!(errors[0].kind, SemanticErrorKind::Undeclared);
        }
        other => panic!("expected semantic error, got {:?}", other),
    }
}

#[test]
fn clean_tree_passes_check() {
    let mut b = Builder::new();
    let body = b.node(NodeKind::Block, &[]);
    let f = b.func("main", &[], body, None);
    let root = b.node(NodeKind::Program, &[f]);
    assert!(check_tree(&mut b.t, root).is_ok());
}

// ── Helpers ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Ty {
    Int,
    Bool,
    Char,
    Str,
    Array(u32, BaseType),
}

/// Builds trees the way the parser's semantic actions would.
struct Builder {
    t: SyntaxTree,
    line: u32,
}

impl Builder {
    fn new() -> Self {
        Self {
            t: SyntaxTree::new(),
            line: 1,
        }
    }

    fn at(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self
    }

    fn node(&mut self, kind: NodeKind, kids: &[NodeId]) -> NodeId {
        let id = self.t.new_node(kind, self.line);
        for &k in kids {
            self.t.add_child(id, k);
        }
        id
    }

    fn leaf(&mut self, kind: NodeKind) -> NodeId {
        self.node(kind, &[])
    }

    fn int(&mut self, v: i32) -> NodeId {
        self.t.new_int(NodeKind::IntLit, v, self.line)
    }

    fn string(&mut self, s: &str) -> NodeId {
        self.t.new_text(NodeKind::StringLit, s, self.line)
    }

    fn ident(&mut self, name: &str) -> NodeId {
        self.t.new_text(NodeKind::Ident, name, self.line)
    }

    fn ty(&mut self, ty: Ty) -> NodeId {
        match ty {
            Ty::Int => self.leaf(NodeKind::IntType),
            Ty::Bool => self.leaf(NodeKind::BoolType),
            Ty::Char => self.leaf(NodeKind::CharType),
            Ty::Str => self.leaf(NodeKind::StringType),
            Ty::Array(0, base) => self.ty(match base {
                BaseType::Bool => Ty::Bool,
                BaseType::Char => Ty::Char,
                _ => Ty::Int,
            }),
            Ty::Array(n, base) => {
                let inner = self.ty(Ty::Array(n - 1, base));
                self.node(NodeKind::ArrayOf, &[inner])
            }
        }
    }

    fn decl(&mut self, name: &str, ty: Ty) -> NodeId {
        let id = self.ident(name);
        let ty = self.ty(ty);
        self.node(NodeKind::VarDecl, &[id, ty])
    }

    fn var(&mut self, name: &str, indices: &[NodeId]) -> NodeId {
        let id = self.ident(name);
        let var = self.node(NodeKind::VarRef, &[id]);
        for &i in indices {
            self.t.add_child(var, i);
        }
        var
    }

    fn call(&mut self, name: &str, args: &[NodeId]) -> NodeId {
        let id = self.ident(name);
        let call = self.node(NodeKind::Call, &[id]);
        for &a in args {
            self.t.add_child(call, a);
        }
        call
    }

    fn func(&mut self, name: &str, params: &[NodeId], body: NodeId, ret: Option<Ty>) -> NodeId {
        let id = self.ident(name);
        let ps = self.node(NodeKind::Params, params);
        let ret = ret.map(|t| self.ty(t));
        let f = self.node(NodeKind::Function, &[id, ps, body]);
        self.t.add_child(f, ret);
        f
    }
}
