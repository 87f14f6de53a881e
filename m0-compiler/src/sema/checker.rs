//! Scope-aware type checker.
//!
//! One recursive, top-down walk over the tree. Every node whose type can be
//! resolved gets it written back into the tree; every rule violation is
//! recorded in [`Diagnostics`] and the walk carries on. Expression visitors
//! return `None` once an error has been reported underneath them, so a single
//! mistake never produces a cascade of follow-up errors.

use super::diagnostics::{Diagnostics, SemanticError, SemanticErrorKind};
use super::symbol_table::{Symbol, SymbolKind, SymbolTable};
use super::types::{BaseType, Type};
use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// Type-check the program rooted at `root`, annotating the tree in place.
pub fn annotate(tree: &mut SyntaxTree, root: NodeId) -> Diagnostics {
    let mut checker = TypeChecker::new(tree);
    checker.visit_program(root);
    checker.finish()
}

/// Operand/result rules for binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signature {
    /// bool × bool → bool
    Logical,
    /// T × T → bool, exact match including indirection
    Equality,
    /// int × int → bool
    Ordering,
    /// int × int → int
    Arithmetic,
}

fn binary_signature(kind: NodeKind) -> Option<Signature> {
    match kind {
        NodeKind::Or | NodeKind::And => Some(Signature::Logical),
        NodeKind::Eq | NodeKind::Ne => Some(Signature::Equality),
        NodeKind::Lt | NodeKind::Gt | NodeKind::Le | NodeKind::Ge => Some(Signature::Ordering),
        NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div => {
            Some(Signature::Arithmetic)
        }
        _ => None,
    }
}

/// Type of a string literal: characters are promoted to int.
const STRING_LITERAL: Type = Type::new(BaseType::Int, 1);

#[derive(Debug, Clone)]
struct FunctionCtx {
    name: String,
    ret: Type,
}

pub struct TypeChecker<'t> {
    tree: &'t mut SyntaxTree,
    symbols: SymbolTable,
    diagnostics: Diagnostics,
    fn_ctx: Option<FunctionCtx>,
}

impl<'t> TypeChecker<'t> {
    pub fn new(tree: &'t mut SyntaxTree) -> Self {
        Self {
            tree,
            symbols: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            fn_ctx: None,
        }
    }

    pub fn finish(self) -> Diagnostics {
        debug_assert_eq!(self.symbols.depth(), 1, "unbalanced scope push/pop");
        self.diagnostics
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.children(id).collect()
    }

    fn name_of(&self, id: NodeId) -> String {
        self.tree.text(id).unwrap_or_default().to_string()
    }

    fn error(&mut self, kind: SemanticErrorKind, line: u32, name: impl Into<String>, message: String) {
        self.diagnostics.push(SemanticError {
            kind,
            line,
            name: name.into(),
            message,
        });
    }

    /// Run `f` inside a fresh scope; the scope is popped on the way out.
    fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.symbols.push_scope();
        log::trace!("enter scope (depth {})", self.symbols.depth());
        let result = f(self);
        self.symbols.pop_scope();
        result
    }

    fn declare(&mut self, name_node: NodeId, kind: SymbolKind, ty: Type) {
        let name = self.name_of(name_node);
        let line = self.tree.line(name_node);
        let symbol = Symbol {
            name: name.clone(),
            kind,
            ty,
            line,
        };
        if let Err(existing) = self.symbols.declare(symbol) {
            self.error(
                SemanticErrorKind::AlreadyDeclared,
                line,
                name,
                format!("already declared in this scope at line {}", existing.line),
            );
        }
    }

    /// Resolve a type node and annotate it (and its nested type nodes).
    fn resolve_type(&mut self, id: NodeId) -> Type {
        let ty = match self.tree.kind(id) {
            NodeKind::IntType => Type::INT,
            NodeKind::BoolType => Type::BOOL,
            NodeKind::CharType => Type::CHAR,
            NodeKind::StringType => STRING_LITERAL,
            NodeKind::ArrayOf => match self.tree.child(id, 0) {
                Some(inner) => self.resolve_type(inner).array_of(),
                None => Type::VOID,
            },
            _ => Type::VOID,
        };
        self.tree.set_type(id, ty);
        ty
    }

    // ── Declarations ────────────────────────────────────────────────────

    pub fn visit_program(&mut self, id: NodeId) {
        for child in self.children(id) {
            match self.tree.kind(child) {
                NodeKind::Function => self.visit_function(child),
                NodeKind::VarDecl => self.visit_decl(child),
                _ => self.visit_statement(child),
            }
        }
    }

    fn visit_function(&mut self, id: NodeId) {
        let kids = self.children(id);
        let Some(&name_node) = kids.first() else {
            return;
        };
        let ret = match kids.get(3) {
            Some(&ty_node) => self.resolve_type(ty_node),
            None => Type::VOID,
        };
        self.tree.set_type(id, ret);
        self.tree.set_type(name_node, ret);

        // Declared before the body so recursive calls resolve.
        self.declare(name_node, SymbolKind::Function, ret);

        let name = self.name_of(name_node);
        log::debug!("checking function {name}: {ret}");
        let params = kids.get(1).copied();
        let body = kids.get(2).copied();

        self.with_scope(|this| {
            let outer = this.fn_ctx.replace(FunctionCtx { name, ret });
            if let Some(params) = params {
                for decl in this.children(params) {
                    this.visit_decl(decl);
                }
            }
            if let Some(body) = body {
                this.visit_block(body);
            }
            this.fn_ctx = outer;
        });
    }

    fn visit_decl(&mut self, id: NodeId) {
        let kids = self.children(id);
        let (Some(&name_node), Some(&ty_node)) = (kids.first(), kids.get(1)) else {
            return;
        };
        let ty = self.resolve_type(ty_node);
        self.tree.set_type(id, ty);
        self.tree.set_type(name_node, ty);
        self.declare(name_node, SymbolKind::Variable, ty);
    }

    /// Declarations and statements of a block, in the current scope.
    fn visit_block(&mut self, id: NodeId) {
        for child in self.children(id) {
            match self.tree.kind(child) {
                NodeKind::VarDecl => self.visit_decl(child),
                _ => self.visit_statement(child),
            }
        }
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn visit_statement(&mut self, id: NodeId) {
        match self.tree.kind(id) {
            NodeKind::If => self.visit_if(id),
            NodeKind::While => self.visit_while(id),
            NodeKind::Assign => self.visit_assign(id),
            NodeKind::Return => self.visit_return(id),
            NodeKind::Block => self.with_scope(|this| this.visit_block(id)),
            NodeKind::VarDecl => self.visit_decl(id),
            NodeKind::Function => self.visit_function(id),
            _ => {
                self.visit_expression(id);
            }
        }
    }

    fn visit_if(&mut self, id: NodeId) {
        let kids = self.children(id);
        let mut i = 0;
        while i < kids.len() {
            if i + 1 < kids.len() {
                self.check_condition(kids[i], "if");
                let block = kids[i + 1];
                self.with_scope(|this| this.visit_block(block));
                i += 2;
            } else {
                let block = kids[i];
                self.with_scope(|this| this.visit_block(block));
                i += 1;
            }
        }
    }

    fn visit_while(&mut self, id: NodeId) {
        let kids = self.children(id);
        if let Some(&cond) = kids.first() {
            self.check_condition(cond, "while");
        }
        if let Some(&block) = kids.get(1) {
            self.with_scope(|this| this.visit_block(block));
        }
    }

    fn check_condition(&mut self, cond: NodeId, construct: &str) {
        if let Some(ty) = self.visit_expression(cond) {
            if ty != Type::BOOL {
                let line = self.tree.line(cond);
                self.error(
                    SemanticErrorKind::ConditionNotBool,
                    line,
                    construct,
                    format!("condition must be bool, found {ty}"),
                );
            }
        }
    }

    fn visit_assign(&mut self, id: NodeId) {
        let kids = self.children(id);
        let (Some(&target), Some(&value)) = (kids.first(), kids.get(1)) else {
            return;
        };
        let lhs = self.visit_var_ref(target);
        let rhs = self.visit_expression(value);

        if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
            if lhs == rhs {
                self.tree.set_type(id, lhs);
            } else {
                let name = self.var_ref_name(target);
                self.error(
                    SemanticErrorKind::TypeMismatch,
                    self.tree.line(id),
                    name,
                    format!("cannot assign {rhs} to {lhs}"),
                );
            }
        }
    }

    fn visit_return(&mut self, id: NodeId) {
        let line = self.tree.line(id);
        let value = self.tree.child(id, 0);
        let Some(ctx) = self.fn_ctx.clone() else {
            if let Some(value) = value {
                self.visit_expression(value);
            }
            self.error(
                SemanticErrorKind::ReturnMismatch,
                line,
                "return",
                "return outside of a function".to_string(),
            );
            return;
        };
        self.tree.set_type(id, ctx.ret);

        match value {
            None if !ctx.ret.is_void() => self.error(
                SemanticErrorKind::ReturnMismatch,
                line,
                ctx.name,
                format!("missing return value, expected {}", ctx.ret),
            ),
            None => {}
            Some(value) => {
                let found = self.visit_expression(value);
                if ctx.ret.is_void() {
                    self.error(
                        SemanticErrorKind::ReturnMismatch,
                        line,
                        ctx.name,
                        "void function cannot return a value".to_string(),
                    );
                } else if let Some(found) = found {
                    if found != ctx.ret {
                        self.error(
                            SemanticErrorKind::ReturnMismatch,
                            line,
                            ctx.name,
                            format!("returns {found}, expected {}", ctx.ret),
                        );
                    }
                }
            }
        }
    }

    // ── References and calls ────────────────────────────────────────────

    fn var_ref_name(&self, id: NodeId) -> String {
        match self.tree.child(id, 0) {
            Some(name_node) => self.name_of(name_node),
            None => String::new(),
        }
    }

    /// Resolve a variable reference and apply its indices.
    fn visit_var_ref(&mut self, id: NodeId) -> Option<Type> {
        let kids = self.children(id);
        let &name_node = kids.first()?;
        let name = self.name_of(name_node);
        let line = self.tree.line(id);

        let symbol = match self.symbols.lookup(&name) {
            Some(symbol) => symbol.clone(),
            None => {
                self.error(
                    SemanticErrorKind::Undeclared,
                    line,
                    name,
                    "undeclared identifier".to_string(),
                );
                return None;
            }
        };
        if symbol.kind == SymbolKind::Function {
            self.error(
                SemanticErrorKind::NotAVariable,
                line,
                name,
                format!("is a function (declared at line {})", symbol.line),
            );
            return None;
        }
        self.tree.set_type(name_node, symbol.ty);

        let mut ty = symbol.ty;
        let mut overflow = false;
        for (applied, &index) in kids[1..].iter().enumerate() {
            let index_ty = self.visit_expression(index);
            if matches!(index_ty, Some(t) if t != Type::INT) {
                let index_line = self.tree.line(index);
                self.error(
                    SemanticErrorKind::IndexNotInt,
                    index_line,
                    name.clone(),
                    format!("index must be int, found {}", index_ty.unwrap_or(Type::VOID)),
                );
            }
            if overflow {
                continue;
            }
            match ty.element() {
                Some(element) => ty = element,
                None => {
                    overflow = true;
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        line,
                        name.clone(),
                        format!(
                            "{} cannot be indexed {} times",
                            symbol.ty,
                            applied + 1
                        ),
                    );
                }
            }
        }
        if overflow {
            return None;
        }

        self.tree.set_type(id, ty);
        Some(ty)
    }

    fn visit_call(&mut self, id: NodeId) -> Option<Type> {
        let kids = self.children(id);
        let &name_node = kids.first()?;
        let name = self.name_of(name_node);
        let line = self.tree.line(id);

        let callee = match self.symbols.lookup(&name) {
            None => {
                self.error(
                    SemanticErrorKind::Undeclared,
                    line,
                    name,
                    "undeclared function".to_string(),
                );
                None
            }
            Some(symbol) if symbol.kind != SymbolKind::Function => {
                let declared = symbol.line;
                self.error(
                    SemanticErrorKind::NotAFunction,
                    line,
                    name,
                    format!("is not a function (declared at line {declared})"),
                );
                None
            }
            Some(symbol) => Some(symbol.ty),
        };

        // Arguments are checked on their own; arity is not matched.
        for &arg in &kids[1..] {
            self.visit_expression(arg);
        }

        let ret = callee?;
        self.tree.set_type(name_node, ret);
        self.tree.set_type(id, ret);
        Some(ret)
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn visit_expression(&mut self, id: NodeId) -> Option<Type> {
        let kind = self.tree.kind(id);
        let ty = match kind {
            NodeKind::IntLit => Some(Type::INT),
            NodeKind::True | NodeKind::False => Some(Type::BOOL),
            NodeKind::StringLit => Some(STRING_LITERAL),
            NodeKind::VarRef => return self.visit_var_ref(id),
            NodeKind::Call => return self.visit_call(id),
            NodeKind::Or
            | NodeKind::And
            | NodeKind::Eq
            | NodeKind::Ne
            | NodeKind::Lt
            | NodeKind::Gt
            | NodeKind::Le
            | NodeKind::Ge
            | NodeKind::Add
            | NodeKind::Sub
            | NodeKind::Mul
            | NodeKind::Div => self.visit_binary(id, kind),
            NodeKind::Not | NodeKind::Neg => self.visit_unary(id, kind),
            NodeKind::New => self.visit_new(id),
            NodeKind::Ident => self.visit_bare_ident(id),
            NodeKind::Program
            | NodeKind::Function
            | NodeKind::Block
            | NodeKind::Params
            | NodeKind::VarDecl
            | NodeKind::If
            | NodeKind::While
            | NodeKind::Assign
            | NodeKind::Return
            | NodeKind::ArrayOf
            | NodeKind::IntType
            | NodeKind::BoolType
            | NodeKind::CharType
            | NodeKind::StringType => {
                log::debug!("{} is not an expression (line {})", kind.name(), self.tree.line(id));
                None
            }
        };
        if let Some(ty) = ty {
            self.tree.set_type(id, ty);
        }
        ty
    }

    fn visit_binary(&mut self, id: NodeId, kind: NodeKind) -> Option<Type> {
        let kids = self.children(id);
        let lhs = kids.first().and_then(|&l| self.visit_expression(l));
        let rhs = kids.get(1).and_then(|&r| self.visit_expression(r));
        let (lhs, rhs) = (lhs?, rhs?);
        let signature = binary_signature(kind)?;

        let (ok, result, expected) = match signature {
            Signature::Logical => (lhs == Type::BOOL && rhs == Type::BOOL, Type::BOOL, "bool operands"),
            Signature::Equality => (lhs == rhs, Type::BOOL, "operands of the same type"),
            Signature::Ordering => (lhs == Type::INT && rhs == Type::INT, Type::BOOL, "int operands"),
            Signature::Arithmetic => (lhs == Type::INT && rhs == Type::INT, Type::INT, "int operands"),
        };
        if ok {
            return Some(result);
        }

        let op = kind.operator().unwrap_or(kind.name());
        self.error(
            SemanticErrorKind::TypeMismatch,
            self.tree.line(id),
            op,
            format!("expects {expected}, found {lhs} and {rhs}"),
        );
        None
    }

    fn visit_unary(&mut self, id: NodeId, kind: NodeKind) -> Option<Type> {
        let operand = self.tree.child(id, 0)?;
        let ty = self.visit_expression(operand)?;
        let expected = if kind == NodeKind::Not { Type::BOOL } else { Type::INT };
        if ty == expected {
            return Some(expected);
        }

        let op = kind.operator().unwrap_or(kind.name());
        self.error(
            SemanticErrorKind::TypeMismatch,
            self.tree.line(id),
            op,
            format!("expects a {expected} operand, found {ty}"),
        );
        None
    }

    /// `new` yields one more array level than its element type.
    fn visit_new(&mut self, id: NodeId) -> Option<Type> {
        let kids = self.children(id);
        let size = kids.first().and_then(|&s| self.visit_expression(s));
        let &ty_node = kids.get(1)?;
        let element = self.resolve_type(ty_node);

        if let Some(size) = size {
            if size != Type::INT {
                self.error(
                    SemanticErrorKind::TypeMismatch,
                    self.tree.line(id),
                    "new",
                    format!("allocation size must be int, found {size}"),
                );
            }
        }
        Some(element.array_of())
    }

    fn visit_bare_ident(&mut self, id: NodeId) -> Option<Type> {
        let name = self.name_of(id);
        match self.symbols.lookup(&name) {
            Some(symbol) if symbol.kind == SymbolKind::Function => {
                let declared = symbol.line;
                self.error(
                    SemanticErrorKind::NotAVariable,
                    self.tree.line(id),
                    name,
                    format!("is a function (declared at line {declared})"),
                );
                None
            }
            Some(symbol) => Some(symbol.ty),
            None => {
                self.error(
                    SemanticErrorKind::Undeclared,
                    self.tree.line(id),
                    name,
                    "undeclared identifier".to_string(),
                );
                None
            }
        }
    }
}
