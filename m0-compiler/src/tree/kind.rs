/// Every node kind the front end can hand us.
///
/// Child layout per kind (the parser guarantees it, the checker relies on it):
///
/// - `Program`: any mix of `Function` and `VarDecl`.
/// - `Function`: `Ident`, `Params`, `Block`, then an optional type node (absent = void).
/// - `Block`: `VarDecl`s followed by statements.
/// - `Params`: `VarDecl`s.
/// - `VarDecl`: `Ident`, type node.
/// - `VarRef`: `Ident`, then zero or more index expressions.
/// - `If`: one or more (expression, `Block`) pairs, then an optional `Block` (else).
/// - `While`: expression, `Block`.
/// - `Assign`: `VarRef`, expression.
/// - `Return`: optional expression.
/// - `Call`: `Ident`, then argument expressions.
/// - `ArrayOf`: one type node. Other type nodes are leaves.
/// - Binary operators and `New`: two children (`New` is size expression, type node).
/// - `Not`, `Neg`: one child.
/// - Literals and `Ident` are leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    Function,
    Block,
    Params,
    VarDecl,
    VarRef,

    If,
    While,
    Assign,
    Return,
    Call,

    ArrayOf,
    IntType,
    BoolType,
    CharType,
    StringType,

    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    New,

    Not,
    Neg,

    True,
    False,
    StringLit,
    IntLit,
    Ident,
}

impl NodeKind {
    /// Upper-case tag used by the tree printer.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Program => "PROGRAM",
            NodeKind::Function => "FUNCTION",
            NodeKind::Block => "BLOCK",
            NodeKind::Params => "PARAMS",
            NodeKind::VarDecl => "VARDECL",
            NodeKind::VarRef => "VARREF",
            NodeKind::If => "IF",
            NodeKind::While => "WHILE",
            NodeKind::Assign => "ASSIGN",
            NodeKind::Return => "RETURN",
            NodeKind::Call => "CALL",
            NodeKind::ArrayOf => "ARRAY_OF",
            NodeKind::IntType => "INT",
            NodeKind::BoolType => "BOOL",
            NodeKind::CharType => "CHAR",
            NodeKind::StringType => "STRING",
            NodeKind::Or => "OR",
            NodeKind::And => "AND",
            NodeKind::Eq => "EQ",
            NodeKind::Ne => "NE",
            NodeKind::Lt => "LT",
            NodeKind::Gt => "GT",
            NodeKind::Le => "LE",
            NodeKind::Ge => "GE",
            NodeKind::Add => "ADD",
            NodeKind::Sub => "SUB",
            NodeKind::Mul => "MUL",
            NodeKind::Div => "DIV",
            NodeKind::New => "NEW",
            NodeKind::Not => "NOT",
            NodeKind::Neg => "NEG",
            NodeKind::True => "TRUE",
            NodeKind::False => "FALSE",
            NodeKind::StringLit => "STRING_LIT",
            NodeKind::IntLit => "INT_LIT",
            NodeKind::Ident => "ID",
        }
    }

    /// Source-level spelling of an operator, used in diagnostics.
    pub fn operator(&self) -> Option<&'static str> {
        Some(match self {
            NodeKind::Or => "||",
            NodeKind::And => "&&",
            NodeKind::Eq => "==",
            NodeKind::Ne => "!=",
            NodeKind::Lt => "<",
            NodeKind::Gt => ">",
            NodeKind::Le => "<=",
            NodeKind::Ge => ">=",
            NodeKind::Add => "+",
            NodeKind::Sub => "-",
            NodeKind::Mul => "*",
            NodeKind::Div => "/",
            NodeKind::New => "new",
            NodeKind::Not => "!",
            NodeKind::Neg => "-",
            _ => return None,
        })
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::ArrayOf
                | NodeKind::IntType
                | NodeKind::BoolType
                | NodeKind::CharType
                | NodeKind::StringType
        )
    }
}
