//! Line-oriented recursive-descent reader for textual IR.
//!
//! Names are resolved while parsing: function locals first, then globals,
//! then string labels. Globals and strings may be declared anywhere in the
//! file; locals must be declared before their first use.

use super::ir::{Addr, ArithOp, Function, Instr, Program, RelOp, StringConst, Width};
use super::lexer::{line_col, line_text, tokenize, Lexeme, Token};
use crate::CompileError;
use std::collections::{HashMap, HashSet};

/// Frame slots (parameters, locals and temporaries) one function may use.
/// Keeps every frame offset well inside `i32`.
pub const MAX_SLOTS: usize = 1 << 16;

/// Parse a whole IR file.
pub fn parse_program(source: &str) -> Result<Program, CompileError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(source, tokens);
    parser.program()
}

enum BinOp {
    Arith(ArithOp),
    Rel(RelOp),
}

fn binary_op(tok: &Token) -> Option<BinOp> {
    Some(match tok {
        Token::Plus => BinOp::Arith(ArithOp::Add),
        Token::Minus => BinOp::Arith(ArithOp::Sub),
        Token::Mul => BinOp::Arith(ArithOp::Mul),
        Token::Div => BinOp::Arith(ArithOp::Div),
        Token::Eq => BinOp::Rel(RelOp::Eq),
        Token::Neq => BinOp::Rel(RelOp::Neq),
        Token::Lt => BinOp::Rel(RelOp::Lt),
        Token::Gt => BinOp::Rel(RelOp::Gt),
        Token::Le => BinOp::Rel(RelOp::Le),
        Token::Ge => BinOp::Rel(RelOp::Ge),
        _ => return None,
    })
}

/// Per-function parsing state.
#[derive(Default)]
struct FunctionCtx {
    locals: HashMap<String, usize>,
    labels: HashSet<String>,
    /// Jump targets with the position of their first use.
    targets: Vec<(String, usize)>,
    max_temp: Option<usize>,
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Lexeme>,
    pos: usize,
    globals: HashSet<String>,
    strings: HashSet<String>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, tokens: Vec<Lexeme>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            globals: HashSet::new(),
            strings: HashSet::new(),
        }
    }

    // ── Token helpers ───────────────────────────────────────────────────

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|l| &l.token)
    }

    fn peek_at(&self, k: usize) -> Option<&Token> {
        self.tokens.get(self.pos + k).map(|l| &l.token)
    }

    /// Byte offset of the current token (end of input when exhausted).
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|l| l.offset)
            .unwrap_or(self.source.len())
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|l| l.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> CompileError {
        let (line, col) = line_col(self.source, offset);
        CompileError::Parse {
            line,
            col,
            context: line_text(self.source, offset).to_string(),
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = match self.peek() {
            Some(tok) => tok.to_string(),
            None => "end of input".to_string(),
        };
        self.error_at(self.offset(), format!("expected {expected}, found {found}"))
    }

    fn expect(&mut self, expected: Token) -> Result<(), CompileError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn ident(&mut self) -> Result<String, CompileError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn number(&mut self) -> Result<i32, CompileError> {
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.unexpected("number")),
        }
    }

    fn end_line(&mut self) -> Result<(), CompileError> {
        match self.peek() {
            None => Ok(()),
            Some(Token::Newline) => {
                self.skip_newlines();
                Ok(())
            }
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(&Token::Newline) {}
    }

    // ── Program ─────────────────────────────────────────────────────────

    /// Collect global and string names up front so functions may use them
    /// before their declaration line.
    fn prescan(&mut self) {
        let mut line_start = true;
        for window in self.tokens.windows(2) {
            let (tok, next) = (&window[0].token, &window[1].token);
            if line_start {
                match (tok, next) {
                    (Token::Global, Token::Ident(name)) => {
                        self.globals.insert(name.clone());
                    }
                    (Token::String, Token::Ident(label)) => {
                        self.strings.insert(label.clone());
                    }
                    _ => {}
                }
            }
            line_start = *tok == Token::Newline;
        }
    }

    fn program(&mut self) -> Result<Program, CompileError> {
        self.prescan();
        let mut program = Program::new();
        let mut seen_globals = HashSet::new();
        let mut seen_functions = HashSet::new();

        self.skip_newlines();
        while let Some(tok) = self.peek() {
            match tok {
                Token::String => {
                    let at = self.offset();
                    self.pos += 1;
                    let label = self.ident()?;
                    self.expect(Token::Assign)?;
                    let value = match self.bump() {
                        Some(Token::Str(value)) => value,
                        _ => return Err(self.error_at(at, "expected string literal")),
                    };
                    if program.strings.iter().any(|s| s.label == label) {
                        return Err(self.error_at(at, format!("string '{label}' declared twice")));
                    }
                    program.strings.push(StringConst { label, value });
                    self.end_line()?;
                }
                Token::Global => {
                    self.pos += 1;
                    loop {
                        let at = self.offset();
                        let name = self.ident()?;
                        if !seen_globals.insert(name.clone()) {
                            return Err(self.error_at(at, format!("global '{name}' declared twice")));
                        }
                        program.globals.push(name);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.end_line()?;
                }
                Token::Fun => {
                    let at = self.offset();
                    let function = self.function()?;
                    if !seen_functions.insert(function.name.clone()) {
                        return Err(self.error_at(
                            at,
                            format!("function '{}' defined twice", function.name),
                        ));
                    }
                    log::debug!(
                        "parsed function {} ({} args, {} locals, {} temps, {} instrs)",
                        function.name,
                        function.nargs,
                        function.locals.len(),
                        function.n_temps,
                        function.instrs.len()
                    );
                    program.functions.push(function);
                }
                _ => return Err(self.unexpected("'string', 'global' or 'fun'")),
            }
        }
        Ok(program)
    }

    // ── Functions ───────────────────────────────────────────────────────

    fn function(&mut self) -> Result<Function, CompileError> {
        let start = self.offset();
        self.expect(Token::Fun)?;
        let name = self.ident()?;
        let mut function = Function::new(name);
        let mut ctx = FunctionCtx::default();

        self.expect(Token::LParen)?;
        if !self.eat(&Token::RParen) {
            loop {
                self.declare_local(&mut function, &mut ctx)?;
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }
        function.nargs = function.locals.len();
        self.expect(Token::LBrace)?;
        self.end_line()?;

        loop {
            match self.peek() {
                None => return Err(self.unexpected("'}'")),
                Some(Token::RBrace) => {
                    self.pos += 1;
                    self.end_line()?;
                    break;
                }
                Some(Token::Local) => {
                    self.pos += 1;
                    loop {
                        self.declare_local(&mut function, &mut ctx)?;
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.end_line()?;
                }
                Some(_) => {
                    let instr = self.instruction(&mut ctx)?;
                    function.instrs.push(instr);
                    self.end_line()?;
                }
            }
        }

        for (label, at) in &ctx.targets {
            if !ctx.labels.contains(label) {
                return Err(self.error_at(*at, format!("undefined label '{label}'")));
            }
        }
        function.n_temps = ctx.max_temp.map_or(0, |t| t + 1);
        if function.n_slots() > MAX_SLOTS {
            return Err(self.error_at(
                start,
                format!("'{}' uses more than {MAX_SLOTS} frame slots", function.name),
            ));
        }
        Ok(function)
    }

    fn declare_local(&mut self, function: &mut Function, ctx: &mut FunctionCtx) -> Result<(), CompileError> {
        let at = self.offset();
        let name = self.ident()?;
        if ctx.locals.contains_key(&name) {
            return Err(self.error_at(at, format!("'{name}' declared twice in '{}'", function.name)));
        }
        ctx.locals.insert(name.clone(), function.locals.len());
        function.locals.push(name);
        Ok(())
    }

    fn target(&mut self, ctx: &mut FunctionCtx) -> Result<String, CompileError> {
        let at = self.offset();
        let label = self.ident()?;
        ctx.targets.push((label.clone(), at));
        Ok(label)
    }

    // ── Operands ────────────────────────────────────────────────────────

    fn operand(&mut self, ctx: &mut FunctionCtx) -> Result<Addr, CompileError> {
        let at = self.offset();
        let tok = match self.peek() {
            Some(tok @ (Token::Number(_) | Token::Minus | Token::Temp(_) | Token::Ident(_))) => tok.clone(),
            _ => return Err(self.unexpected("operand")),
        };
        self.pos += 1;

        match tok {
            Token::Number(n) => Ok(Addr::Number(n)),
            Token::Minus => Ok(Addr::Number(self.number()?.wrapping_neg())),
            Token::Temp(t) if t >= MAX_SLOTS => {
                Err(self.error_at(at, format!("temporary '${t}' out of range")))
            }
            Token::Temp(t) => {
                ctx.max_temp = Some(ctx.max_temp.map_or(t, |m| m.max(t)));
                Ok(Addr::Temp(t))
            }
            Token::Ident(name) => {
                if let Some(&i) = ctx.locals.get(&name) {
                    Ok(Addr::Local(i))
                } else if self.globals.contains(&name) {
                    Ok(Addr::Global(name))
                } else if self.strings.contains(&name) {
                    Ok(Addr::Str(name))
                } else {
                    Err(self.error_at(at, format!("unknown name '{name}'")))
                }
            }
            _ => Err(self.error_at(at, "expected operand")),
        }
    }

    /// An operand that can be written to.
    fn destination(&mut self, ctx: &mut FunctionCtx) -> Result<Addr, CompileError> {
        let at = self.offset();
        let addr = self.operand(ctx)?;
        match addr {
            Addr::Local(_) | Addr::Temp(_) | Addr::Global(_) => Ok(addr),
            Addr::Number(_) | Addr::Str(_) => {
                Err(self.error_at(at, format!("cannot assign to '{addr}'")))
            }
        }
    }

    fn index(&mut self, ctx: &mut FunctionCtx) -> Result<Addr, CompileError> {
        self.expect(Token::LBracket)?;
        let index = self.operand(ctx)?;
        self.expect(Token::RBracket)?;
        Ok(index)
    }

    // ── Instructions ────────────────────────────────────────────────────

    fn instruction(&mut self, ctx: &mut FunctionCtx) -> Result<Instr, CompileError> {
        let at = self.offset();
        match self.peek() {
            Some(Token::Ident(_)) if self.peek_at(1) == Some(&Token::Colon) => {
                let label = self.ident()?;
                self.pos += 1;
                if !ctx.labels.insert(label.clone()) {
                    return Err(self.error_at(at, format!("label '{label}' defined twice")));
                }
                Ok(Instr::Label(label))
            }
            Some(Token::Goto) => {
                self.pos += 1;
                Ok(Instr::Goto(self.target(ctx)?))
            }
            Some(Token::If) | Some(Token::IfFalse) => {
                let negated = self.bump() == Some(Token::IfFalse);
                let cond = self.operand(ctx)?;
                self.expect(Token::Goto)?;
                let target = self.target(ctx)?;
                Ok(if negated {
                    Instr::IfFalse { cond, target }
                } else {
                    Instr::If { cond, target }
                })
            }
            Some(Token::Param) => {
                self.pos += 1;
                Ok(Instr::Param(self.operand(ctx)?))
            }
            Some(Token::Call) => {
                self.pos += 1;
                self.call(None)
            }
            Some(Token::Ret) => {
                self.pos += 1;
                match self.peek() {
                    None | Some(Token::Newline) => Ok(Instr::Return(None)),
                    Some(_) => Ok(Instr::Return(Some(self.operand(ctx)?))),
                }
            }
            Some(Token::Byte) => {
                self.pos += 1;
                let base = self.destination(ctx)?;
                let index = self.index(ctx)?;
                self.expect(Token::Assign)?;
                let src = self.operand(ctx)?;
                Ok(Instr::StoreIndexed { width: Width::Byte, base, index, src })
            }
            Some(_) => {
                let dst = self.destination(ctx)?;
                if self.peek() == Some(&Token::LBracket) {
                    let index = self.index(ctx)?;
                    self.expect(Token::Assign)?;
                    let src = self.operand(ctx)?;
                    return Ok(Instr::StoreIndexed { width: Width::Word, base: dst, index, src });
                }
                self.expect(Token::Assign)?;
                self.assignment(dst, ctx)
            }
            None => Err(self.unexpected("instruction")),
        }
    }

    fn call(&mut self, ret: Option<Addr>) -> Result<Instr, CompileError> {
        let func = self.ident()?;
        let at = self.offset();
        let nargs = self.number()?;
        let nargs = usize::try_from(nargs)
            .map_err(|_| self.error_at(at, "argument count must not be negative"))?;
        Ok(Instr::Call { func, nargs, ret })
    }

    /// Right-hand side of `dst = ...`.
    fn assignment(&mut self, dst: Addr, ctx: &mut FunctionCtx) -> Result<Instr, CompileError> {
        match self.peek() {
            Some(Token::Call) => {
                self.pos += 1;
                self.call(Some(dst))
            }
            Some(Token::Minus) if !matches!(self.peek_at(1), Some(Token::Number(_))) => {
                self.pos += 1;
                let src = self.operand(ctx)?;
                Ok(Instr::Neg { dst, src })
            }
            Some(Token::New) => {
                self.pos += 1;
                let width = if self.eat(&Token::Byte) { Width::Byte } else { Width::Word };
                let count = self.operand(ctx)?;
                Ok(Instr::New { width, dst, count })
            }
            Some(Token::Byte) => {
                self.pos += 1;
                let src = self.operand(ctx)?;
                if self.peek() == Some(&Token::LBracket) {
                    let index = self.index(ctx)?;
                    Ok(Instr::LoadIndexed { width: Width::Byte, dst, base: src, index })
                } else {
                    Ok(Instr::Move { width: Width::Byte, dst, src })
                }
            }
            _ => {
                let left = self.operand(ctx)?;
                if self.peek() == Some(&Token::LBracket) {
                    let index = self.index(ctx)?;
                    return Ok(Instr::LoadIndexed { width: Width::Word, dst, base: left, index });
                }
                let Some(op) = self.peek().and_then(binary_op) else {
                    return Ok(Instr::Move { width: Width::Word, dst, src: left });
                };
                self.pos += 1;
                let right = self.operand(ctx)?;
                Ok(match op {
                    BinOp::Arith(op) => Instr::Arith { op, dst, left, right },
                    BinOp::Rel(op) => Instr::Compare { op, dst, left, right },
                })
            }
        }
    }
}
