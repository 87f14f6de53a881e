use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone)]
#[logos(skip r"[ \t\r]+")] // Whitespace, newlines are significant
#[logos(skip r"#[^\n]*")] // Comments
pub enum Token {
    // --- Declarations ---
    #[token("string")]
    String,
    #[token("global")]
    Global,
    #[token("fun")]
    Fun,
    #[token("local")]
    Local,

    // --- Instructions ---
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("ifFalse")]
    IfFalse,
    #[token("param")]
    Param,
    #[token("call")]
    Call,
    #[token("ret")]
    Ret,
    #[token("new")]
    New,
    #[token("byte")]
    Byte,

    // --- Names, temps and numbers ---
    #[regex(r"[A-Za-z_.][A-Za-z0-9_.]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"\$[0-9]+", |lex| lex.slice()[1..].parse().ok())]
    Temp(usize),

    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    Number(i32),

    #[regex(r#""[^"\n]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    Str(String),

    // --- Operators ---
    #[token("==")]
    Eq,
    #[token("!=")]
    Neq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Mul,
    #[token("/")]
    Div,

    // --- Punctuation
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("\n")]
    Newline,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::String => write!(f, "'string'"),
            Token::Global => write!(f, "'global'"),
            Token::Fun => write!(f, "'fun'"),
            Token::Local => write!(f, "'local'"),
            Token::Goto => write!(f, "'goto'"),
            Token::If => write!(f, "'if'"),
            Token::IfFalse => write!(f, "'ifFalse'"),
            Token::Param => write!(f, "'param'"),
            Token::Call => write!(f, "'call'"),
            Token::Ret => write!(f, "'ret'"),
            Token::New => write!(f, "'new'"),
            Token::Byte => write!(f, "'byte'"),
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::Temp(t) => write!(f, "${}", t),
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Eq => write!(f, "'=='"),
            Token::Neq => write!(f, "'!='"),
            Token::Le => write!(f, "'<='"),
            Token::Ge => write!(f, "'>='"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            Token::Assign => write!(f, "'='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Mul => write!(f, "'*'"),
            Token::Div => write!(f, "'/'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Colon => write!(f, "':'"),
            Token::Newline => write!(f, "end of line"),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub offset: usize,
}

/// A character the lexer could not turn into a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected character '{unexpected_char}' at line {line}, column {col}\n  Context: {context}")]
pub struct LexicalError {
    pub line: usize,
    pub col: usize,
    pub unexpected_char: char,
    pub context: String,
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let col = before.chars().rev().take_while(|&c| c != '\n').count() + 1;
    (line, col)
}

/// The trimmed source line containing `offset`.
pub fn line_text(source: &str, offset: usize) -> &str {
    let offset = offset.min(source.len());
    let start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = source[offset..].find('\n').map_or(source.len(), |i| offset + i);
    source[start..end].trim()
}

/// Lex the whole input, stopping at the first bad character.
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>, LexicalError> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok(Lexeme { token, offset: span.start }),
            Err(_) => {
                let (line, col) = line_col(source, span.start);
                Err(LexicalError {
                    line,
                    col,
                    unexpected_char: source[span.start..].chars().next().unwrap_or('\0'),
                    context: line_text(source, span.start).to_string(),
                })
            }
        })
        .collect()
}
