use logos::Logos;
use std::fmt;

#[derive(Debug, Logos, Clone, PartialEq)]
pub enum Token {
    // literals
    // any digit run lexes; conversion to i64 happens in the parser so an
    // overflowing literal is a parse error, not an illegal token
    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    Int(String),
    #[regex(r"true|false", |lex| if lex.slice() == "true" { true } else { false } )]
    BoolLit(bool),
    #[regex(r#""[^"]*""#, |lex| lex.slice()[1..lex.slice().len() - 1].to_string())]
    StringLit(String),

    // identifiers
    #[regex("[a-zA-Z_]+", |lex| lex.slice().to_string())]
    Identifier(String),

    // unary operators
    #[token("!")]
    Bang,

    // binary operators
    // - arithmetics
    #[token("+")]
    Plus,
    #[token("-")]
    Minus, // NOTE: can also be unary
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    // - binding
    #[token("=")]
    Equals,
    // - equality
    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    NotEquals,
    // - ordering
    #[token(">")]
    GreaterThan,
    #[token("<")]
    LessThan,

    // punctuation
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,

    // keywords
    #[token("fn")]
    Fn,
    #[token("let")]
    Let,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,

    // misc
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)] // single line comments
    #[error]
    Error,

    /// Only generated in parse phase when `lexer.next()` returns `None`.
    Eof,
}

impl Token {
    /// Returns the binary binding power or `None` if invalid binop token.
    /// Binding power `0` is reserved for accepting any expression.
    /// All binary operators are left-associative.
    pub fn binop_bp(&self) -> Option<(u8, u8)> {
        match self {
            /* Equality */
            Token::EqualsEquals | Token::NotEquals => Some((2, 3)),
            /* Ordering */
            Token::LessThan | Token::GreaterThan => Some((4, 5)),
            /* Additive */
            Token::Plus | Token::Minus => Some((6, 7)),
            /* Multiplicative */
            Token::Asterisk | Token::Slash => Some((8, 9)),
            _ => None,
        }
    }

    /// Binding power for the operand of a prefix operator (`!` and unary `-`).
    /// Binds tighter than any binary operator but looser than calls and
    /// indexing, so `-a * b` negates only `a` and `-a[0]` negates the element.
    pub const PREFIX_BP: u8 = 10;

    /// Returns the postfix binding power or `None` if not a postfix token.
    /// Calls (`(`) and indexing (`[`) bind tighter than everything else.
    pub fn postfix_bp(&self) -> Option<u8> {
        match self {
            Token::OpenParen => Some(11),
            Token::OpenBracket => Some(13),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(val) => write!(f, "{}", val),
            Token::BoolLit(val) => write!(f, "{}", val),
            Token::StringLit(val) => write!(f, "\"{}\"", val),
            Token::Identifier(ident) => write!(f, "{}", ident),
            Token::Bang => write!(f, "!"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Equals => write!(f, "="),
            Token::EqualsEquals => write!(f, "=="),
            Token::NotEquals => write!(f, "!="),
            Token::GreaterThan => write!(f, ">"),
            Token::LessThan => write!(f, "<"),
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),
            Token::OpenBrace => write!(f, "{{"),
            Token::CloseBrace => write!(f, "}}"),
            Token::OpenBracket => write!(f, "["),
            Token::CloseBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Fn => write!(f, "fn"),
            Token::Let => write!(f, "let"),
            Token::Return => write!(f, "return"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Error => write!(f, "<illegal>"),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).collect()
    }

    #[test]
    fn test_literals() {
        assert_eq!(lex("5"), vec![Token::Int("5".to_string())]);
        assert_eq!(lex("true"), vec![Token::BoolLit(true)]);
        assert_eq!(lex("false"), vec![Token::BoolLit(false)]);
        assert_eq!(lex("\"hello\""), vec![Token::StringLit("hello".to_string())]);
        assert_eq!(lex("foo"), vec![Token::Identifier("foo".to_string())]);
    }

    #[test]
    fn test_any_digit_run_lexes() {
        // even runs too large for an i64; the parser rejects those
        assert_eq!(
            lex("99999999999999999999999"),
            vec![Token::Int("99999999999999999999999".to_string())]
        );
    }

    #[test]
    fn test_keywords_win_over_identifiers() {
        assert_eq!(
            lex("let fn return if else"),
            vec![Token::Let, Token::Fn, Token::Return, Token::If, Token::Else]
        );
        // a keyword prefix is still an identifier
        assert_eq!(lex("lettuce"), vec![Token::Identifier("lettuce".to_string())]);
        assert_eq!(lex("truest"), vec![Token::Identifier("truest".to_string())]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("= == != < > + - * / !"),
            vec![
                Token::Equals,
                Token::EqualsEquals,
                Token::NotEquals,
                Token::LessThan,
                Token::GreaterThan,
                Token::Plus,
                Token::Minus,
                Token::Asterisk,
                Token::Slash,
                Token::Bang,
            ]
        );
    }

    #[test]
    fn test_skips_comments_and_whitespace() {
        assert_eq!(
            lex("1 // the rest is ignored\n2"),
            vec![Token::Int("1".to_string()), Token::Int("2".to_string())]
        );
    }

    #[test]
    fn test_illegal_character() {
        assert_eq!(lex("@"), vec![Token::Error]);
    }
}
