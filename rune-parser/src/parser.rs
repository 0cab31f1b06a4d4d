mod expr;
mod stmt;

use crate::ast::Stmt;
use crate::lexer::Token;
use logos::{Lexer, Logos};
use rune_source::{Source, SyntaxError};
use std::mem;

pub struct Parser<'a> {
    /// Cached token for peeking.
    current_token: Token,
    lexer: Lexer<'a, Token>,
    /// Source code
    source: &'a Source<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        let mut lexer = Token::lexer(source.content);
        Self {
            current_token: lexer.next().unwrap_or(Token::Eof),
            lexer,
            source,
        }
    }

    /// Parses statements until the end of input.
    /// Errors are reported into the [`Source`]'s error list; parsing keeps
    /// going so that multiple diagnostics can be reported at once.
    pub fn parse_program(&mut self) -> Vec<Stmt> {
        let mut program = Vec::new();
        while self.current_token != Token::Eof {
            program.push(self.parse_declaration());
        }
        program
    }
}

/// Parse utilities
impl<'a> Parser<'a> {
    fn next(&mut self) -> Token {
        let token = self.lexer.next().unwrap_or(Token::Eof);
        self.current_token = token.clone();
        token
    }

    /// Predicate that tests whether the next token has the same discriminant and eats the next token if yes as a side effect.
    fn eat(&mut self, tok: Token) -> bool {
        if mem::discriminant(&self.current_token) == mem::discriminant(&tok) {
            self.next(); // eat token
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token) {
        if !self.eat(tok.clone()) {
            self.source.errors.report(SyntaxError::new(
                format!(
                    "expected next token to be `{}`, got `{}` instead",
                    tok, self.current_token
                ),
                self.lexer.span(),
            ));
        }
    }

    /// Eats an identifier token and returns its name, or reports an error.
    fn expect_identifier(&mut self) -> Option<String> {
        if let Token::Identifier(ref ident) = self.current_token {
            let ident = ident.clone();
            self.next();
            Some(ident)
        } else {
            self.source.errors.report(SyntaxError::new(
                format!(
                    "expected next token to be an identifier, got `{}` instead",
                    self.current_token
                ),
                self.lexer.span(),
            ));
            None
        }
    }

    /// Raises an error for a token with no prefix parse function.
    fn unexpected(&mut self) {
        self.source.errors.report(SyntaxError::new(
            format!(
                "no prefix parse function for `{}` found",
                self.current_token
            ),
            self.lexer.span(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn test_errors_accumulate() {
        let source = "let x 5; let = 3;".into();
        let mut parser = Parser::new(&source);
        let program = parser.parse_program();
        assert!(source.has_errors());
        // parsing ran to the end of input despite the errors
        assert!(!program.is_empty());
    }

    #[test]
    fn test_integer_literal_overflow() {
        let source = "9999999999999999999999".into();
        let mut parser = Parser::new(&source);
        let program = parser.parse_program();
        assert!(source.has_errors());
        assert!(source.errors.to_vec()[0]
            .contains("could not parse 9999999999999999999999 as integer"));
        assert_eq!(program, vec![Stmt::ExprStmt(Expr::Error)]);
    }

    #[test]
    fn test_empty_input() {
        let source = "".into();
        let mut parser = Parser::new(&source);
        assert_eq!(parser.parse_program(), vec![]);
        assert!(!source.has_errors());

        let source = "// just a comment".into();
        let mut parser = Parser::new(&source);
        assert_eq!(parser.parse_program(), vec![]);
        assert!(!source.has_errors());
    }
}
