use super::*;

impl<'a> Parser<'a> {
    /// Parses a single statement (or declaration).
    /// A trailing semicolon is optional and consumed when present.
    pub fn parse_declaration(&mut self) -> Stmt {
        match self.current_token {
            Token::Let => self.parse_let_declaration(),
            Token::Return => self.parse_return_stmt(),
            _ => {
                // expression statement
                let expr = self.parse_expr();
                self.eat(Token::Semi);
                Stmt::ExprStmt(expr)
            }
        }
    }

    /// Parses the statements of a `{ ... }` body. The opening brace must
    /// already be consumed by the caller; this is what lets `{` at expression
    /// position lex as a hash literal instead.
    pub(crate) fn parse_block_body(&mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        if !self.eat(Token::CloseBrace) {
            loop {
                body.push(self.parse_declaration());

                if self.eat(Token::CloseBrace) {
                    break;
                } else if self.current_token == Token::Eof {
                    self.expect(Token::CloseBrace);
                    break;
                }
            }
        }
        body
    }

    fn parse_let_declaration(&mut self) -> Stmt {
        self.expect(Token::Let);
        let ident = match self.expect_identifier() {
            Some(ident) => ident,
            None => return Stmt::Error,
        };
        self.expect(Token::Equals);
        let initializer = self.parse_expr();
        self.eat(Token::Semi);
        Stmt::LetDeclaration { ident, initializer }
    }

    fn parse_return_stmt(&mut self) -> Stmt {
        self.expect(Token::Return);
        let expr = self.parse_expr();
        self.eat(Token::Semi);
        Stmt::ReturnStmt(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn stmt(source: &str) -> Stmt {
        let source = source.into();
        let ast = Parser::new(&source).parse_declaration();
        assert!(!source.has_errors());
        ast
    }

    fn program(source: &str) -> Vec<Stmt> {
        let source = source.into();
        let ast = Parser::new(&source).parse_program();
        assert!(!source.has_errors());
        ast
    }

    #[test]
    fn test_let_declaration() {
        assert_eq!(
            stmt("let x = 2;"),
            Stmt::LetDeclaration {
                ident: "x".to_string(),
                initializer: Expr::IntLit(2),
            }
        );
        assert_eq!(stmt("let x = 1 + 2;").to_string(), "let x = (1 + 2);");
    }

    #[test]
    fn test_return_stmt() {
        assert_eq!(stmt("return 1;"), Stmt::ReturnStmt(Expr::IntLit(1)));
        assert_eq!(stmt("return 1 + 2;").to_string(), "return (1 + 2);");
    }

    #[test]
    fn test_semicolons_are_optional() {
        assert_eq!(stmt("let x = 2"), stmt("let x = 2;"));
        assert_eq!(stmt("return 1"), stmt("return 1;"));
        assert_eq!(
            program("1; 2"),
            vec![Stmt::ExprStmt(Expr::IntLit(1)), Stmt::ExprStmt(Expr::IntLit(2))]
        );
    }

    #[test]
    fn test_statement_sequence() {
        assert_eq!(
            program("let x = 5; x;"),
            vec![
                Stmt::LetDeclaration {
                    ident: "x".to_string(),
                    initializer: Expr::IntLit(5),
                },
                Stmt::ExprStmt(Expr::Identifier("x".to_string())),
            ]
        );
    }

    #[test]
    fn test_if_statement_boundary() {
        // an `if` expression statement does not need a semicolon
        let program = program("if (true) { 10 } 3333");
        assert_eq!(program.len(), 2);
        assert_eq!(program[1], Stmt::ExprStmt(Expr::IntLit(3333)));
    }
}
