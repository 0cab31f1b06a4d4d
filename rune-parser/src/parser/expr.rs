use crate::ast::Expr;

use super::*;

impl<'a> Parser<'a> {
    /* Expressions */
    /// Parses any expression.
    /// This is equivalent to calling [`Self::parse_expr_bp`] with `min_bp = 0`.
    pub fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0) // 0 to accept any expression
    }

    /// Parses a primary (atom) expression.
    fn parse_primary_expr(&mut self) -> Expr {
        // NOTE: prefix operators are handled here
        match self.current_token {
            Token::Int(_) | Token::BoolLit(_) | Token::StringLit(_) => self.parse_literal_expr(),
            Token::Identifier(_) => self.parse_identifier_expr(),
            Token::Bang => {
                self.next();
                Expr::Unary {
                    op: Token::Bang,
                    arg: Box::new(self.parse_expr_bp(Token::PREFIX_BP)),
                }
            }
            Token::Minus => {
                self.next();
                Expr::Unary {
                    op: Token::Minus,
                    arg: Box::new(self.parse_expr_bp(Token::PREFIX_BP)),
                }
            }
            Token::OpenParen => self.parse_grouped_expr(),
            Token::If => self.parse_if_expr(),
            Token::Fn => self.parse_fn_expr(),
            Token::OpenBracket => self.parse_array_expr(),
            Token::OpenBrace => self.parse_hash_expr(),
            _ => {
                self.unexpected();
                self.next(); // always make progress, even on bad input
                Expr::Error
            }
        }
    }

    /// Parses an expression with the specified `min_bp`.
    /// To parse any expression, use [`Self::parse_expr`].
    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_primary_expr();

        loop {
            // calls and indexing are postfix operators
            if let Some(bp) = self.current_token.postfix_bp() {
                if bp < min_bp {
                    break;
                }
                lhs = match self.current_token {
                    Token::OpenParen => self.parse_call_expr(lhs),
                    Token::OpenBracket => self.parse_index_expr(lhs),
                    _ => unreachable!(),
                };
                continue;
            }

            let (l_bp, r_bp) = match self.current_token.binop_bp() {
                Some(bp) => bp,
                None => break, // not a valid binop, stop parsing
            };
            if l_bp < min_bp {
                break; // less than the min_bp, stop parsing
            }

            // self.current_token is a valid binop
            let binop = self.current_token.clone();
            self.next();

            let rhs = self.parse_expr_bp(r_bp);

            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op: binop,
                rhs: Box::new(rhs),
            }
        }

        lhs
    }

    /* Expressions.Literals */
    /// Parses a literal expression.
    /// A literal can be an integer, a bool or a string literal.
    fn parse_literal_expr(&mut self) -> Expr {
        let val = match self.current_token {
            // the lexer accepts any digit run; the conversion happens here
            Token::Int(ref literal) => match literal.parse() {
                Ok(val) => Expr::IntLit(val),
                Err(_) => {
                    let message = format!("could not parse {} as integer", literal);
                    self.source
                        .errors
                        .report(SyntaxError::new(message, self.lexer.span()));
                    self.next(); // skip the bad literal
                    return Expr::Error;
                }
            },
            Token::BoolLit(val) => Expr::BoolLit(val),
            Token::StringLit(ref val) => Expr::StringLit(val.clone()),
            _ => {
                self.unexpected();
                Expr::Error
            }
        };
        if val != Expr::Error {
            self.next(); // eat parsed token if not error
        }
        val
    }

    /* Expressions.Identifier */
    fn parse_identifier_expr(&mut self) -> Expr {
        match self.current_token.clone() {
            Token::Identifier(ident) => {
                self.next();
                Expr::Identifier(ident)
            }
            _ => {
                self.unexpected();
                Expr::Error
            }
        }
    }

    /// Parses a parenthesized expression. The parentheses only steer
    /// precedence; no AST node is created.
    fn parse_grouped_expr(&mut self) -> Expr {
        self.expect(Token::OpenParen);
        let expr = self.parse_expr();
        self.expect(Token::CloseParen);
        expr
    }

    fn parse_if_expr(&mut self) -> Expr {
        self.expect(Token::If);
        self.expect(Token::OpenParen);
        let cond = self.parse_expr();
        self.expect(Token::CloseParen);
        self.expect(Token::OpenBrace);
        let then_branch = self.parse_block_body();
        let else_branch = if self.eat(Token::Else) {
            self.expect(Token::OpenBrace);
            Some(self.parse_block_body())
        } else {
            None
        };
        Expr::If {
            cond: Box::new(cond),
            then_branch,
            else_branch,
        }
    }

    fn parse_fn_expr(&mut self) -> Expr {
        self.expect(Token::Fn);
        self.expect(Token::OpenParen);
        let mut params = Vec::new();
        if !self.eat(Token::CloseParen) {
            loop {
                match self.expect_identifier() {
                    Some(param) => params.push(param),
                    None => return Expr::Error,
                }

                if self.eat(Token::CloseParen) {
                    break;
                } else if !self.eat(Token::Comma) {
                    self.unexpected();
                    break;
                }
            }
        }
        self.expect(Token::OpenBrace);
        let body = self.parse_block_body();
        Expr::FunctionLit { params, body }
    }

    fn parse_array_expr(&mut self) -> Expr {
        self.expect(Token::OpenBracket);
        Expr::ArrayLit(self.parse_expr_list(Token::CloseBracket))
    }

    /// Parses a comma-separated expression list terminated by `end`.
    /// The list may be empty; a trailing comma is not allowed.
    fn parse_expr_list(&mut self, end: Token) -> Vec<Expr> {
        let mut list = Vec::new();
        if !self.eat(end.clone()) {
            loop {
                list.push(self.parse_expr());

                if self.eat(end.clone()) {
                    break;
                } else if !self.eat(Token::Comma) {
                    self.unexpected();
                    break;
                }
            }
        }
        list
    }

    fn parse_hash_expr(&mut self) -> Expr {
        self.expect(Token::OpenBrace);
        let mut pairs = Vec::new();
        if !self.eat(Token::CloseBrace) {
            loop {
                let key = self.parse_expr();
                self.expect(Token::Colon);
                let value = self.parse_expr();
                pairs.push((key, value));

                if self.eat(Token::CloseBrace) {
                    break;
                } else if !self.eat(Token::Comma) {
                    self.unexpected();
                    break;
                }
            }
        }
        Expr::HashLit(pairs)
    }

    fn parse_call_expr(&mut self, callee: Expr) -> Expr {
        self.expect(Token::OpenParen);
        let args = self.parse_expr_list(Token::CloseParen);
        Expr::FnCall {
            callee: Box::new(callee),
            args,
        }
    }

    fn parse_index_expr(&mut self, lhs: Expr) -> Expr {
        self.expect(Token::OpenBracket);
        let index = self.parse_expr();
        self.expect(Token::CloseBracket);
        Expr::Index {
            lhs: Box::new(lhs),
            index: Box::new(index),
        }
    }
}
