//! Statement parsing implementation
//!
//! This module handles parsing of statements and indented blocks:
//!
//! - Simple statements: assignment (plain, chained, unpacking, augmented),
//!   expression statements, `pass`, `break`, `continue`; several may share a
//!   line when separated by `;`
//! - Compound statements: `if`/`elif`/`else`, `for ... in ...`, `while`
//! - Blocks: either an indented suite or a single-line suite after `:`
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse one statement line or compound statement.
    ///
    /// A simple line may hold several `;`-separated statements, so a list is
    /// returned.
    pub(crate) fn parse_statement(&mut self) -> Result<Vec<Stmt>, ParseError> {
        match self.peek_token() {
            Token::If(_) => Ok(vec![self.parse_if_statement()?]),
            Token::For(_) => Ok(vec![self.parse_for_statement()?]),
            Token::While(_) => Ok(vec![self.parse_while_statement()?]),
            Token::Elif(_) | Token::Else(_) => Err(ParseError {
                message: format!("invalid syntax: unexpected {}", self.peek()),
                location: self.current_location(),
            }),
            _ => self.parse_simple_line(),
        }
    }

    /// Parse `;`-separated simple statements up to the end of the line
    fn parse_simple_line(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![self.parse_simple_statement()?];

        while self.match_token(&Token::Semicolon(self.current_location())) {
            if self.check(&Token::Newline(self.current_location()))
                || self.is_at_end()
            {
                break;
            }
            statements.push(self.parse_simple_statement()?);
        }

        if !self.is_at_end() {
            self.expect_token(
                &Token::Newline(self.current_location()),
                "Expected end of line",
            )?;
        }

        Ok(statements)
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();

        match self.peek_token() {
            Token::Pass(_) => {
                self.advance();
                return Ok(Stmt::Pass { location });
            }
            Token::Break(_) | Token::Continue(_) => {
                let is_break = matches!(self.peek(), Token::Break(_));
                if self.loop_depth == 0 {
                    let keyword = if is_break { "break" } else { "continue" };
                    return Err(self.error_here(&format!(
                        "'{keyword}' outside loop"
                    )));
                }
                self.advance();
                return Ok(if is_break {
                    Stmt::Break { location }
                } else {
                    Stmt::Continue { location }
                });
            }
            Token::Reserved(keyword, _) => {
                return Err(self.error_here(&format!(
                    "unsupported statement '{keyword}'"
                )));
            }
            _ => {}
        }

        let expr = self.parse_testlist()?;

        if self.check(&Token::Eq(self.current_location())) {
            let mut targets = vec![Self::expr_to_target(expr)?];
            loop {
                self.advance(); // consume '='
                let value = self.parse_testlist()?;
                if self.check(&Token::Eq(self.current_location())) {
                    targets.push(Self::expr_to_target(value)?);
                } else {
                    return Ok(Stmt::Assign {
                        targets,
                        value,
                        location,
                    });
                }
            }
        }

        if let Some(op) = self.augmented_operator() {
            let target = match Self::expr_to_target(expr)? {
                Target::Tuple(_, loc) => {
                    return Err(ParseError {
                        message: "illegal expression for augmented assignment"
                            .to_string(),
                        location: loc,
                    });
                }
                target => target,
            };
            self.advance(); // consume 'op='
            let value = self.parse_testlist()?;
            return Ok(Stmt::AugAssign {
                target,
                op,
                value,
                location,
            });
        }

        Ok(Stmt::Expr { expr, location })
    }

    /// Map the current token to the operator of an augmented assignment
    fn augmented_operator(&self) -> Option<BinOp> {
        match self.peek() {
            Token::PlusEq(_) => Some(BinOp::Add),
            Token::MinusEq(_) => Some(BinOp::Sub),
            Token::StarEq(_) => Some(BinOp::Mul),
            Token::SlashEq(_) => Some(BinOp::Div),
            Token::DoubleSlashEq(_) => Some(BinOp::FloorDiv),
            Token::PercentEq(_) => Some(BinOp::Mod),
            Token::DoubleStarEq(_) => Some(BinOp::Pow),
            Token::CaretEq(_) => Some(BinOp::BitXor),
            _ => None,
        }
    }

    /// Reinterpret a parsed expression as an assignment target
    pub(crate) fn expr_to_target(expr: Expr) -> Result<Target, ParseError> {
        match expr {
            Expr::Name(name, loc) => Ok(Target::Name(name, loc)),
            Expr::Subscript {
                value,
                index,
                location,
            } => Ok(Target::Subscript {
                value: *value,
                index: *index,
                location,
            }),
            Expr::Tuple { elements, location }
            | Expr::List { elements, location } => {
                let targets = elements
                    .into_iter()
                    .map(Self::expr_to_target)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Target::Tuple(targets, location))
            }
            other => Err(ParseError {
                message: format!("cannot assign to {}", describe_expr(&other)),
                location: other.location(),
            }),
        }
    }

    /// Parse an indented block or a single-line suite after `:`
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if !self.match_token(&Token::Newline(self.current_location())) {
            return self.parse_simple_line();
        }

        self.expect_token(
            &Token::Indent(self.current_location()),
            "expected an indented block",
        )?;

        let mut body = Vec::new();
        while !self.check(&Token::Dedent(self.current_location()))
            && !self.is_at_end()
        {
            if self.check(&Token::Indent(self.current_location())) {
                return Err(self.error_here("unexpected indent"));
            }
            body.extend(self.parse_statement()?);
        }
        self.match_token(&Token::Dedent(self.current_location()));

        Ok(body)
    }

    /// Parse if statement: if test: block [elif test: block]* [else: block]
    fn parse_if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'if' or 'elif'
        let location = self.previous_location();

        let test = self.parse_test()?;
        self.expect_colon("after if condition")?;
        let body = self.parse_block()?;

        let orelse = if self.check(&Token::Elif(self.current_location())) {
            vec![self.parse_if_statement()?]
        } else if self.match_token(&Token::Else(self.current_location())) {
            self.expect_colon("after 'else'")?;
            self.parse_block()?
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            test,
            body,
            orelse,
            location,
        })
    }

    /// Parse for statement: for target in iterable: block
    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'for'
        let location = self.previous_location();

        let target_expr = self.parse_target_list()?;
        let target = Self::expr_to_target(target_expr)?;

        self.expect_token(
            &Token::In(self.current_location()),
            "Expected 'in' after for-loop target",
        )?;
        let iter = self.parse_testlist()?;
        self.expect_colon("after for-loop iterable")?;

        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;

        Ok(Stmt::For {
            target,
            iter,
            body: body?,
            location,
        })
    }

    /// Parse while statement: while test: block
    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'while'
        let location = self.previous_location();

        let test = self.parse_test()?;
        self.expect_colon("after while condition")?;

        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;

        Ok(Stmt::While {
            test,
            body: body?,
            location,
        })
    }
}

/// Human-readable name of an expression kind for error messages
fn describe_expr(expr: &Expr) -> &'static str {
    match expr {
        Expr::Int(..) | Expr::Float(..) | Expr::Str(..) | Expr::Bool(..) => {
            "literal"
        }
        Expr::NoneLiteral(_) => "None",
        Expr::Call { .. } | Expr::MethodCall { .. } => "function call",
        Expr::BinaryOp { .. } | Expr::UnaryOp { .. } => "expression",
        Expr::BoolOp { .. } => "boolean expression",
        Expr::Compare { .. } => "comparison",
        Expr::IfExp { .. } => "conditional expression",
        Expr::Dict { .. } => "dict literal",
        Expr::Set { .. } => "set literal",
        Expr::Slice { .. } => "slice",
        Expr::Name(..) | Expr::List { .. } | Expr::Tuple { .. } | Expr::Subscript { .. } => {
            "expression"
        }
    }
}
