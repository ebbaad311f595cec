//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `statements`: Parsing statements and indented blocks
//! - `expressions`: Parsing expressions, one method per precedence level
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (line {}, column {})", .location.line, .location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for the snippet language
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    /// Number of enclosing loops; `break`/`continue` are rejected at zero
    pub(crate) loop_depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            loop_depth: 0,
        })
    }

    /// Parse the entire program (top-level statements)
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while self.match_token(&Token::Newline(self.current_location())) {}

        while !self.is_at_end() {
            if self.check(&Token::Indent(self.current_location())) {
                return Err(self.error_here("unexpected indent"));
            }
            let statements = self.parse_statement()?;
            program.body.extend(statements);
        }

        Ok(program)
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    pub(crate) fn peek_token(&self) -> Token {
        self.peek().clone()
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(
        &mut self,
        token: &Token,
        message: &str,
    ) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError {
                message: format!("{}, found {}", message, self.peek()),
                location: self.current_location(),
            })
        }
    }

    pub(crate) fn expect_colon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::Colon(self.current_location()),
            &format!("Expected ':' {ctx}"),
        )
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RParen(self.current_location()),
            &format!("Expected ')' {ctx}"),
        )
    }

    pub(crate) fn expect_rbracket(
        &mut self,
        ctx: &str,
    ) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RBracket(self.current_location()),
            &format!("Expected ']' {ctx}"),
        )
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            Ok(name)
        } else {
            Err(ParseError {
                message: format!("Expected identifier, found {}", self.peek()),
                location: self.current_location(),
            })
        }
    }
}

/// Parse a complete snippet
pub fn parse_source(source: &str) -> Result<Program, ParseError> {
    Parser::new(source)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_assignment() {
        let program = parse_source("x = 1 + 2 * 3").unwrap();

        assert_eq!(program.body.len(), 1);
        match &program.body[0] {
            Stmt::Assign { targets, value, .. } => {
                assert!(matches!(&targets[0], Target::Name(n, _) if n == "x"));
                match value {
                    Expr::BinaryOp {
                        op: BinOp::Add,
                        right,
                        ..
                    } => {
                        assert!(matches!(
                            **right,
                            Expr::BinaryOp { op: BinOp::Mul, .. }
                        ));
                    }
                    other => panic!("Expected addition, got {other:?}"),
                }
            }
            other => panic!("Expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_elif_else() {
        let source = "\
score = 85
if score >= 90:
    grade = 'A'
elif score >= 80:
    grade = 'B'
else:
    grade = 'F'
";
        let program = parse_source(source).unwrap();

        assert_eq!(program.body.len(), 2);
        match &program.body[1] {
            Stmt::If { body, orelse, .. } => {
                assert_eq!(body.len(), 1);
                assert_eq!(orelse.len(), 1);
                match &orelse[0] {
                    Stmt::If { orelse, .. } => assert_eq!(orelse.len(), 1),
                    other => panic!("Expected elif, got {other:?}"),
                }
            }
            other => panic!("Expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_for_enumerate() {
        let source = "for i, num in enumerate(nums):\n    total += num\n";
        let program = parse_source(source).unwrap();

        match &program.body[0] {
            Stmt::For {
                target, iter, body, ..
            } => {
                assert!(matches!(target, Target::Tuple(names, _) if names.len() == 2));
                assert!(matches!(iter, Expr::Call { func, .. } if func == "enumerate"));
                assert!(matches!(body[0], Stmt::AugAssign { op: BinOp::Add, .. }));
            }
            other => panic!("Expected for loop, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_semicolon_separated() {
        let program = parse_source("x = 10; y = 5").unwrap();

        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_single_line_suite() {
        let program = parse_source("if x > y: result = 1\nelse: result = 2\n")
            .unwrap();

        match &program.body[0] {
            Stmt::If { body, orelse, .. } => {
                assert_eq!(body.len(), 1);
                assert_eq!(orelse.len(), 1);
            }
            other => panic!("Expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn test_break_outside_loop_rejected() {
        let err = parse_source("break").unwrap_err();

        assert!(err.message.contains("outside loop"));
    }

    #[test]
    fn test_unsupported_statement() {
        let err = parse_source("def f():\n    return 1\n").unwrap_err();

        assert!(err.message.contains("def"));
        assert_eq!(err.location.line, 1);
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse_source("x = 1\n    y = 2\n").unwrap_err();

        assert!(err.message.contains("unexpected indent"));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_source("1 = x").unwrap_err();

        assert!(err.message.contains("cannot assign"));
    }
}
