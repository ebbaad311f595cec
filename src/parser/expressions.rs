//! Expression parsing implementation
//!
//! This module handles parsing of expressions using one recursive-descent
//! method per precedence level, loosest first:
//!
//! | Level | Forms |
//! |---|---|
//! | testlist | `a, b` (bare tuple) |
//! | test | `x if c else y` |
//! | or / and / not | `or`, `and`, `not` (short-circuit) |
//! | comparison | `< <= > >= == != in not in is is not` (chained) |
//! | bitwise | `\|`, `^`, `&`, `<< >>` |
//! | arithmetic | `+ -`, `* / // %` |
//! | factor | unary `- + ~` |
//! | power | `**` (right-associative) |
//! | postfix | calls, subscripts/slices, `.method(...)` |
//! | atom | literals, names, `()`, `[]`, `{}` displays |
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse a comma-separated expression list; more than one element (or a
    /// trailing comma) makes a tuple.
    pub(crate) fn parse_testlist(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let first = self.parse_test()?;

        if !self.check(&Token::Comma(self.current_location())) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&Token::Comma(self.current_location())) {
            if !self.starts_expression() {
                break;
            }
            elements.push(self.parse_test()?);
        }

        Ok(Expr::Tuple { elements, location })
    }

    /// Parse the variable list of a `for` statement (stops before `in`)
    pub(crate) fn parse_target_list(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let first = self.parse_bitwise_or()?;

        if !self.check(&Token::Comma(self.current_location())) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&Token::Comma(self.current_location())) {
            if !self.starts_expression() {
                break;
            }
            elements.push(self.parse_bitwise_or()?);
        }

        Ok(Expr::Tuple { elements, location })
    }

    /// True if the current token can begin an expression
    fn starts_expression(&self) -> bool {
        matches!(
            self.peek(),
            Token::IntLiteral(..)
                | Token::FloatLiteral(..)
                | Token::StringLiteral(..)
                | Token::Ident(..)
                | Token::True(_)
                | Token::False(_)
                | Token::None(_)
                | Token::LParen(_)
                | Token::LBracket(_)
                | Token::LBrace(_)
                | Token::Minus(_)
                | Token::Plus(_)
                | Token::Tilde(_)
                | Token::Not(_)
        )
    }

    /// Parse conditional expression: body if test else orelse
    pub(crate) fn parse_test(&mut self) -> Result<Expr, ParseError> {
        let body = self.parse_or_test()?;

        if self.match_token(&Token::If(self.current_location())) {
            let location = self.previous_location();
            let test = self.parse_or_test()?;
            self.expect_token(
                &Token::Else(self.current_location()),
                "Expected 'else' in conditional expression",
            )?;
            let orelse = self.parse_test()?;
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
                location,
            });
        }

        Ok(body)
    }

    /// Parse logical OR (or)
    fn parse_or_test(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let first = self.parse_and_test()?;

        let mut values = vec![first];
        while self.match_token(&Token::Or(self.current_location())) {
            values.push(self.parse_and_test()?);
        }

        Ok(Self::fold_bool_op(BoolOp::Or, values, location))
    }

    /// Parse logical AND (and)
    fn parse_and_test(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let first = self.parse_not_test()?;

        let mut values = vec![first];
        while self.match_token(&Token::And(self.current_location())) {
            values.push(self.parse_not_test()?);
        }

        Ok(Self::fold_bool_op(BoolOp::And, values, location))
    }

    fn fold_bool_op(
        op: BoolOp,
        mut values: Vec<Expr>,
        location: SourceLocation,
    ) -> Expr {
        if values.len() == 1 {
            values.remove(0)
        } else {
            Expr::BoolOp {
                op,
                values,
                location,
            }
        }
    }

    /// Parse logical NOT (not)
    fn parse_not_test(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&Token::Not(self.current_location())) {
            let location = self.previous_location();
            let operand = Box::new(self.parse_not_test()?);
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand,
                location,
            });
        }

        self.parse_comparison()
    }

    /// Parse a (possibly chained) comparison
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let left = self.parse_bitwise_or()?;

        let mut comparisons = Vec::new();
        loop {
            let op = match self.peek_token() {
                Token::Lt(_) => CmpOp::Lt,
                Token::Le(_) => CmpOp::Le,
                Token::Gt(_) => CmpOp::Gt,
                Token::Ge(_) => CmpOp::Ge,
                Token::EqEq(_) => CmpOp::Eq,
                Token::NotEq(_) => CmpOp::NotEq,
                Token::In(_) => CmpOp::In,
                Token::Not(_)
                    if matches!(self.peek_ahead(1), Some(Token::In(_))) =>
                {
                    self.advance();
                    CmpOp::NotIn
                }
                Token::Is(_) => {
                    if matches!(self.peek_ahead(1), Some(Token::Not(_))) {
                        self.advance();
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    }
                }
                _ => break,
            };
            self.advance();

            let right = self.parse_bitwise_or()?;
            comparisons.push((op, right));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                comparisons,
                location,
            })
        }
    }

    /// Shared loop for the left-associative binary levels
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
        operator: fn(&Token) -> Option<BinOp>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;

        while let Some(op) = operator(self.peek()) {
            let location = self.current_location();
            self.advance();
            let right = Box::new(next(self)?);
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse bitwise OR (|)
    pub(crate) fn parse_bitwise_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_bitwise_xor, |t| match t {
            Token::Pipe(_) => Some(BinOp::BitOr),
            _ => None,
        })
    }

    /// Parse bitwise XOR (^)
    fn parse_bitwise_xor(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_bitwise_and, |t| match t {
            Token::Caret(_) => Some(BinOp::BitXor),
            _ => None,
        })
    }

    /// Parse bitwise AND (&)
    fn parse_bitwise_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_shift, |t| match t {
            Token::Amp(_) => Some(BinOp::BitAnd),
            _ => None,
        })
    }

    /// Parse bitwise shift (<< >>)
    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_additive, |t| match t {
            Token::LtLt(_) => Some(BinOp::Shl),
            Token::GtGt(_) => Some(BinOp::Shr),
            _ => None,
        })
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_multiplicative, |t| match t {
            Token::Plus(_) => Some(BinOp::Add),
            Token::Minus(_) => Some(BinOp::Sub),
            _ => None,
        })
    }

    /// Parse multiplicative (* / // %)
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_factor, |t| match t {
            Token::Star(_) => Some(BinOp::Mul),
            Token::Slash(_) => Some(BinOp::Div),
            Token::DoubleSlash(_) => Some(BinOp::FloorDiv),
            Token::Percent(_) => Some(BinOp::Mod),
            _ => None,
        })
    }

    /// Parse unary prefix operators (- + ~)
    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let op = match self.peek_token() {
            Token::Minus(_) => UnaryOp::Neg,
            Token::Plus(_) => UnaryOp::Pos,
            Token::Tilde(_) => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();

        let operand = Box::new(self.parse_factor()?);
        Ok(Expr::UnaryOp {
            op,
            operand,
            location,
        })
    }

    /// Parse power (right-associative, binds tighter than a unary on its left)
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;

        if self.match_token(&Token::DoubleStar(self.current_location())) {
            let location = self.previous_location();
            let exponent = Box::new(self.parse_factor()?);
            return Ok(Expr::BinaryOp {
                op: BinOp::Pow,
                left: Box::new(base),
                right: exponent,
                location,
            });
        }

        Ok(base)
    }

    /// Parse postfix trailers: calls, subscripts and method calls
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;

        loop {
            let location = self.current_location();
            if self.match_token(&Token::LParen(location)) {
                let func = match expr {
                    Expr::Name(name, _) => name,
                    other => {
                        return Err(ParseError {
                            message: "only named functions can be called"
                                .to_string(),
                            location: other.location(),
                        });
                    }
                };
                let (args, keywords) = self.parse_call_arguments()?;
                expr = Expr::Call {
                    func,
                    args,
                    keywords,
                    location,
                };
            } else if self.match_token(&Token::LBracket(location)) {
                let index = self.parse_subscript_index()?;
                self.expect_rbracket("after subscript")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                    location,
                };
            } else if self.match_token(&Token::Dot(location)) {
                let method = self.expect_identifier()?;
                if !self.match_token(&Token::LParen(self.current_location())) {
                    return Err(ParseError {
                        message: format!(
                            "attribute access '.{method}' is not supported"
                        ),
                        location,
                    });
                }
                let (args, keywords) = self.parse_call_arguments()?;
                expr = Expr::MethodCall {
                    receiver: Box::new(expr),
                    method,
                    args,
                    keywords,
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse call arguments after `(` up to and including `)`
    fn parse_call_arguments(
        &mut self,
    ) -> Result<(Vec<Expr>, Vec<Keyword>), ParseError> {
        let mut args = Vec::new();
        let mut keywords: Vec<Keyword> = Vec::new();

        while !self.check(&Token::RParen(self.current_location())) {
            if self.check(&Token::Star(self.current_location()))
                || self.check(&Token::DoubleStar(self.current_location()))
            {
                return Err(self.error_here("argument unpacking is not supported"));
            }

            let is_keyword = matches!(self.peek(), Token::Ident(..))
                && matches!(self.peek_ahead(1), Some(Token::Eq(_)));

            if is_keyword {
                let name = self.expect_identifier()?;
                self.advance(); // consume '='
                let value = self.parse_test()?;
                keywords.push(Keyword { name, value });
            } else {
                if !keywords.is_empty() {
                    return Err(
                        self.error_here("positional argument follows keyword argument")
                    );
                }
                let arg = self.parse_test()?;
                if self.check(&Token::For(self.current_location())) {
                    return Err(self.error_here("comprehensions are not supported"));
                }
                args.push(arg);
            }

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_rparen("after call arguments")?;
        Ok((args, keywords))
    }

    /// Parse the inside of `[...]`: a single index, a tuple, or a slice
    fn parse_subscript_index(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        let lower = if self.check(&Token::Colon(location)) {
            None
        } else {
            Some(self.parse_test()?)
        };

        if self.match_token(&Token::Colon(self.current_location())) {
            let upper = if self.check(&Token::Colon(self.current_location()))
                || self.check(&Token::RBracket(self.current_location()))
            {
                None
            } else {
                Some(Box::new(self.parse_test()?))
            };
            let step = if self.match_token(&Token::Colon(self.current_location()))
                && !self.check(&Token::RBracket(self.current_location()))
            {
                Some(Box::new(self.parse_test()?))
            } else {
                None
            };
            return Ok(Expr::Slice {
                lower: lower.map(Box::new),
                upper,
                step,
                location,
            });
        }

        // `lower` is always present on this path
        let first = match lower {
            Some(expr) => expr,
            None => return Err(self.error_here("invalid subscript")),
        };

        if !self.check(&Token::Comma(self.current_location())) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&Token::Comma(self.current_location())) {
            if !self.starts_expression() {
                break;
            }
            elements.push(self.parse_test()?);
        }
        Ok(Expr::Tuple { elements, location })
    }

    /// Parse primary expressions: literals, names, and bracketed displays
    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        match self.peek_token() {
            Token::IntLiteral(n, _) => {
                self.advance();
                Ok(Expr::Int(n, location))
            }
            Token::FloatLiteral(x, _) => {
                self.advance();
                Ok(Expr::Float(x, location))
            }
            Token::StringLiteral(s, _) => {
                self.advance();
                // Adjacent literals concatenate
                let mut text = s;
                while let Token::StringLiteral(next, _) = self.peek_token() {
                    self.advance();
                    text.push_str(&next);
                }
                Ok(Expr::Str(text, location))
            }
            Token::True(_) => {
                self.advance();
                Ok(Expr::Bool(true, location))
            }
            Token::False(_) => {
                self.advance();
                Ok(Expr::Bool(false, location))
            }
            Token::None(_) => {
                self.advance();
                Ok(Expr::NoneLiteral(location))
            }
            Token::Ident(name, _) => {
                self.advance();
                Ok(Expr::Name(name, location))
            }
            Token::LParen(_) => {
                self.advance();
                self.parse_parenthesized(location)
            }
            Token::LBracket(_) => {
                self.advance();
                let elements = self.parse_display_elements(
                    &Token::RBracket(location),
                    "after list elements",
                )?;
                Ok(Expr::List { elements, location })
            }
            Token::LBrace(_) => {
                self.advance();
                self.parse_brace_display(location)
            }
            Token::Reserved(keyword, _) => Err(self.error_here(&format!(
                "'{keyword}' is not supported"
            ))),
            other => Err(ParseError {
                message: format!("invalid syntax: unexpected {}", other),
                location,
            }),
        }
    }

    /// Parse `( ... )` after the opening parenthesis: grouping or tuple
    fn parse_parenthesized(
        &mut self,
        location: SourceLocation,
    ) -> Result<Expr, ParseError> {
        if self.match_token(&Token::RParen(self.current_location())) {
            return Ok(Expr::Tuple {
                elements: Vec::new(),
                location,
            });
        }

        let first = self.parse_test()?;
        if self.check(&Token::For(self.current_location())) {
            return Err(self.error_here("generator expressions are not supported"));
        }

        if !self.check(&Token::Comma(self.current_location())) {
            self.expect_rparen("after expression")?;
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&Token::Comma(self.current_location())) {
            if self.check(&Token::RParen(self.current_location())) {
                break;
            }
            elements.push(self.parse_test()?);
        }
        self.expect_rparen("after tuple elements")?;

        Ok(Expr::Tuple { elements, location })
    }

    /// Parse comma-separated elements up to the closing token
    fn parse_display_elements(
        &mut self,
        close: &Token,
        ctx: &str,
    ) -> Result<Vec<Expr>, ParseError> {
        let mut elements = Vec::new();

        while !self.check(close) {
            elements.push(self.parse_test()?);
            if self.check(&Token::For(self.current_location())) {
                return Err(self.error_here("comprehensions are not supported"));
            }
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_token(close, &format!("Expected {close} {ctx}"))?;
        Ok(elements)
    }

    /// Parse `{ ... }` after the opening brace: dict (including `{}`) or set
    fn parse_brace_display(
        &mut self,
        location: SourceLocation,
    ) -> Result<Expr, ParseError> {
        if self.match_token(&Token::RBrace(self.current_location())) {
            return Ok(Expr::Dict {
                entries: Vec::new(),
                location,
            });
        }

        let first = self.parse_test()?;

        if !self.match_token(&Token::Colon(self.current_location())) {
            let mut elements = vec![first];
            if self.match_token(&Token::Comma(self.current_location())) {
                elements.extend(self.parse_display_elements(
                    &Token::RBrace(location),
                    "after set elements",
                )?);
            } else {
                self.expect_token(
                    &Token::RBrace(self.current_location()),
                    "Expected '}' after set elements",
                )?;
            }
            return Ok(Expr::Set { elements, location });
        }

        let mut entries = vec![(first, self.parse_test()?)];
        while self.match_token(&Token::Comma(self.current_location())) {
            if self.check(&Token::RBrace(self.current_location())) {
                break;
            }
            let key = self.parse_test()?;
            self.expect_colon("after dict key")?;
            let value = self.parse_test()?;
            entries.push((key, value));
        }
        self.expect_token(
            &Token::RBrace(self.current_location()),
            "Expected '}' after dict entries",
        )?;

        Ok(Expr::Dict { entries, location })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> Expr {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_testlist().unwrap()
    }

    #[test]
    fn test_chained_comparison_is_one_node() {
        match expr("a < b < c") {
            Expr::Compare { comparisons, .. } => {
                assert_eq!(comparisons.len(), 2);
                assert_eq!(comparisons[0].0, CmpOp::Lt);
            }
            other => panic!("Expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_not_in_and_is_not() {
        match expr("x not in y") {
            Expr::Compare { comparisons, .. } => {
                assert_eq!(comparisons[0].0, CmpOp::NotIn)
            }
            other => panic!("Expected comparison, got {other:?}"),
        }
        match expr("x is not None") {
            Expr::Compare { comparisons, .. } => {
                assert_eq!(comparisons[0].0, CmpOp::IsNot)
            }
            other => panic!("Expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_bool_op_flattens_operands() {
        match expr("a and b and c or d") {
            Expr::BoolOp {
                op: BoolOp::Or,
                values,
                ..
            } => {
                assert_eq!(values.len(), 2);
                assert!(matches!(
                    &values[0],
                    Expr::BoolOp { op: BoolOp::And, values, .. } if values.len() == 3
                ));
            }
            other => panic!("Expected or, got {other:?}"),
        }
    }

    #[test]
    fn test_power_binds_tighter_than_unary() {
        match expr("-2 ** 2") {
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                operand,
                ..
            } => assert!(matches!(*operand, Expr::BinaryOp { op: BinOp::Pow, .. })),
            other => panic!("Expected negation, got {other:?}"),
        }
    }

    #[test]
    fn test_slices() {
        match expr("arr[1:]") {
            Expr::Subscript { index, .. } => match *index {
                Expr::Slice { lower, upper, step, .. } => {
                    assert!(lower.is_some());
                    assert!(upper.is_none());
                    assert!(step.is_none());
                }
                other => panic!("Expected slice, got {other:?}"),
            },
            other => panic!("Expected subscript, got {other:?}"),
        }
        match expr("arr[::-1]") {
            Expr::Subscript { index, .. } => {
                assert!(matches!(*index, Expr::Slice { lower: None, upper: None, step: Some(_), .. }))
            }
            other => panic!("Expected subscript, got {other:?}"),
        }
    }

    #[test]
    fn test_method_call_and_keywords() {
        match expr("nums.sort(reverse=True)") {
            Expr::MethodCall {
                method, keywords, ..
            } => {
                assert_eq!(method, "sort");
                assert_eq!(keywords[0].name, "reverse");
            }
            other => panic!("Expected method call, got {other:?}"),
        }
    }

    #[test]
    fn test_brace_displays() {
        assert!(matches!(expr("{}"), Expr::Dict { entries, .. } if entries.is_empty()));
        assert!(matches!(expr("{1, 2}"), Expr::Set { elements, .. } if elements.len() == 2));
        assert!(matches!(expr("{'a': 1, 'b': 2,}"), Expr::Dict { entries, .. } if entries.len() == 2));
    }

    #[test]
    fn test_tuples() {
        assert!(matches!(expr("()"), Expr::Tuple { elements, .. } if elements.is_empty()));
        assert!(matches!(expr("(1,)"), Expr::Tuple { elements, .. } if elements.len() == 1));
        assert!(matches!(expr("1, 2"), Expr::Tuple { elements, .. } if elements.len() == 2));
        assert!(matches!(expr("(1)"), Expr::Int(1, _)));
    }

    #[test]
    fn test_conditional_expression() {
        assert!(matches!(expr("a if c else b"), Expr::IfExp { .. }));
    }
}
