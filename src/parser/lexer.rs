//! Lexer (tokenizer) for snippet source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Block structure is expressed through indentation, so the lexer emits
//! [`Token::Newline`], [`Token::Indent`] and [`Token::Dedent`] the way the
//! parser expects them. Line breaks inside `()`, `[]` and `{}` are joined,
//! `#` comments and blank lines are dropped.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    StringLiteral(String, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),
    /// Keywords of the full language that the subset rejects (`def`, `class`, ...)
    Reserved(String, SourceLocation),

    // Keywords
    If(SourceLocation),
    Elif(SourceLocation),
    Else(SourceLocation),
    For(SourceLocation),
    While(SourceLocation),
    In(SourceLocation),
    Not(SourceLocation),
    And(SourceLocation),
    Or(SourceLocation),
    Is(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),
    None(SourceLocation),
    Pass(SourceLocation),
    Break(SourceLocation),
    Continue(SourceLocation),

    // Arithmetic
    Plus(SourceLocation),        // +
    Minus(SourceLocation),       // -
    Star(SourceLocation),        // *
    DoubleStar(SourceLocation),  // **
    Slash(SourceLocation),       // /
    DoubleSlash(SourceLocation), // //
    Percent(SourceLocation),     // %

    // Bitwise
    Amp(SourceLocation),   // &
    Pipe(SourceLocation),  // |
    Caret(SourceLocation), // ^
    Tilde(SourceLocation), // ~
    LtLt(SourceLocation),  // <<
    GtGt(SourceLocation),  // >>

    // Comparison
    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=
    Lt(SourceLocation),    // <
    Le(SourceLocation),    // <=
    Gt(SourceLocation),    // >
    Ge(SourceLocation),    // >=

    // Assignment
    Eq(SourceLocation),            // =
    PlusEq(SourceLocation),        // +=
    MinusEq(SourceLocation),       // -=
    StarEq(SourceLocation),        // *=
    SlashEq(SourceLocation),       // /=
    DoubleSlashEq(SourceLocation), // //=
    PercentEq(SourceLocation),     // %=
    DoubleStarEq(SourceLocation),  // **=
    CaretEq(SourceLocation),       // ^=

    // Punctuation
    Dot(SourceLocation),       // .
    Colon(SourceLocation),     // :
    Comma(SourceLocation),     // ,
    Semicolon(SourceLocation), // ;
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }

    // Layout
    Newline(SourceLocation),
    Indent(SourceLocation),
    Dedent(SourceLocation),

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::FloatLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Reserved(_, loc)
            | Token::If(loc)
            | Token::Elif(loc)
            | Token::Else(loc)
            | Token::For(loc)
            | Token::While(loc)
            | Token::In(loc)
            | Token::Not(loc)
            | Token::And(loc)
            | Token::Or(loc)
            | Token::Is(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::None(loc)
            | Token::Pass(loc)
            | Token::Break(loc)
            | Token::Continue(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::DoubleStar(loc)
            | Token::Slash(loc)
            | Token::DoubleSlash(loc)
            | Token::Percent(loc)
            | Token::Amp(loc)
            | Token::Pipe(loc)
            | Token::Caret(loc)
            | Token::Tilde(loc)
            | Token::LtLt(loc)
            | Token::GtGt(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::Eq(loc)
            | Token::PlusEq(loc)
            | Token::MinusEq(loc)
            | Token::StarEq(loc)
            | Token::SlashEq(loc)
            | Token::DoubleSlashEq(loc)
            | Token::PercentEq(loc)
            | Token::DoubleStarEq(loc)
            | Token::CaretEq(loc)
            | Token::Dot(loc)
            | Token::Colon(loc)
            | Token::Comma(loc)
            | Token::Semicolon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::Newline(loc)
            | Token::Indent(loc)
            | Token::Dedent(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::FloatLiteral(x, _) => write!(f, "float literal {}", x),
            Token::StringLiteral(s, _) => write!(f, "string literal {:?}", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Reserved(s, _) => write!(f, "keyword '{}'", s),
            Token::If(_) => write!(f, "'if'"),
            Token::Elif(_) => write!(f, "'elif'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::For(_) => write!(f, "'for'"),
            Token::While(_) => write!(f, "'while'"),
            Token::In(_) => write!(f, "'in'"),
            Token::Not(_) => write!(f, "'not'"),
            Token::And(_) => write!(f, "'and'"),
            Token::Or(_) => write!(f, "'or'"),
            Token::Is(_) => write!(f, "'is'"),
            Token::True(_) => write!(f, "'True'"),
            Token::False(_) => write!(f, "'False'"),
            Token::None(_) => write!(f, "'None'"),
            Token::Pass(_) => write!(f, "'pass'"),
            Token::Break(_) => write!(f, "'break'"),
            Token::Continue(_) => write!(f, "'continue'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::DoubleStar(_) => write!(f, "'**'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::DoubleSlash(_) => write!(f, "'//'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::Amp(_) => write!(f, "'&'"),
            Token::Pipe(_) => write!(f, "'|'"),
            Token::Caret(_) => write!(f, "'^'"),
            Token::Tilde(_) => write!(f, "'~'"),
            Token::LtLt(_) => write!(f, "'<<'"),
            Token::GtGt(_) => write!(f, "'>>'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::Eq(_) => write!(f, "'='"),
            Token::PlusEq(_) => write!(f, "'+='"),
            Token::MinusEq(_) => write!(f, "'-='"),
            Token::StarEq(_) => write!(f, "'*='"),
            Token::SlashEq(_) => write!(f, "'/='"),
            Token::DoubleSlashEq(_) => write!(f, "'//='"),
            Token::PercentEq(_) => write!(f, "'%='"),
            Token::DoubleStarEq(_) => write!(f, "'**='"),
            Token::CaretEq(_) => write!(f, "'^='"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::Newline(_) => write!(f, "end of line"),
            Token::Indent(_) => write!(f, "indent"),
            Token::Dedent(_) => write!(f, "dedent"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (line {}, column {})", .location.line, .location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Width a tab advances the indentation column to (next multiple of 8)
const TAB_WIDTH: usize = 8;

/// Lexer for snippet source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Open `(`, `[`, `{` count; layout tokens are suppressed while > 0
    nesting: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            nesting: 0,
            indent_stack: vec![0],
            at_line_start: true,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            if self.at_line_start && self.nesting == 0 {
                self.at_line_start = false;
                if self.handle_indentation(&mut tokens)? {
                    continue;
                }
            }

            self.skip_inline_whitespace_and_comments()?;

            if self.is_at_end() {
                break;
            }

            if self.peek() == Some('\n') {
                let loc = self.current_location();
                self.advance();
                if self.nesting == 0 {
                    Self::push_newline(&mut tokens, loc);
                    self.at_line_start = true;
                }
                continue;
            }

            let token = self.next_token()?;
            match token {
                Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) => {
                    self.nesting += 1;
                }
                Token::RParen(_) | Token::RBracket(_) | Token::RBrace(_) => {
                    self.nesting = self.nesting.saturating_sub(1);
                }
                _ => {}
            }
            tokens.push(token);
        }

        let loc = self.current_location();
        Self::push_newline(&mut tokens, loc);
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::Dedent(loc));
        }
        tokens.push(Token::Eof(loc));

        Ok(tokens)
    }

    /// Measure the indentation of a fresh line and emit Indent/Dedent tokens.
    ///
    /// Returns `true` when the line was blank (or comment-only) and has been
    /// consumed entirely.
    fn handle_indentation(
        &mut self,
        tokens: &mut Vec<Token>,
    ) -> Result<bool, LexError> {
        let mut width = 0;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                '\x0c' => width = 0,
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            None => return Ok(false),
            Some('\n') | Some('\r') | Some('#') => {
                // Blank or comment-only line: no layout change
                self.skip_line();
                self.at_line_start = true;
                return Ok(true);
            }
            _ => {}
        }

        let loc = self.current_location();
        let current = self.indent_stack.last().copied().unwrap_or(0);

        if width > current {
            self.indent_stack.push(width);
            tokens.push(Token::Indent(loc));
        } else if width < current {
            while self.indent_stack.last().is_some_and(|&top| top > width) {
                self.indent_stack.pop();
                tokens.push(Token::Dedent(loc));
            }
            if self.indent_stack.last().copied() != Some(width) {
                return Err(LexError {
                    message: "unindent does not match any outer indentation level"
                        .to_string(),
                    location: loc,
                });
            }
        }

        Ok(false)
    }

    /// Emit a Newline unless the logical line is empty
    fn push_newline(tokens: &mut Vec<Token>, loc: SourceLocation) {
        match tokens.last() {
            None
            | Some(Token::Newline(_))
            | Some(Token::Indent(_))
            | Some(Token::Dedent(_)) => {}
            Some(_) => tokens.push(Token::Newline(loc)),
        }
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            // String literals
            '"' | '\'' => self.string_literal(ch, loc),

            // Numeric literals
            '0'..='9' => self.number_literal(ch, loc),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch, loc)
            }

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => {
                Ok(self.identifier_or_keyword(c, loc))
            }

            // Operators and punctuation
            '+' => Ok(self.with_eq(loc, Token::PlusEq, Token::Plus)),
            '-' => Ok(self.with_eq(loc, Token::MinusEq, Token::Minus)),
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    Ok(self.with_eq(loc, Token::DoubleStarEq, Token::DoubleStar))
                } else {
                    Ok(self.with_eq(loc, Token::StarEq, Token::Star))
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    Ok(self.with_eq(
                        loc,
                        Token::DoubleSlashEq,
                        Token::DoubleSlash,
                    ))
                } else {
                    Ok(self.with_eq(loc, Token::SlashEq, Token::Slash))
                }
            }
            '%' => Ok(self.with_eq(loc, Token::PercentEq, Token::Percent)),
            '^' => Ok(self.with_eq(loc, Token::CaretEq, Token::Caret)),
            '=' => Ok(self.with_eq(loc, Token::EqEq, Token::Eq)),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::NotEq(loc))
                } else {
                    Err(LexError {
                        message: "invalid syntax: '!'".to_string(),
                        location: loc,
                    })
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    Ok(Token::LtLt(loc))
                } else {
                    Ok(self.with_eq(loc, Token::Le, Token::Lt))
                }
            }
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Ok(Token::GtGt(loc))
                } else {
                    Ok(self.with_eq(loc, Token::Ge, Token::Gt))
                }
            }
            '&' => Ok(Token::Amp(loc)),
            '|' => Ok(Token::Pipe(loc)),
            '~' => Ok(Token::Tilde(loc)),
            '.' => Ok(Token::Dot(loc)),
            ':' => Ok(Token::Colon(loc)),
            ',' => Ok(Token::Comma(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '[' => Ok(Token::LBracket(loc)),
            ']' => Ok(Token::RBracket(loc)),
            '{' => Ok(Token::LBrace(loc)),
            '}' => Ok(Token::RBrace(loc)),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Pick the `op=` form when the next character is `=`
    fn with_eq(
        &mut self,
        loc: SourceLocation,
        with: fn(SourceLocation) -> Token,
        without: fn(SourceLocation) -> Token,
    ) -> Token {
        if self.peek() == Some('=') {
            self.advance();
            with(loc)
        } else {
            without(loc)
        }
    }

    /// Parse string literal (single, double, or triple quoted)
    fn string_literal(
        &mut self,
        quote: char,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let triple =
            self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == quote {
                if !triple {
                    self.advance();
                    return Ok(Token::StringLiteral(string, loc));
                }
                if self.peek_ahead(1) == Some(quote)
                    && self.peek_ahead(2) == Some(quote)
                {
                    self.advance();
                    self.advance();
                    self.advance();
                    return Ok(Token::StringLiteral(string, loc));
                }
                string.push(ch);
                self.advance();
                continue;
            }

            if ch == '\n' && !triple {
                break;
            }

            if ch == '\\' {
                self.advance();
                let escaped = self.advance().ok_or_else(|| LexError {
                    message: "Unexpected end of file in string literal"
                        .to_string(),
                    location: self.current_location(),
                })?;

                match escaped {
                    'n' => string.push('\n'),
                    't' => string.push('\t'),
                    'r' => string.push('\r'),
                    '0' => string.push('\0'),
                    '\\' => string.push('\\'),
                    '\'' => string.push('\''),
                    '"' => string.push('"'),
                    '\n' => {} // line continuation inside the literal
                    other => {
                        // Unknown escapes are kept verbatim
                        string.push('\\');
                        string.push(other);
                    }
                }
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(LexError {
            message: "unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Parse numeric literal (integer or float, `_` separators allowed)
    fn number_literal(
        &mut self,
        first: char,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut num_str = String::new();
        num_str.push(first);
        let mut is_float = first == '.';

        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => num_str.push(ch),
                '_' => {}
                '.' if !is_float => {
                    is_float = true;
                    num_str.push(ch);
                }
                'e' | 'E' => {
                    let sign = self.peek_ahead(1);
                    let digit_at = if matches!(sign, Some('+') | Some('-')) {
                        2
                    } else {
                        1
                    };
                    if !self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit())
                    {
                        break;
                    }
                    is_float = true;
                    num_str.push('e');
                    self.advance();
                    if digit_at == 2 {
                        if let Some(s) = self.advance() {
                            num_str.push(s);
                        }
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        if is_float {
            let value = num_str.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid float literal: {}", num_str),
                location: loc,
            })?;
            Ok(Token::FloatLiteral(value, loc))
        } else {
            let value = num_str.parse::<i64>().map_err(|_| LexError {
                message: format!("Integer literal too large: {}", num_str),
                location: loc,
            })?;
            Ok(Token::IntLiteral(value, loc))
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(
        &mut self,
        first_char: char,
        loc: SourceLocation,
    ) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "if" => Token::If(loc),
            "elif" => Token::Elif(loc),
            "else" => Token::Else(loc),
            "for" => Token::For(loc),
            "while" => Token::While(loc),
            "in" => Token::In(loc),
            "not" => Token::Not(loc),
            "and" => Token::And(loc),
            "or" => Token::Or(loc),
            "is" => Token::Is(loc),
            "True" => Token::True(loc),
            "False" => Token::False(loc),
            "None" => Token::None(loc),
            "pass" => Token::Pass(loc),
            "break" => Token::Break(loc),
            "continue" => Token::Continue(loc),
            "def" | "class" | "return" | "import" | "from" | "lambda"
            | "with" | "try" | "except" | "finally" | "raise" | "global"
            | "nonlocal" | "del" | "yield" | "assert" | "async" | "await" => {
                Token::Reserved(ident, loc)
            }
            _ => Token::Ident(ident, loc),
        }
    }

    /// Skip spaces, tabs, comments and backslash line continuations
    fn skip_inline_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\x0c') => {
                    self.advance();
                }
                Some('\n') if self.nesting > 0 => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('\\') => {
                    let loc = self.current_location();
                    self.advance();
                    if self.peek() == Some('\r') {
                        self.advance();
                    }
                    if self.advance() != Some('\n') {
                        return Err(LexError {
                            message: "unexpected character after line continuation"
                                .to_string(),
                            location: loc,
                        });
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip to the start of the next line
    fn skip_line(&mut self) {
        while let Some(ch) = self.advance() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    #[test]
    fn test_simple_assignment() {
        let tokens = lex("x = 10");

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[1], Token::Eq(_)));
        assert!(matches!(tokens[2], Token::IntLiteral(10, _)));
        assert!(matches!(tokens[3], Token::Newline(_)));
        assert!(matches!(tokens[4], Token::Eof(_)));
    }

    #[test]
    fn test_operators() {
        let tokens = lex("** // //= += == != <= >= << >> ^");

        assert!(matches!(tokens[0], Token::DoubleStar(_)));
        assert!(matches!(tokens[1], Token::DoubleSlash(_)));
        assert!(matches!(tokens[2], Token::DoubleSlashEq(_)));
        assert!(matches!(tokens[3], Token::PlusEq(_)));
        assert!(matches!(tokens[4], Token::EqEq(_)));
        assert!(matches!(tokens[5], Token::NotEq(_)));
        assert!(matches!(tokens[6], Token::Le(_)));
        assert!(matches!(tokens[7], Token::Ge(_)));
        assert!(matches!(tokens[8], Token::LtLt(_)));
        assert!(matches!(tokens[9], Token::GtGt(_)));
        assert!(matches!(tokens[10], Token::Caret(_)));
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = lex("if x:\n    y = 1\nz = 2\n");

        assert!(matches!(tokens[0], Token::If(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[2], Token::Colon(_)));
        assert!(matches!(tokens[3], Token::Newline(_)));
        assert!(matches!(tokens[4], Token::Indent(_)));
        assert!(matches!(tokens[5], Token::Ident(ref s, _) if s == "y"));
        assert!(matches!(tokens[8], Token::Newline(_)));
        assert!(matches!(tokens[9], Token::Dedent(_)));
        assert!(matches!(tokens[10], Token::Ident(ref s, _) if s == "z"));
    }

    #[test]
    fn test_dedents_closed_at_eof() {
        let tokens = lex("for i in x:\n    if i:\n        y = i");
        let dedents = tokens
            .iter()
            .filter(|t| matches!(t, Token::Dedent(_)))
            .count();

        assert_eq!(dedents, 2);
        assert!(matches!(tokens.last(), Some(Token::Eof(_))));
    }

    #[test]
    fn test_brackets_join_lines() {
        let tokens = lex("nums = [\n    1,\n    2,\n]\n");
        let newlines = tokens
            .iter()
            .filter(|t| matches!(t, Token::Newline(_)))
            .count();

        assert_eq!(newlines, 1);
        assert!(!tokens.iter().any(|t| matches!(t, Token::Indent(_))));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let tokens = lex("# header\n\nx = 1  # trailing\n\n   \ny = 2\n");

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[3], Token::Newline(_)));
        assert!(matches!(tokens[4], Token::Ident(ref s, _) if s == "y"));
    }

    #[test]
    fn test_string_literals() {
        let tokens = lex(r#"a = "hello\nworld" + 'it''s'"#);

        match &tokens[2] {
            Token::StringLiteral(s, _) => assert_eq!(s, "hello\nworld"),
            other => panic!("Expected string literal, got {other}"),
        }
        assert!(matches!(tokens[4], Token::StringLiteral(ref s, _) if s == "it"));
        assert!(matches!(tokens[5], Token::StringLiteral(ref s, _) if s == "s"));
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("1_000 2.5 .5 1e3 7");

        assert!(matches!(tokens[0], Token::IntLiteral(1000, _)));
        assert!(matches!(tokens[1], Token::FloatLiteral(x, _) if x == 2.5));
        assert!(matches!(tokens[2], Token::FloatLiteral(x, _) if x == 0.5));
        assert!(matches!(tokens[3], Token::FloatLiteral(x, _) if x == 1000.0));
        assert!(matches!(tokens[4], Token::IntLiteral(7, _)));
    }

    #[test]
    fn test_bad_dedent() {
        let err = Lexer::new("if x:\n        y = 1\n    z = 2\n")
            .tokenize()
            .unwrap_err();

        assert!(err.message.contains("unindent"));
        assert_eq!(err.location.line, 3);
    }

    #[test]
    fn test_reserved_keywords() {
        let tokens = lex("def f");

        assert!(matches!(tokens[0], Token::Reserved(ref s, _) if s == "def"));
    }
}
