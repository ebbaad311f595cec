// AST (Abstract Syntax Tree) definitions for the snippet language

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Binary (arithmetic and bitwise) operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitXor,
    BitAnd,
    BitOr,
    Shl,
    Shr,
}

impl BinOp {
    /// Operator as written in source
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,    // -x
    Pos,    // +x
    Not,    // not x
    Invert, // ~x
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "not ",
            UnaryOp::Invert => "~",
        }
    }
}

/// Comparison operators (chainable)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}

/// Short-circuiting boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// `name=value` argument in a call
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: Expr,
}

/// Expression nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64, SourceLocation),
    Float(f64, SourceLocation),
    Str(String, SourceLocation),
    Bool(bool, SourceLocation),
    NoneLiteral(SourceLocation),
    Name(String, SourceLocation),
    List {
        elements: Vec<Expr>,
        location: SourceLocation,
    },
    Tuple {
        elements: Vec<Expr>,
        location: SourceLocation,
    },
    Set {
        elements: Vec<Expr>,
        location: SourceLocation,
    },
    Dict {
        entries: Vec<(Expr, Expr)>,
        location: SourceLocation,
    },
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    /// `a and b and c` keeps all operands in one node
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
        location: SourceLocation,
    },
    /// `a < b <= c` keeps the chain in one node
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
        location: SourceLocation,
    },
    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
        location: SourceLocation,
    },
    /// Free function call; only named callees exist in the subset
    Call {
        func: String,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        location: SourceLocation,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        location: SourceLocation,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
        location: SourceLocation,
    },
    /// Only valid as the index of a [`Expr::Subscript`]
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        location: SourceLocation,
    },
}

impl Expr {
    /// Get the source location of this node
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Int(_, loc)
            | Expr::Float(_, loc)
            | Expr::Str(_, loc)
            | Expr::Bool(_, loc)
            | Expr::NoneLiteral(loc)
            | Expr::Name(_, loc) => *loc,
            Expr::List { location, .. }
            | Expr::Tuple { location, .. }
            | Expr::Set { location, .. }
            | Expr::Dict { location, .. }
            | Expr::BinaryOp { location, .. }
            | Expr::UnaryOp { location, .. }
            | Expr::BoolOp { location, .. }
            | Expr::Compare { location, .. }
            | Expr::IfExp { location, .. }
            | Expr::Call { location, .. }
            | Expr::MethodCall { location, .. }
            | Expr::Subscript { location, .. }
            | Expr::Slice { location, .. } => *location,
        }
    }

    /// True if `name` is referenced anywhere in this expression tree.
    pub fn references(&self, name: &str) -> bool {
        match self {
            Expr::Name(n, _) => n == name,
            Expr::Int(..)
            | Expr::Float(..)
            | Expr::Str(..)
            | Expr::Bool(..)
            | Expr::NoneLiteral(_) => false,
            Expr::List { elements, .. }
            | Expr::Tuple { elements, .. }
            | Expr::Set { elements, .. } => {
                elements.iter().any(|e| e.references(name))
            }
            Expr::Dict { entries, .. } => entries
                .iter()
                .any(|(k, v)| k.references(name) || v.references(name)),
            Expr::BinaryOp { left, right, .. } => {
                left.references(name) || right.references(name)
            }
            Expr::UnaryOp { operand, .. } => operand.references(name),
            Expr::BoolOp { values, .. } => {
                values.iter().any(|e| e.references(name))
            }
            Expr::Compare {
                left, comparisons, ..
            } => {
                left.references(name)
                    || comparisons.iter().any(|(_, e)| e.references(name))
            }
            Expr::IfExp {
                test, body, orelse, ..
            } => {
                test.references(name)
                    || body.references(name)
                    || orelse.references(name)
            }
            Expr::Call { args, keywords, .. } => {
                args.iter().any(|e| e.references(name))
                    || keywords.iter().any(|k| k.value.references(name))
            }
            Expr::MethodCall {
                receiver,
                args,
                keywords,
                ..
            } => {
                receiver.references(name)
                    || args.iter().any(|e| e.references(name))
                    || keywords.iter().any(|k| k.value.references(name))
            }
            Expr::Subscript { value, index, .. } => {
                value.references(name) || index.references(name)
            }
            Expr::Slice {
                lower, upper, step, ..
            } => [lower, upper, step]
                .into_iter()
                .flatten()
                .any(|e| e.references(name)),
        }
    }
}

/// Left-hand side of an assignment or the variable(s) of a `for` loop
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(String, SourceLocation),
    Subscript {
        value: Expr,
        index: Expr,
        location: SourceLocation,
    },
    Tuple(Vec<Target>, SourceLocation),
}

impl Target {
    pub fn location(&self) -> SourceLocation {
        match self {
            Target::Name(_, loc) | Target::Tuple(_, loc) => *loc,
            Target::Subscript { location, .. } => *location,
        }
    }
}

/// Statement nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `a = b = value`: targets are assigned left to right
    Assign {
        targets: Vec<Target>,
        value: Expr,
        location: SourceLocation,
    },
    AugAssign {
        target: Target,
        op: BinOp,
        value: Expr,
        location: SourceLocation,
    },
    Expr {
        expr: Expr,
        location: SourceLocation,
    },
    /// `elif` chains are nested `If` nodes inside `orelse`
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    For {
        target: Target,
        iter: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    Pass {
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
}

impl Stmt {
    /// Get the source location of this node
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::Assign { location, .. }
            | Stmt::AugAssign { location, .. }
            | Stmt::Expr { location, .. }
            | Stmt::If { location, .. }
            | Stmt::For { location, .. }
            | Stmt::While { location, .. }
            | Stmt::Pass { location }
            | Stmt::Break { location }
            | Stmt::Continue { location } => *location,
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
