//! Immutable FEEL AST.
//!
//! Built by the parser, consumed by the evaluator. String literals are
//! unescaped during lowering; `@"..."` literals keep their raw text and are
//! parsed as temporal values at evaluation time.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Some,
    Every,
}

/// One `name in domain` iteration context of a `for` / `some` / `every`.
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    pub name: String,
    pub domain: IterationDomain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IterationDomain {
    /// Iterate the elements of a list-valued expression.
    List(Box<Expr>),
    /// Iterate a numeric range `start..end`, both ends inclusive.
    Range(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    NumberLit(Decimal),
    StringLit(String),
    BoolLit(bool),
    NullLit,
    /// `@"..."` — raw text, parsed lazily at evaluation time.
    TemporalLit(String),
    /// `-` inside unary tests: matches any input.
    Dash,
    /// The distinguished name `?` — the implicit input value.
    InputValue,

    /// Simple (possibly multi-word) name.
    Name(String),

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Neg(Box<Expr>),
    Not(Box<Expr>),

    /// Comparison. `left: None` means the implicit input value (unary-test
    /// form `> 5`).
    Comparison {
        op: CmpOp,
        left: Option<Box<Expr>>,
        right: Box<Expr>,
    },
    Between {
        value: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    In {
        value: Box<Expr>,
        target: Box<Expr>,
    },
    InstanceOf {
        value: Box<Expr>,
        type_name: String,
    },

    /// N-ary `and` / `or`, short-circuit, three-valued.
    Conjunction(Vec<Expr>),
    Disjunction(Vec<Expr>),

    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    For {
        iterations: Vec<Iteration>,
        body: Box<Expr>,
    },
    Quantified {
        quantifier: Quantifier,
        iterations: Vec<Iteration>,
        condition: Box<Expr>,
    },

    ListLit(Vec<Expr>),
    /// Ordered context literal; each entry is visible to later entries.
    ContextLit(Vec<(String, Expr)>),
    RangeLit {
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        low_inclusive: bool,
        high_inclusive: bool,
    },

    Filter {
        source: Box<Expr>,
        predicate: Box<Expr>,
    },
    Path {
        source: Box<Expr>,
        member: String,
    },

    FunctionDef {
        params: Vec<String>,
        body: Box<Expr>,
        external: bool,
    },
    Invocation {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    NamedInvocation {
        callee: Box<Expr>,
        args: Vec<(String, Expr)>,
    },

    /// Top of a simple-unary-tests parse: alternatives plus negation flag.
    UnaryTests {
        tests: Vec<Expr>,
        negated: bool,
    },
}

impl Expr {
    /// True when the expression is a bare (possibly multi-word) name.
    pub fn as_bare_name(&self) -> Option<&str> {
        match self {
            Expr::Name(n) => Some(n),
            _ => None,
        }
    }
}
