/// Source span as a byte range.
pub type Span = std::ops::Range<usize>;

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The `nil` literal.
    Nil,
    /// A boolean literal.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A floating-point literal.
    Float(f64),
    /// A string literal.
    Str(String),
    /// A list literal, e.g. `[1, 2, 3]`.
    List(Vec<Expr>),
    /// A bare identifier: a root attribute or an entity name.
    Name(String),
    /// Field access, e.g. `lamp.lit`.
    Field {
        /// The expression whose field is read.
        target: Box<Expr>,
        /// The field name.
        field: String,
    },
    /// Index access, e.g. `inventory[0]`.
    Index {
        /// The indexed expression.
        target: Box<Expr>,
        /// The index expression.
        index: Box<Expr>,
    },
    /// A call to an allowlisted global function, e.g. `len(x)`.
    Call {
        /// Function name.
        function: String,
        /// Call arguments.
        args: Vec<Expr>,
    },
    /// A call to an allowlisted method, e.g. `lamp.has("oil")`.
    Method {
        /// The receiver expression.
        target: Box<Expr>,
        /// Method name.
        method: String,
        /// Call arguments.
        args: Vec<Expr>,
    },
    /// A prefix operator.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// An infix operator.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `then_branch if condition else else_branch`.
    Conditional {
        /// Evaluated when the condition is truthy.
        then_branch: Box<Expr>,
        /// The condition.
        condition: Box<Expr>,
        /// Evaluated when the condition is falsy.
        else_branch: Box<Expr>,
    },
    /// An assignment to a root attribute or entity property.
    Assign {
        /// Where the value is written.
        place: Place,
        /// The value written.
        value: Box<Expr>,
    },
}

/// The target of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    /// A root attribute, e.g. `score = 10`.
    Attribute(String),
    /// An entity property, e.g. `lamp.lit = true`.
    Property {
        /// Name resolving to the entity.
        entity: String,
        /// Property key.
        key: String,
    },
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation `-`.
    Neg,
    /// Logical negation `not`.
    Not,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `and` (short-circuit)
    And,
    /// `or` (short-circuit)
    Or,
}

impl BinaryOp {
    /// The operator as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}
