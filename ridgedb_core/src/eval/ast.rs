/// Comparison operators accepted by the predicate grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Parsed WHERE expression.
///
/// Grouping is preserved structurally: `Binary` nests exactly where
/// parentheses put it, so evaluation respects standard precedence (AND
/// binds tighter than OR) rather than flattening into left-to-right
/// evaluation order.
#[derive(Debug, Clone)]
pub enum Expr {
    Compare {
        column: String,
        op: CompareOp,
        literal: String,
    },
    Binary {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Returns `Some((column, literal))` iff this expression is, at the top
    /// level, a single equality comparison with no surrounding `AND`/`OR` —
    /// the case the Table Store must bypass the general evaluator and serve
    /// from a hash index.
    pub fn as_top_level_eq(&self) -> Option<(&str, &str)> {
        match self {
            Expr::Compare {
                column,
                op: CompareOp::Eq,
                literal,
            } => Some((column.as_str(), literal.as_str())),
            _ => None,
        }
    }
}
