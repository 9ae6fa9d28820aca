use rust_decimal::Decimal;

use super::ast::{CompareOp, Expr, LogicalOp};
use crate::error::{EngineError, EngineResult};

/// Evaluates `expr` against one row, given the table's column order.
pub fn eval(expr: &Expr, columns: &[String], row: &[String]) -> EngineResult<bool> {
    match expr {
        Expr::Compare { column, op, literal } => {
            let idx = columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(column))
                .ok_or_else(|| EngineError::ColumnNotFound(column.clone()))?;
            let value = row
                .get(idx)
                .ok_or_else(|| EngineError::ColumnNotFound(column.clone()))?;
            Ok(compare(*op, value, literal))
        }
        Expr::Binary { left, op, right } => {
            let l = eval(left, columns, row)?;
            let r = eval(right, columns, row)?;
            Ok(match op {
                LogicalOp::And => l && r,
                LogicalOp::Or => l || r,
            })
        }
    }
}

/// Comparison semantics:
/// - `=`/`!=` are byte-equal/unequal string compares.
/// - ordering operators compare numerically when both operands parse as
///   finite decimals, else fall back to lexicographic byte-string compare.
/// - `LIKE` uses `%`/`_` wildcards, anchored at both ends.
pub fn compare(op: CompareOp, lhs: &str, rhs: &str) -> bool {
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Like => like_match(lhs, rhs),
        CompareOp::Lt | CompareOp::Gt | CompareOp::Le | CompareOp::Ge => {
            let ordering = match (lhs.parse::<Decimal>(), rhs.parse::<Decimal>()) {
                (Ok(l), Ok(r)) => l.cmp(&r),
                _ => lhs.cmp(rhs),
            };
            match op {
                CompareOp::Lt => ordering.is_lt(),
                CompareOp::Gt => ordering.is_gt(),
                CompareOp::Le => ordering.is_le(),
                CompareOp::Ge => ordering.is_ge(),
                _ => unreachable!(),
            }
        }
    }
}

/// `%` matches any (possibly empty) run of bytes, `_` matches exactly one
/// byte, everything else is literal. The match is anchored at both ends.
/// Implemented as a small dynamic-programming table rather than translating
/// to a regex, so there is no risk of regex metacharacters in `value`
/// leaking through.
pub fn like_match(value: &str, pattern: &str) -> bool {
    let v: Vec<char> = value.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    let (vn, pn) = (v.len(), p.len());

    // dp[i][j] = value[..i] matches pattern[..j]
    let mut dp = vec![vec![false; pn + 1]; vn + 1];
    dp[0][0] = true;
    for j in 1..=pn {
        if p[j - 1] == '%' {
            dp[0][j] = dp[0][j - 1];
        }
    }
    for i in 1..=vn {
        for j in 1..=pn {
            dp[i][j] = match p[j - 1] {
                '%' => dp[i - 1][j] || dp[i][j - 1],
                '_' => dp[i - 1][j - 1],
                c => c == v[i - 1] && dp[i - 1][j - 1],
            };
        }
    }
    dp[vn][pn]
}
