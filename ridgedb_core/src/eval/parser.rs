use super::ast::{CompareOp, Expr, LogicalOp};
use crate::error::{EngineError, EngineResult};

/// Parses a WHERE-clause token stream into an [`Expr`].
///
/// `expr := term ((AND|OR) term)*`, `term := '(' expr ')' | comparison`,
/// implemented as the standard recursive-descent precedence climb
/// (`parse_or` over `parse_and` over `parse_primary`), grounded on
/// `skepa_db_core::parser::parser::where_clause`.
pub fn parse(tokens: &[String]) -> EngineResult<Expr> {
    let mut idx = 0usize;
    let expr = parse_or(tokens, &mut idx)?;
    if idx != tokens.len() {
        return Err(EngineError::Expression(format!(
            "unexpected token '{}' in expression",
            tokens[idx]
        )));
    }
    Ok(expr)
}

fn parse_or(tokens: &[String], idx: &mut usize) -> EngineResult<Expr> {
    let mut left = parse_and(tokens, idx)?;
    while peek_keyword(tokens, *idx, "or") {
        *idx += 1;
        let right = parse_and(tokens, idx)?;
        left = Expr::Binary {
            left: Box::new(left),
            op: LogicalOp::Or,
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_and(tokens: &[String], idx: &mut usize) -> EngineResult<Expr> {
    let mut left = parse_primary(tokens, idx)?;
    while peek_keyword(tokens, *idx, "and") {
        *idx += 1;
        let right = parse_primary(tokens, idx)?;
        left = Expr::Binary {
            left: Box::new(left),
            op: LogicalOp::And,
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn parse_primary(tokens: &[String], idx: &mut usize) -> EngineResult<Expr> {
    let Some(tok) = tokens.get(*idx) else {
        return Err(EngineError::Expression("unexpected end of expression".to_string()));
    };
    if tok == "(" {
        *idx += 1;
        let inner = parse_or(tokens, idx)?;
        match tokens.get(*idx) {
            Some(t) if t == ")" => {
                *idx += 1;
                Ok(inner)
            }
            _ => Err(EngineError::Expression("expected closing ')'".to_string())),
        }
    } else {
        parse_comparison(tokens, idx)
    }
}

fn parse_comparison(tokens: &[String], idx: &mut usize) -> EngineResult<Expr> {
    let column = tokens
        .get(*idx)
        .ok_or_else(|| EngineError::Expression("expected column name".to_string()))?
        .clone();
    let op_tok = tokens
        .get(*idx + 1)
        .ok_or_else(|| EngineError::Expression("expected comparison operator".to_string()))?;
    let op = parse_op(op_tok)?;
    let literal = tokens
        .get(*idx + 2)
        .ok_or_else(|| EngineError::Expression("expected literal".to_string()))?
        .clone();
    *idx += 3;
    Ok(Expr::Compare { column, op, literal })
}

fn parse_op(tok: &str) -> EngineResult<CompareOp> {
    match tok {
        "=" => Ok(CompareOp::Eq),
        "!=" | "<>" => Ok(CompareOp::Ne),
        "<" => Ok(CompareOp::Lt),
        ">" => Ok(CompareOp::Gt),
        "<=" => Ok(CompareOp::Le),
        ">=" => Ok(CompareOp::Ge),
        t if t.eq_ignore_ascii_case("like") => Ok(CompareOp::Like),
        other => Err(EngineError::Expression(format!(
            "unknown comparison operator '{other}'"
        ))),
    }
}

fn peek_keyword(tokens: &[String], idx: usize, kw: &str) -> bool {
    tokens.get(idx).is_some_and(|t| t.eq_ignore_ascii_case(kw))
}
