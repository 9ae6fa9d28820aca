//! Line grammar shared by `ridgedb_cli` and `ridgedb_server`: a small,
//! fixed statement splitter over the engine's own verbs. This is
//! deliberately not a SQL parser — each statement form maps to exactly one
//! `ridgedb_core::Engine` method.

use ridgedb_core::IsolationLevel;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("unrecognized statement: {0}")]
    Unrecognized(String),
    #[error("malformed statement: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTable { name: String, columns: Vec<String> },
    DropTable { name: String },
    Insert { name: String, values: Vec<String> },
    Update { name: String, row_index: usize, values: Vec<String> },
    Delete { name: String, row_index: usize },
    CreateIndex { name: String, column: String },
    SelectAll { name: String },
    SelectWhere { name: String, expr: String },
    Begin { isolation: Option<IsolationLevel> },
    Commit,
    Rollback,
    Savepoint { name: String },
    RollbackToSavepoint { name: String },
}

pub fn parse_command(line: &str) -> Result<Command, WireError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(WireError::Unrecognized(line.to_string()));
    }
    let upper = line.to_ascii_uppercase();

    if upper == "COMMIT" {
        return Ok(Command::Commit);
    }
    if upper == "ROLLBACK" {
        return Ok(Command::Rollback);
    }
    if let Some(rest) = strip_prefix_ci(line, "ROLLBACK TO SAVEPOINT ") {
        return Ok(Command::RollbackToSavepoint { name: rest.trim().to_string() });
    }
    if let Some(rest) = strip_prefix_ci(line, "SAVEPOINT ") {
        return Ok(Command::Savepoint { name: rest.trim().to_string() });
    }
    if upper == "BEGIN" {
        return Ok(Command::Begin { isolation: None });
    }
    if let Some(rest) = strip_prefix_ci(line, "BEGIN ISOLATION ") {
        let level = IsolationLevel::parse(rest.trim())
            .ok_or_else(|| WireError::Malformed(format!("unknown isolation level: {}", rest.trim())))?;
        return Ok(Command::Begin { isolation: Some(level) });
    }
    if let Some(rest) = strip_prefix_ci(line, "CREATE TABLE ") {
        let (name, paren) = split_name_and_parens(rest)?;
        return Ok(Command::CreateTable { name, columns: split_csv(&paren) });
    }
    if let Some(rest) = strip_prefix_ci(line, "DROP TABLE ") {
        return Ok(Command::DropTable { name: rest.trim().to_string() });
    }
    if let Some(rest) = strip_prefix_ci(line, "INSERT INTO ") {
        let (name, after_name) = split_first_word(rest)?;
        let after_name = strip_prefix_ci(after_name.trim(), "VALUES ")
            .ok_or_else(|| WireError::Malformed("expected VALUES (...)".to_string()))?;
        let paren = extract_parens(after_name)?;
        return Ok(Command::Insert { name, values: split_csv(&paren) });
    }
    if let Some(rest) = strip_prefix_ci(line, "UPDATE ") {
        let (name, after_name) = split_first_word(rest)?;
        let after_name = strip_prefix_ci(after_name.trim(), "SET ")
            .ok_or_else(|| WireError::Malformed("expected SET <row_index> = (...)".to_string()))?;
        let (index_str, after_index) = split_first_word(after_name)?;
        let row_index: usize = index_str
            .parse()
            .map_err(|_| WireError::Malformed(format!("invalid row index: {index_str}")))?;
        let after_index = strip_prefix_ci(after_index.trim(), "= ")
            .ok_or_else(|| WireError::Malformed("expected '=' before value list".to_string()))?;
        let paren = extract_parens(after_index)?;
        return Ok(Command::Update { name, row_index, values: split_csv(&paren) });
    }
    if let Some(rest) = strip_prefix_ci(line, "DELETE FROM ") {
        let (name, after_name) = split_first_word(rest)?;
        let after_name = strip_prefix_ci(after_name.trim(), "AT ")
            .ok_or_else(|| WireError::Malformed("expected AT <row_index>".to_string()))?;
        let row_index: usize = after_name
            .trim()
            .parse()
            .map_err(|_| WireError::Malformed(format!("invalid row index: {}", after_name.trim())))?;
        return Ok(Command::Delete { name, row_index });
    }
    if let Some(rest) = strip_prefix_ci(line, "CREATE INDEX ON ") {
        let (name, paren) = split_name_and_parens(rest)?;
        let column = split_csv(&paren)
            .into_iter()
            .next()
            .ok_or_else(|| WireError::Malformed("expected one column".to_string()))?;
        return Ok(Command::CreateIndex { name, column });
    }
    if let Some(rest) = strip_prefix_ci(line, "SELECT * FROM ") {
        return Ok(match split_on_where(rest) {
            Some((name, expr)) => Command::SelectWhere { name, expr },
            None => Command::SelectAll { name: rest.trim().to_string() },
        });
    }

    Err(WireError::Unrecognized(line.to_string()))
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() < prefix.len() {
        return None;
    }
    if line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

fn split_first_word(rest: &str) -> Result<(String, &str), WireError> {
    let rest = rest.trim_start();
    let idx = rest
        .find(char::is_whitespace)
        .ok_or_else(|| WireError::Malformed(format!("expected more after '{rest}'")))?;
    Ok((rest[..idx].to_string(), &rest[idx..]))
}

fn extract_parens(s: &str) -> Result<&str, WireError> {
    let open = s.find('(').ok_or_else(|| WireError::Malformed("expected '('".to_string()))?;
    let close = s.rfind(')').ok_or_else(|| WireError::Malformed("expected ')'".to_string()))?;
    if close <= open {
        return Err(WireError::Malformed("unbalanced parentheses".to_string()));
    }
    Ok(&s[open + 1..close])
}

fn split_name_and_parens(rest: &str) -> Result<(String, String), WireError> {
    let open = rest.find('(').ok_or_else(|| WireError::Malformed("expected '('".to_string()))?;
    let name = rest[..open].trim().to_string();
    if name.is_empty() {
        return Err(WireError::Malformed("missing table name".to_string()));
    }
    let inner = extract_parens(rest)?;
    Ok((name, inner.to_string()))
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(unquote)
        .collect()
}

fn unquote(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}

/// Splits `"<name> WHERE <expr>"` on the first case-insensitive ` WHERE `.
fn split_on_where(rest: &str) -> Option<(String, String)> {
    let upper = rest.to_ascii_uppercase();
    let idx = upper.find(" WHERE ")?;
    let name = rest[..idx].trim().to_string();
    let expr = rest[idx + " WHERE ".len()..].trim().to_string();
    Some((name, expr))
}
