use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use ridgedb_core::Engine;
use ridgedb_wire::{parse_command, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "./ridgedb-data".to_string());
    let mut engine = Engine::open(&data_dir).with_context(|| format!("opening data dir '{data_dir}'"))?;
    tracing::info!(data_dir, "ridgedb_cli ready");

    let stdin = io::stdin();
    print!("ridgedb> ");
    io::stdout().flush().ok();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if !line.trim().is_empty() {
            match run_line(&mut engine, &line) {
                Ok(output) => println!("{output}"),
                Err(e) => println!("ERROR: {e}"),
            }
        }
        print!("ridgedb> ");
        io::stdout().flush().ok();
    }
    Ok(())
}

fn run_line(engine: &mut Engine, line: &str) -> anyhow::Result<String> {
    let command = parse_command(line)?;
    Ok(match command {
        Command::CreateTable { name, columns } => {
            engine.create_table(&name, columns)?;
            format!("OK: table '{name}' created")
        }
        Command::DropTable { name } => {
            engine.drop_table(&name)?;
            format!("OK: table '{name}' dropped")
        }
        Command::Insert { name, values } => {
            let position = engine.insert(&name, values)?;
            format!("OK: inserted at row {position}")
        }
        Command::Update { name, row_index, values } => {
            engine.update(&name, row_index, values)?;
            format!("OK: row {row_index} updated")
        }
        Command::Delete { name, row_index } => {
            engine.delete(&name, row_index)?;
            format!("OK: row {row_index} deleted")
        }
        Command::CreateIndex { name, column } => {
            engine.create_index(&name, &column)?;
            format!("OK: index on {name}({column}) created")
        }
        Command::SelectAll { name } => {
            let (columns, rows) = engine.select_all(&name)?;
            format_rows(&columns, &rows)
        }
        Command::SelectWhere { name, expr } => {
            let rows = engine.select_where(&name, &expr)?;
            let (columns, _) = engine.select_all(&name)?;
            format_rows(&columns, &rows)
        }
        Command::Begin { isolation } => {
            let id = engine.begin(isolation.unwrap_or(ridgedb_core::IsolationLevel::ReadCommitted))?;
            format!("OK: transaction {id} started")
        }
        Command::Commit => {
            engine.commit()?;
            "OK: committed".to_string()
        }
        Command::Rollback => {
            engine.rollback()?;
            "OK: rolled back".to_string()
        }
        Command::Savepoint { name } => {
            engine.savepoint(&name)?;
            format!("OK: savepoint '{name}' set")
        }
        Command::RollbackToSavepoint { name } => {
            engine.rollback_to_savepoint(&name)?;
            format!("OK: rolled back to savepoint '{name}'")
        }
    })
}

fn format_rows(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut out = columns.join(" | ");
    for row in rows {
        out.push('\n');
        out.push_str(&row.join(" | "));
    }
    if rows.is_empty() {
        out.push_str("\n(no rows)");
    }
    out
}
