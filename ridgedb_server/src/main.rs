use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ridgedb_core::Engine;
use ridgedb_wire::{parse_command, Command};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Idle transactions older than this are aborted by the background sweep.
const IDLE_TRANSACTION_TTL: chrono::Duration = chrono::Duration::minutes(5);
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let data_dir = std::env::var("RIDGEDB_DATA_DIR").unwrap_or_else(|_| "./ridgedb-data".to_string());
    let addr = std::env::var("RIDGEDB_ADDR").unwrap_or_else(|_| "127.0.0.1:7878".to_string());

    let engine = Engine::open(&data_dir).with_context(|| format!("opening data dir '{data_dir}'"))?;
    let engine = Arc::new(Mutex::new(engine));

    let listener = TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(addr, data_dir, "ridgedb_server listening");

    tokio::spawn(sweep_loop(engine.clone()));

    loop {
        let (socket, peer) = listener.accept().await.context("accepting connection")?;
        let engine = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, engine).await {
                tracing::warn!(%peer, error = %e, "connection ended with error");
            }
        });
    }
}

async fn sweep_loop(engine: Arc<Mutex<Engine>>) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let mut engine = engine.lock().await;
        if engine.sweep_expired_transactions(IDLE_TRANSACTION_TTL) {
            tracing::warn!("idle transaction aborted by sweep");
        }
    }
}

async fn handle_connection(socket: TcpStream, engine: Arc<Mutex<Engine>>) -> Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await.context("reading line")? {
        if line.trim().is_empty() {
            continue;
        }
        let response = {
            let mut engine = engine.lock().await;
            run_line(&mut engine, &line)
        };
        let text = match response {
            Ok(output) => output,
            Err(e) => format!("ERROR: {e}"),
        };
        writer.write_all(text.as_bytes()).await?;
        writer.write_all(b"\n").await?;
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
