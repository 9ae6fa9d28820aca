pub mod engine;
pub mod error;
pub mod eval;
pub mod store;
pub mod txn;
pub mod types;
pub mod wal;

pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use types::{IsolationLevel, Row, TxState};
