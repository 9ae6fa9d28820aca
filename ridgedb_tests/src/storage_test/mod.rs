mod persistence;
mod wal_recovery;
