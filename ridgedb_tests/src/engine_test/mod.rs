mod misc;
mod transactions;

pub(crate) fn open(dir: &std::path::Path) -> ridgedb_core::Engine {
    ridgedb_core::Engine::open_with_config(dir, ridgedb_core::EngineConfig { fsync: false }).unwrap()
}
