pub mod scalp_engine;
pub mod signals;
