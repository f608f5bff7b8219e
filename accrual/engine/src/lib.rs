mod config;
mod engine;
mod error;
mod index;
mod settlement;
mod store;

pub use {config::*, engine::*, error::*, index::*, settlement::*, store::*};
