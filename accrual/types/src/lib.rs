mod account;
mod config;
mod epoch;
mod error;
mod events;
mod index;
mod ledger;
mod rate_model;
mod settlement;

pub use {
    account::*, config::*, epoch::*, error::*, events::*, index::*, ledger::*, rate_model::*,
    settlement::*,
};
