//! Camp Ledger Bot: reads camp log messages from a Discord channel, keeps
//! per-member running totals in a JSON file and republishes a summary.

mod accrual;
mod channels;
mod commands;
mod config;
mod extractor;
mod store;
mod summary;
mod writer;

use config::Config;
use dotenv::dotenv;
use extractor::Extractor;
use std::sync::Arc;
use store::JsonFileStore;
use summary::SummaryFormatter;
use writer::{LedgerState, LedgerWriter};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let extractor = Extractor::new(config.subject_policy);
    let formatter = SummaryFormatter::new(extractor.fields());

    let store = Arc::new(JsonFileStore::new(&config.data_file));
    log::info!("Opening ledger at {}", store.path().display());
    let state = LedgerState::open(store, formatter, config.render_styles);
    log::info!("Ledger holds {} members", state.ledger().len());

    let writer = LedgerWriter::spawn(state);

    if let Err(e) = channels::discord::start_ledger_listener(&config, extractor, writer).await {
        log::error!("Camp ledger bot stopped: {}", e);
        std::process::exit(1);
    }
}
