//! Binary entry point: parse flags, start logging and the async runtime, load
//! the collection, and drive the Ratatui event loop until the user exits.
use anyhow::{Context, Result};
use book_dashboard::{logging, run_app, App, BooksApi, Config, Dispatcher};
use chrono::Datelike;
use clap::Parser;
use tracing::info;

fn main() -> Result<()> {
    let config = Config::parse();
    logging::init(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let api = BooksApi::new(&config.base_url)?;
    let dispatcher = Dispatcher::new(api, runtime.handle().clone());
    let mut app = App::new(dispatcher, chrono::Local::now().year());

    info!(base_url = %config.base_url, "starting book dashboard");
    app.start();
    let result = run_app(&mut app);
    info!("book dashboard exited");
    result
}
