//! csindex CLI: index list retrieval for csindex.com.cn.
//!
//! Fetches the full index list either through the site's export endpoint
//! or by paging through the rendered table in a headless browser, and
//! saves it as JSON dumps and spreadsheets.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
