use clap::Parser;
use colored::Colorize;
use m3u8_dl::{Args, Logger};
use std::process;

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    colored::control::set_override(args.colored());
    Logger::init(args.log_level())?;
    args.execute().await
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".bold().red(), e);
        process::exit(1);
    }
}
