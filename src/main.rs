use colored::Colorize;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = chore::cli::run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
