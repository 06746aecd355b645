mod cli;
mod config;
mod model;
mod notify;
mod orchestrator;
mod platform;
mod text_summary;

use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = cli::Cli::parse();
    match cli::run(args).await {
        // The run always completes; the exit code reports whether every
        // configured application ended up running.
        Ok(all_running) => std::process::exit(if all_running { 0 } else { 1 }),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}
