//! bundle_relocate - build, relocate, verify and package a Qt `.app` bundle.

use bundle_relocate::cli;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let exit_code = cli::run().await;
    process::exit(exit_code);
}
