// Entrypoint for the CLI application.
// - Asks for the config file, builds the API client and hands both to the
//   interactive session.
// - A missing config file ends the program quietly with success status.

use anyhow::Context;
use crossterm::tty::IsTty;
use env_logger::Env;
use photoapp_cli::api::ApiClient;
use photoapp_cli::config::ClientConfig;
use photoapp_cli::error::ClientError;
use photoapp_cli::ui::{choose_config_file, Session, TerminalConsole};
use std::io;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    println!("** Welcome to PhotoApp v2 **");
    println!();

    let mut console = TerminalConsole;
    let config_file = choose_config_file(&mut console, &mut io::stdout())?;

    let config = match ClientConfig::from_file(&config_file) {
        Ok(config) => config,
        Err(ClientError::ConfigMissing(path)) => {
            println!("**ERROR: config file '{path}' does not exist, exiting");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };

    let api = ApiClient::from_config(&config)?;

    // Blocks until the user enters 0.
    let color = io::stdout().is_tty();
    let mut session = Session::new(api, &config, console, io::stdout()).with_color(color);
    session.run()
}
