//! Interactive mode for the server.
//!
//! Prompts for bind address, port and dataset path before starting the
//! server.

use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use crate::ServerConfig;

/// Runs the server in interactive mode, prompting for configuration.
///
/// Each prompt defaults to the corresponding value of `config`, so flags
/// and environment variables still apply when the user just hits enter.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    println!("Pricing Map Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(config.bind_addr.clone())
        .interact_text()
        .unwrap_or_else(|_| config.bind_addr.clone());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(config.port)
        .interact_text()
        .unwrap_or(config.port);

    let dataset_path: String = Input::new()
        .with_prompt("Dataset path")
        .default(config.dataset_path.display().to_string())
        .interact_text()
        .unwrap_or_else(|_| config.dataset_path.display().to_string());

    let config = ServerConfig {
        bind_addr,
        port,
        dataset_path: PathBuf::from(dataset_path),
        ..config
    };

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{} with {}?",
            config.bind_addr,
            config.port,
            config.dataset_path.display()
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config).await
}
