/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When ConsoleConfig schema changes
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};

use secprobe_adapter::DEFAULT_BASE_URL;
use secprobe_console::config::{
    AuthSettings, ConsoleConfig, EngineSettings, LoggingSettings, PollingSettings,
};

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to secprobe init").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a console configuration.").dim()
    );

    if output.exists()
        && !Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} exists. Overwrite?", output.display()))
            .default(false)
            .interact()?
    {
        println!("{}", style("Aborted; nothing written.").yellow());
        return Ok(());
    }

    let theme = ColorfulTheme::default();

    println!("\n{}", style("--- Engine ---").bold());
    let base_url: String = Input::with_theme(&theme)
        .with_prompt("Engine base URL")
        .default(DEFAULT_BASE_URL.to_string())
        .interact_text()?;

    println!("\n{}", style("--- Credentials ---").bold());
    let methods = ["username / password", "access token", "none"];
    let method = Select::with_theme(&theme)
        .with_prompt("How should the console authenticate?")
        .items(&methods)
        .default(0)
        .interact()?;

    let auth = match method {
        0 => {
            let username: String = Input::with_theme(&theme)
                .with_prompt("Username")
                .default("admin".to_string())
                .interact_text()?;
            let password = Password::with_theme(&theme)
                .with_prompt("Password")
                .interact()?;
            AuthSettings {
                username: Some(username),
                password: Some(password),
                ..AuthSettings::default()
            }
        }
        1 => {
            let access_token: String = Input::with_theme(&theme)
                .with_prompt("Access token")
                .interact_text()?;
            AuthSettings {
                access_token: Some(access_token),
                ..AuthSettings::default()
            }
        }
        _ => AuthSettings::default(),
    };

    println!("\n{}", style("--- Polling ---").bold());
    let defaults = PollingSettings::default();
    let detail_interval_ms: u64 = Input::with_theme(&theme)
        .with_prompt("Task detail refresh (ms)")
        .default(defaults.detail_interval_ms)
        .interact_text()?;
    let list_interval_ms: u64 = Input::with_theme(&theme)
        .with_prompt("Task list refresh (ms)")
        .default(defaults.list_interval_ms)
        .interact_text()?;

    let config = ConsoleConfig {
        engine: EngineSettings {
            base_url,
            ..EngineSettings::default()
        },
        auth,
        polling: PollingSettings {
            detail_interval_ms,
            list_interval_ms,
        },
        logging: LoggingSettings::default(),
    };
    config.validate()?;

    let yaml = config.to_yaml()?;
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, yaml)
        .with_context(|| format!("failed to write config to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );

    Ok(())
}
