use aaa_core::config::AnalysisConfig;
use anyhow::Result;
use clap::Parser;

pub mod cli;
pub mod commands;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config
    let config = resolve_config(&cli)?;

    // 4. Exécuter la sous-commande
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&cli.command, &config, &mut out)
}

fn resolve_config(cli: &cli::Cli) -> Result<AnalysisConfig> {
    if cli.config.exists() {
        aaa_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(AnalysisConfig::default())
    }
}
