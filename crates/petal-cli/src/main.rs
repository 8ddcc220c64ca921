use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;
use std::path::PathBuf;

use petal_cli::classify::inference;
use petal_cli::classify::input::ClassifyCliConfig;
use petal_cli::classify::run_session;
use petal_cli::cli::build_cli;
use petal_cli::prepare::{config_from_arguments, run_prepare};
use petal_cli::train::input::TrainCliConfig;
use petal_cli::train::trainer;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("PETAL_LOG", "error,petal=info"))
        .init();

    let matches = build_cli().get_matches();

    let (name, result) = match matches.subcommand() {
        Some(("train", sub_m)) => ("Training", handle_train(sub_m)),
        Some(("classify", sub_m)) => ("Classification", handle_classify(sub_m)),
        Some(("interactive", sub_m)) => ("Interactive session", handle_interactive(sub_m)),
        Some(("prepare", sub_m)) => ("Dataset preparation", handle_prepare(sub_m)),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("{} failed: {:#}", name, e);
            std::process::exit(1)
        }
    }
}

fn config_path(matches: &ArgMatches) -> Option<&PathBuf> {
    let path = matches.get_one::<PathBuf>("config");
    match path {
        Some(p) => log::info!("[Petal] Using config: {:?}", p),
        None => log::info!("[Petal] No config file provided; using defaults."),
    }
    path
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let params = TrainCliConfig::from_arguments(config_path(matches), matches)?;
    trainer::run_training(&params)?;
    Ok(())
}

fn handle_classify(matches: &ArgMatches) -> Result<()> {
    let image: &PathBuf = matches
        .get_one("image")
        .ok_or_else(|| anyhow::anyhow!("An image path is required"))?;
    log::info!("[Petal::Classify] Classifying {:?}", image);
    let params = ClassifyCliConfig::from_arguments(config_path(matches), matches)?;
    inference::run_classify(&params, image)?;
    Ok(())
}

fn handle_interactive(matches: &ArgMatches) -> Result<()> {
    let params = ClassifyCliConfig::from_arguments(config_path(matches), matches)?;
    run_session(&params)
}

fn handle_prepare(matches: &ArgMatches) -> Result<()> {
    let params = config_from_arguments(config_path(matches), matches)?;
    run_prepare(&params)?;
    Ok(())
}
