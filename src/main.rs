mod args;

use std::io;

use clap::Parser;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_wrangle::config::{load_user_config, UserConfig};
use osm_wrangle::errors::Result;
use osm_wrangle::etl::audit_streets::AuditStreetsEtl;
use osm_wrangle::etl::normalize::Normalizer;
use osm_wrangle::etl::process_data::ProcessDataEtl;
use osm_wrangle::etl::Etl;

use crate::args::{CliArgs, Commands};

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn user_config(args: &CliArgs) -> Result<UserConfig> {
    let mut config = match &args.config {
        Some(path) => load_user_config(path)?,
        None => UserConfig::default(),
    };
    if let Some(input) = &args.input {
        config.data_path = input.clone();
    }
    if let Some(dest) = &args.dest {
        config.dest_path = Some(dest.clone());
    }
    config.pretty |= args.pretty;
    config.progress |= args.progress;
    Ok(config)
}

fn run<E: Etl>(etl: &mut E, config: &UserConfig, force: bool) -> Result<()> {
    let output_dir = config.create_output_dir()?;
    if force {
        etl.clean(&output_dir)?;
    }
    etl.process(&output_dir)
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(&args.log_level);

    let user_config = user_config(&args)?;
    let normalizer = Normalizer::new(user_config.name_substitution)?;

    match args.command {
        Commands::Process => {
            let mut etl = ProcessDataEtl::new(&user_config, &normalizer);
            run(&mut etl, &user_config, args.force)?;
            if let Some(summary) = etl.summary() {
                eprintln!("Wrote {} records from {} elements.", summary.records, summary.elements);
            }
        },
        Commands::AuditStreets => {
            let mut etl = AuditStreetsEtl::new(&user_config, &normalizer);
            run(&mut etl, &user_config, args.force)?;
        },
    }

    Ok(())
}
