mod cli;
mod config;
mod data;
mod error;
mod pipeline;
mod prompt;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{usage_exit_code, Cli};
use config::Config;
use pipeline::Pipeline;

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // help and version go to stdout, usage errors to stderr
            let _ = err.print();
            return ExitCode::from(usage_exit_code(&err));
        }
    };
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("\nError: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply(&mut config);
    let pipeline = Pipeline::new(&config)?;

    let report = match cli.batch_plan()? {
        Some(plan) => {
            let input = cli.input.as_deref().unwrap_or(config.default_input.as_path());
            let report = pipeline.run(input, &plan)?;
            for out in &report.outputs {
                println!("Exported to: {}", out.display());
            }
            report
        }
        None => prompt::interactive_session(&pipeline, cli.input.as_deref())?,
    };

    if cli.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
