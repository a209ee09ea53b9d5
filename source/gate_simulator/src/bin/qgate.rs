// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{io, path::PathBuf};

use clap::Parser;
use log::info;
use miette::{NamedSource, Report};
use qgate_simulator::{
    Backend, RunConfig,
    gpu_accelerator::try_create_adapter,
    input::{self, parse_problem},
};

/// Applies a real single-qubit gate to a state vector.
#[derive(Debug, Parser)]
#[command(name = "qgate", version)]
struct Cli {
    /// File holding `a b c d`, the amplitudes and the target bit.
    #[arg(required_unless_present = "adapter_info")]
    input: Option<PathBuf>,

    /// Where the transform runs.
    #[arg(long, value_enum, default_value_t = Backend::Gpu)]
    backend: Backend,

    /// Units of work (amplitude indices) per dispatch group [env: QGATE_WORKGROUP_SIZE]
    #[arg(long)]
    workgroup_size: Option<u32>,

    /// Print the GPU adapter that would be used and exit.
    #[arg(long)]
    adapter_info: bool,
}

fn main() -> miette::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.adapter_info {
        let adapter = try_create_adapter().map_err(|e| miette::miette!(e))?;
        println!("{adapter}");
        return Ok(());
    }
    let Some(path) = cli.input else {
        return Err(miette::miette!("no input file given"));
    };

    let source = input::read_source(&path)?;
    let problem = parse_problem(&source).map_err(|e| {
        Report::new(e).with_source_code(NamedSource::new(path.display().to_string(), source.clone()))
    })?;
    info!(
        "loaded {} amplitudes from {}",
        problem.state.len(),
        path.display()
    );

    let config = RunConfig::from_env(cli.backend, cli.workgroup_size);
    qgate_simulator::run(&config, &problem, &mut io::stdout().lock())?;
    Ok(())
}
