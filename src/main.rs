//! Slab simulator entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tracing::error;

use slab_sim::cli::{self, CliOptions};
use slab_sim::config::EngineConfig;
use slab_sim::io::export::export_csv;
use slab_sim::io::store::JsonStore;
use slab_sim::runner::run_continuous;
use slab_sim::sim::engine::Engine;
use slab_sim::sim::summary::RunSummary;
use slab_sim::sim::types::StepResult;
use slab_sim::telemetry::init_tracing;

fn load_config(cli: &CliOptions) -> EngineConfig {
    // --config takes priority, then --preset, then baseline default
    let loaded = if let Some(ref path) = cli.config {
        EngineConfig::from_toml_file(path)
    } else if let Some(ref name) = cli.preset {
        EngineConfig::from_preset(name)
    } else {
        Ok(EngineConfig::baseline())
    };

    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(ref dir) = cli.data_dir {
        config.simulation.data_dir = dir.display().to_string();
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn main() {
    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });
    if cli.help {
        cli::print_usage();
        return;
    }

    init_tracing(cli.json_logs);

    let config = load_config(&cli);
    let interval = Duration::from_secs_f64(config.simulation.interval_secs);
    let store = JsonStore::new(&config.simulation.data_dir);

    let mut engine = Engine::resume(config, store).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if cli.reset {
        if let Err(e) = engine.reset() {
            error!(error = %e, "reset could not rewrite documents");
        }
    }
    for role in &cli.kill_battery {
        engine.kill_cell(*role);
    }
    for role in &cli.bad_battery {
        engine.set_bad_cell(*role, true);
    }

    let keep = cli.keeps_results();
    let mut results = Vec::new();
    let mut summary: Option<RunSummary> = None;
    let mut on_step = |r: &StepResult| {
        println!("{r}");
        match summary.as_mut() {
            Some(s) => s.record(r),
            None => summary = Some(RunSummary::starting_with(r)),
        }
        if keep {
            results.push(r.clone());
        }
    };

    let outcome = if cli.continuous {
        // Without --steps this runs until the process is killed.
        let stop = AtomicBool::new(false);
        run_continuous(&mut engine, interval, &stop, cli.step_limit(), &mut on_step).map(|_| ())
    } else {
        let n = cli.step_limit().unwrap_or(cli::DEFAULT_STEPS);
        (0..n).try_for_each(|_| engine.step().map(|r| on_step(&r)))
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        process::exit(1);
    }

    if let Some(summary) = summary {
        println!("\n{summary}");
    }

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {}", path.display());
    }
}
