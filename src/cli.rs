use std::env;
use std::path::PathBuf;

use crate::devices::battery::CellRole;

/// Steps taken when neither `--steps` nor `--continuous` is given.
pub const DEFAULT_STEPS: usize = 144;

#[derive(Debug, Default)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub steps: Option<usize>,
    pub continuous: bool,
    pub reset: bool,
    pub kill_battery: Vec<CellRole>,
    pub bad_battery: Vec<CellRole>,
    pub telemetry_out: Option<PathBuf>,
    pub json_logs: bool,
    pub help: bool,
}

impl CliOptions {
    /// Steps to run in batch mode, or the limit in continuous mode.
    pub fn step_limit(&self) -> Option<usize> {
        match (self.steps, self.continuous) {
            (Some(n), _) => Some(n),
            (None, true) => None,
            (None, false) => Some(DEFAULT_STEPS),
        }
    }

    /// Whether every step result must be kept for the CSV export. Only
    /// bounded runs can export.
    pub fn keeps_results(&self) -> bool {
        self.telemetry_out.is_some()
    }
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if opts.config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--data-dir" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --data-dir (expected a directory)")?;
                opts.data_dir = Some(PathBuf::from(path));
            }
            "--steps" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --steps (expected a count)")?;
                let n = raw
                    .parse::<usize>()
                    .map_err(|_| format!("--steps value \"{raw}\" is not a valid count"))?;
                opts.steps = Some(n);
            }
            "--kill-battery" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --kill-battery (expected 0-3)")?;
                opts.kill_battery.push(parse_cell(raw)?);
            }
            "--bad-battery" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --bad-battery (expected 0-3)")?;
                opts.bad_battery.push(parse_cell(raw)?);
            }
            "--telemetry-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --telemetry-out (expected a file path)",
                )?;
                if opts.telemetry_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--telemetry-out provided more than once".to_string());
                }
            }
            "--continuous" => opts.continuous = true,
            "--reset" => opts.reset = true,
            "--json-logs" => opts.json_logs = true,
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.continuous && opts.steps.is_none() && opts.telemetry_out.is_some() {
        return Err(
            "`--telemetry-out` with `--continuous` needs `--steps`; an unbounded run never ends cleanly"
                .to_string(),
        );
    }

    if opts.config.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

fn parse_cell(raw: &str) -> Result<CellRole, String> {
    let index = raw
        .parse::<usize>()
        .map_err(|_| format!("battery index \"{raw}\" is not a number"))?;
    CellRole::try_from(index).map_err(|e| e.to_string())
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("slab-sim: curing concrete slab simulator");
    eprintln!();
    eprintln!("Usage: slab-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from a TOML file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, heatwave, cold_snap)");
    eprintln!("  --data-dir <path>        Directory for the JSON documents");
    eprintln!("  --steps <n>              Number of steps to run (default: {DEFAULT_STEPS})");
    eprintln!("  --continuous             Step on a real-time interval until Ctrl+C");
    eprintln!("  --reset                  Delete saved state and start from the origin");
    eprintln!("  --kill-battery <0-3>     Empty a battery cell before running (repeatable)");
    eprintln!("  --bad-battery <0-3>      Flag a battery cell as bad (repeatable)");
    eprintln!("  --telemetry-out <path>   Export step results to CSV");
    eprintln!("  --json-logs              Emit logs as JSON");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Battery cells: 0 concrete sensor, 1 air sensor, 2 pump, 3 heater.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_batch_run() {
        let opts = parse_args_from(Vec::new()).expect("parse should succeed");
        assert!(opts.config.is_none());
        assert!(!opts.continuous);
        assert_eq!(opts.step_limit(), Some(DEFAULT_STEPS));
    }

    #[test]
    fn supports_config_cli() {
        let opts = parse_args_from(args(&["--config", "slab.toml", "--steps", "12"]))
            .expect("parse should succeed");
        assert_eq!(
            opts.config.as_deref().and_then(|p| p.to_str()),
            Some("slab.toml")
        );
        assert_eq!(opts.step_limit(), Some(12));
    }

    #[test]
    fn continuous_without_steps_is_unbounded() {
        let opts = parse_args_from(args(&["--continuous", "--reset"])).unwrap();
        assert!(opts.reset);
        assert_eq!(opts.step_limit(), None);
    }

    #[test]
    fn battery_flags_are_repeatable() {
        let opts = parse_args_from(args(&[
            "--kill-battery",
            "3",
            "--bad-battery",
            "0",
            "--bad-battery",
            "1",
        ]))
        .unwrap();
        assert_eq!(opts.kill_battery, vec![CellRole::Heater]);
        assert_eq!(opts.bad_battery, vec![CellRole::ConcreteSensor, CellRole::AirSensor]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args_from(args(&["--kill-battery", "7"])).is_err());
        assert!(parse_args_from(args(&["--kill-battery", "pump"])).is_err());
        assert!(parse_args_from(args(&["--steps", "-1"])).is_err());
        assert!(parse_args_from(args(&["--steps"])).is_err());
        assert!(parse_args_from(args(&["--bogus"])).is_err());
        assert!(parse_args_from(args(&["--config", "a.toml", "--preset", "heatwave"])).is_err());
    }

    #[test]
    fn unbounded_continuous_run_cannot_export() {
        assert!(parse_args_from(args(&["--continuous", "--telemetry-out", "t.csv"])).is_err());

        let opts =
            parse_args_from(args(&["--continuous", "--steps", "6", "--telemetry-out", "t.csv"]))
                .unwrap();
        assert!(opts.keeps_results());

        let opts = parse_args_from(args(&["--continuous"])).unwrap();
        assert!(!opts.keeps_results());
    }

    #[test]
    fn help_flag() {
        assert!(parse_args_from(args(&["--help"])).unwrap().help);
    }
}
