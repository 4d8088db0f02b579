use std::env;
use std::path::PathBuf;

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub catalogue: PathBuf,
    pub pattern: PathBuf,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub batch: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut catalogue = None;
    let mut pattern = None;
    let mut seed = None;
    let mut output = None;
    let mut batch = false;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--catalogue" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --catalogue (expected a CSV file path)")?;
                if catalogue.replace(PathBuf::from(path)).is_some() {
                    return Err("--catalogue provided more than once".to_string());
                }
            }
            "--pattern" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --pattern (expected a CSV file path)")?;
                if pattern.replace(PathBuf::from(path)).is_some() {
                    return Err("--pattern provided more than once".to_string());
                }
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let value = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                if seed.replace(value).is_some() {
                    return Err("--seed provided more than once".to_string());
                }
            }
            "--output" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --output (expected a directory)")?;
                if output.replace(PathBuf::from(path)).is_some() {
                    return Err("--output provided more than once".to_string());
                }
            }
            "--batch" => batch = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if config.is_none() && preset.is_none() {
        preset = Some("baseline".to_string());
    }
    let catalogue = catalogue.ok_or_else(|| "--catalogue is required".to_string())?;
    let pattern = pattern.ok_or_else(|| "--pattern is required".to_string())?;
    if batch && output.is_none() {
        return Err("--batch requires --output".to_string());
    }

    Ok(CliOptions {
        config,
        preset,
        catalogue,
        pattern,
        seed,
        output,
        batch,
    })
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
    eprintln!("res-chronics: spatially correlated solar and wind production chronics");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  res-chronics --catalogue <csv> --pattern <csv> [--config <toml> | --preset <name>]"
    );
    eprintln!("               [--seed <u64>] [--output <dir>] [--batch]");
    eprintln!();
    eprintln!("Without --output the chronics are generated in memory and only summarized.");
    eprintln!("--batch fans out over [batch] scenarios and start dates into --output.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn minimal_invocation_defaults_to_baseline() {
        let opts = parse_args_from(args(&["--catalogue", "prods.csv", "--pattern", "solar.csv"]))
            .expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("baseline"));
        assert!(opts.config.is_none());
        assert!(opts.output.is_none());
        assert!(!opts.batch);
    }

    #[test]
    fn supports_config_seed_and_output() {
        let opts = parse_args_from(args(&[
            "--config", "params.toml", "--catalogue", "c.csv", "--pattern", "p.csv", "--seed",
            "17", "--output", "out",
        ]))
        .expect("parse should succeed");
        assert_eq!(
            opts.config.as_deref().and_then(|p| p.to_str()),
            Some("params.toml")
        );
        assert!(opts.preset.is_none());
        assert_eq!(opts.seed, Some(17));
        assert_eq!(opts.output.as_deref().and_then(|p| p.to_str()), Some("out"));
    }

    #[test]
    fn config_and_preset_are_exclusive() {
        let err = parse_args_from(args(&[
            "--config", "a.toml", "--preset", "baseline", "--catalogue", "c", "--pattern", "p",
        ]));
        assert!(err.is_err());
    }

    #[test]
    fn catalogue_is_required() {
        let err = parse_args_from(args(&["--pattern", "p.csv"]));
        assert!(err.is_err_and(|e| e.contains("--catalogue")));
    }

    #[test]
    fn batch_needs_output() {
        let err = parse_args_from(args(&["--catalogue", "c", "--pattern", "p", "--batch"]));
        assert!(err.is_err());
    }

    #[test]
    fn bad_seed_is_rejected() {
        let err = parse_args_from(args(&["--catalogue", "c", "--pattern", "p", "--seed", "x"]));
        assert!(err.is_err_and(|e| e.contains("not a valid u64")));
    }
}
