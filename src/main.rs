//! Command-line entry point: load inputs, run one call or a batch, report.

mod cli;

use std::process;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use res_chronics::batch::run_batch;
use res_chronics::catalogue::NodeCatalogue;
use res_chronics::config::GenerationParameters;
use res_chronics::generator::generate;
use res_chronics::pattern::IrradiancePattern;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };

    // --config takes priority, then --preset
    let loaded = match (&opts.config, &opts.preset) {
        (Some(path), _) => GenerationParameters::from_toml_file(path),
        (None, Some(name)) => GenerationParameters::from_preset(name),
        (None, None) => Ok(GenerationParameters::baseline()),
    };
    let mut params = match loaded {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    if let Some(seed) = opts.seed {
        params.seed = seed;
    }

    let errors = params.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let catalogue = match NodeCatalogue::from_csv_path(&opts.catalogue) {
        Ok(c) => c,
        Err(e) => {
            error!(path = %opts.catalogue.display(), "{e}");
            process::exit(1);
        }
    };
    let pattern = match IrradiancePattern::from_csv_path(&opts.pattern, params.pattern.trailing_sample)
    {
        Ok(p) => p,
        Err(e) => {
            error!(path = %opts.pattern.display(), "{e}");
            process::exit(1);
        }
    };
    info!(
        nodes = catalogue.len(),
        pattern_hours = pattern.len(),
        seed = params.seed,
        "inputs loaded"
    );

    match (opts.batch, opts.output.as_deref()) {
        (true, Some(root)) => match run_batch(&params, &catalogue, &pattern, params.seed, root) {
            Ok(summary) => {
                println!(
                    "Batch finished: {} ok, {} failed (seeds in {})",
                    summary.success,
                    summary.failure,
                    summary.seeds_path.display()
                );
                if let Some(path) = summary.errors_path {
                    eprintln!("Errors written to {}", path.display());
                    process::exit(1);
                }
            }
            Err(e) => {
                error!("{e}");
                process::exit(1);
            }
        },
        (_, destination) => match generate(&params, &catalogue, &pattern, params.seed, destination)
        {
            Ok(out) => {
                println!("{}", out.report);
                for path in &out.written {
                    eprintln!("wrote {}", path.display());
                }
            }
            Err(e) => {
                error!("{e}");
                process::exit(1);
            }
        },
    }
}
