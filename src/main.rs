//! simdata entry point: CLI wiring, logging setup and command dispatch.

use std::process;

use simdata::cli::{CliOptions, Command, parse_args, print_usage};
use simdata::config::ConvertConfig;
use simdata::convert::{
    convert_single_sheet, convert_text_cases, convert_workbook, regenerate_manifest,
};
use simdata::rewrite::rewrite_all;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout)
        .try_init();
}

fn load_config(opts: &CliOptions) -> ConvertConfig {
    let cfg = match opts.config.as_deref() {
        Some(path) => match ConvertConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => ConvertConfig::default(),
    };

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg
}

fn main() {
    let opts = parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        print_usage();
        process::exit(1);
    });
    init_logging();
    let cfg = load_config(&opts);

    let report = match &opts.command {
        Command::Text => convert_text_cases(&cfg).map(|s| s.to_string()),
        Command::Workbook => convert_workbook(&cfg).map(|s| s.to_string()),
        Command::Sheet(name) => convert_single_sheet(&cfg, name).map(|s| s.to_string()),
        Command::Manifest => regenerate_manifest(&cfg).map(|m| {
            format!(
                "Manifest written to {} ({} entries)",
                cfg.text.output_dir.display(),
                m.total_sheets
            )
        }),
        Command::RewriteDates => Ok(rewrite_all(&cfg.rewrite).to_string()),
    };

    match report {
        Ok(text) => println!("\n{text}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
