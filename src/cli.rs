use std::env;
use std::path::PathBuf;

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Convert every `Case_*.txt` file, then write the manifest.
    Text,
    /// Convert every sheet of the workbook, then write the manifest.
    Workbook,
    /// Convert one named sheet.
    Sheet(String),
    /// Rewrite chunk times for every folder in the rewrite table.
    RewriteDates,
    /// Rescan the text output directory and rewrite `manifest.json`.
    Manifest,
}

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub command: Command,
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
    let mut positional: Vec<&str> = Vec::new();

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --config (expected a TOML file path)",
                )?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown argument: {other}"));
            }
            other => positional.push(other),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        [] => return Err("missing command".to_string()),
        ["sheet"] => {
            return Err(
                "missing value for `sheet` (expected a sheet name, e.g. 'Ref_Summer')".to_string(),
            );
        }
        ["sheet", name] => Command::Sheet((*name).to_string()),
        [cmd] => match *cmd {
            "text" => Command::Text,
            "workbook" => Command::Workbook,
            "rewrite-dates" => Command::RewriteDates,
            "manifest" => Command::Manifest,
            other => return Err(format!("unknown command: {other}")),
        },
        [cmd, extra, ..] => return Err(format!("unexpected argument after `{cmd}`: {extra}")),
    };

    Ok(CliOptions { config, command })
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
    eprintln!("Usage:");
    eprintln!("  simdata [--config <path>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  text            Convert every Case_*.txt file and write the manifest");
    eprintln!("  workbook        Convert every workbook sheet and write the manifest");
    eprintln!("  sheet <name>    Convert a single workbook sheet");
    eprintln!("  rewrite-dates   Rewrite chunk times against the configured start dates");
    eprintln!("  manifest        Rescan the text output directory and rewrite manifest.json");
    eprintln!();
    eprintln!("Log level defaults to info; set RUST_LOG to change it.");
}
