//! The `imprint` command line.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use imprint_values::{load_values, parse_assignments, read_piped, Format, RealStdin};
use tracing::{debug, info, Level};

use crate::config::load_config;
use crate::error::{ImprintError, Result};
use crate::session::RenderSession;
use crate::tree::RunFlags;

/// Render a file or a directory tree through templates.
#[derive(Parser, Debug, Clone)]
#[command(name = "imprint")]
#[command(version)]
#[command(about = "Render files and directory trees through templates")]
pub struct Cli {
    /// Increase verbosity level (-v warnings, -vv info, -vvv debug)
    #[arg(short, long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,

    /// Configuration file, merged over the defaults in order
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub configs: Vec<PathBuf>,

    /// Directory searched for `library/` templates; earlier ones win
    #[arg(short = 'l', long = "library", value_name = "DIR")]
    pub libraries: Vec<PathBuf>,

    /// Render and validate everything without writing
    #[arg(short, long)]
    pub dry_run: bool,

    /// Values as KEY=VALUE, keys in dot notation
    #[arg(short = 'a', long = "values", value_name = "KEY=VALUE", num_args = 1..)]
    pub values: Vec<String>,

    /// Values file (toml, yaml or json), merged in order
    #[arg(short = 'u', long = "values-file", value_name = "FILE")]
    pub values_files: Vec<PathBuf>,

    /// Format of values piped on standard input
    #[arg(long, value_name = "FORMAT", default_value_t = Format::Yaml)]
    pub stdin_format: Format,

    /// Override existing files and directories
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Maximum depth to render; 1 renders the source node only
    #[arg(short = 'r', long, value_name = "N")]
    pub levels: Option<usize>,

    /// DST is the rendered node itself (default)
    #[arg(short = 'o', long, conflicts_with = "output_in")]
    pub output: bool,

    /// DST is a directory receiving the rendered node
    #[arg(short = 'i', long)]
    pub output_in: bool,

    /// Create DST when missing (with --output-in)
    #[arg(short, long)]
    pub parents: bool,

    /// Source file or directory
    #[arg(value_name = "SRC")]
    pub source: PathBuf,

    /// Destination
    #[arg(value_name = "DST")]
    pub destination: PathBuf,
}

/// Where a validated invocation renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub filename: Option<String>,
}

impl Cli {
    pub fn level(&self) -> Level {
        match self.verbosity {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    pub fn flags(&self) -> RunFlags {
        RunFlags::default()
            .dry_run(self.dry_run)
            .override_existing(self.force)
            .levels(self.levels)
    }

    /// Checks paths before anything is rendered.
    ///
    /// With `--output-in --parents` a missing destination directory is created.
    pub fn validate(&self) -> Result<Target> {
        if !self.source.exists() {
            return Err(invalid(format!(
                "No such input file or directory: \"{}\"",
                self.source.display()
            )));
        }
        let source = fs::canonicalize(&self.source).map_err(ImprintError::io(&self.source))?;

        let destination = &self.destination;
        if destination.exists() {
            if !self.output_in && !self.force {
                return Err(invalid(format!(
                    "Output file or directory \"{}\" exists. Use --force to force overriding.",
                    destination.display()
                )));
            }
            if self.output_in && !destination.is_dir() {
                return Err(invalid(
                    "Output must be a directory when using --output-in.".to_string(),
                ));
            }
        } else if self.output_in {
            if !self.parents {
                return Err(invalid(format!(
                    "No such output directory \"{}\" exists. Use --parents to create it.",
                    destination.display()
                )));
            }
            fs::create_dir_all(destination).map_err(ImprintError::io(destination))?;
        }
        let destination = absolute(destination)?;

        check_paths("configurations", &self.configs, Path::is_file)?;
        check_paths("libraries", &self.libraries, Path::is_dir)?;
        check_paths("values files", &self.values_files, Path::is_file)?;

        if self.output_in {
            return Ok(Target {
                source,
                destination,
                filename: None,
            });
        }

        let filename = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| invalid(format!("Invalid output \"{}\"", self.destination.display())))?;
        let parent = destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Target {
            source,
            destination: parent,
            filename: Some(filename),
        })
    }
}

fn invalid(message: String) -> ImprintError {
    ImprintError::InvalidArguments(message)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        fs::canonicalize(path).map_err(ImprintError::io(path))
    } else {
        std::path::absolute(path).map_err(ImprintError::io(path))
    }
}

fn check_paths(human: &str, paths: &[PathBuf], valid: fn(&Path) -> bool) -> Result<()> {
    let join = |paths: Vec<&PathBuf>| {
        paths
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let missing: Vec<_> = paths.iter().filter(|path| !path.exists()).collect();
    if !missing.is_empty() {
        return Err(invalid(format!("No such {human}: {}", join(missing))));
    }
    let wrong: Vec<_> = paths.iter().filter(|path| !valid(path)).collect();
    if !wrong.is_empty() {
        return Err(invalid(format!("Invalid {human} {}", join(wrong))));
    }
    Ok(())
}

/// Installs the stderr log subscriber for `cli`'s verbosity.
pub fn init_logging(cli: &Cli) {
    let ansi = !cli.no_color && console::colors_enabled_stderr();
    // A subscriber may already be set when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_max_level(cli.level())
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init();
}

/// Runs one invocation and returns the number of nodes processed.
pub fn run(cli: &Cli) -> anyhow::Result<usize> {
    let target = cli.validate()?;
    debug!(?target, "Arguments validated");

    let config = load_config(&cli.configs)?;
    let overrides = parse_assignments(&cli.values)?;
    let piped = read_piped(&RealStdin, cli.stdin_format)?;
    let values = load_values(&cli.values_files, &overrides, piped.as_ref())?;

    let mut session = RenderSession::new(
        config,
        values,
        target.source,
        target.destination,
        target.filename,
    )?
    .with_libraries(cli.libraries.clone());

    let processed = session.run(cli.flags())?;
    info!(processed, dry_run = cli.dry_run, "Done");
    Ok(processed)
}
