//! reprolayer CLI - build reproducible container image layers

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use reprolayer::{Error, LayerConfig};

#[derive(Parser)]
#[command(name = "reprolayer")]
#[command(about = "reproducible container image layer builder")]
#[command(version)]
struct Cli {
    /// more log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// build a layer tar
    Build {
        #[command(flatten)]
        sources: SourceArgs,

        /// output file
        #[arg(short, long)]
        output: PathBuf,

        /// compress with zstd, optionally at the given level
        #[arg(long, num_args = 0..=1, default_missing_value = "3", value_name = "LEVEL")]
        zstd: Option<i32>,
    },

    /// list the entries a build would write, in archive order
    List {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// list the registered source paths, in registration order
    Sources {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// layer manifest (TOML)
    #[arg(short, long, env = "REPROLAYER_MANIFEST")]
    manifest: Option<PathBuf>,

    /// add SRC at PATH inside the image (SRC:PATH, repeatable)
    #[arg(short, long = "add", value_name = "SRC:PATH")]
    add: Vec<String>,
}

impl SourceArgs {
    /// manifest entries first, then `--add` entries in command line order
    fn load(&self) -> reprolayer::Result<LayerConfig> {
        let mut config = match &self.manifest {
            Some(path) => LayerConfig::load(path)?,
            None => LayerConfig::default(),
        };
        for spec in &self.add {
            let (src, path) = parse_add(spec)?;
            config.add_entry(vec![src], path);
        }
        if config.entries.is_empty() {
            return Err(Error::InvalidPath(
                "nothing to build: pass --manifest or --add".to_string(),
            ));
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("reprolayer={level}")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: Cli) -> reprolayer::Result<()> {
    match cli.command {
        Commands::Build {
            sources,
            output,
            zstd,
        } => {
            let config = sources.load()?;
            let builder = config.to_builder()?;
            let layer = builder.build()?;

            let level = zstd.or_else(|| config.zstd_level());
            let written = match level {
                Some(level) => layer.write_zstd_to(&output, level)?,
                None => layer.write_to(&output)?,
            };

            println!("wrote {} ({} bytes)", output.display(), written.size);
            println!("digest  {}", written.digest);
            println!("diff id {}", written.diff_id);
        }

        Commands::List { sources } => {
            let builder = sources.load()?.to_builder()?;
            for entry in builder.entries()? {
                println!(
                    "{:>9} {:04o} {:>10} {}",
                    entry.file_type.type_name(),
                    entry.mode,
                    entry.size,
                    entry.name
                );
            }
        }

        Commands::Sources { sources } => {
            let builder = sources.load()?.to_builder()?;
            for path in builder.source_files() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

/// split `SRC:PATH` at the last colon
fn parse_add(spec: &str) -> reprolayer::Result<(PathBuf, String)> {
    match spec.rsplit_once(':') {
        Some((src, path)) if !src.is_empty() && path.starts_with('/') => {
            Ok((Path::new(src).to_path_buf(), path.to_string()))
        }
        _ => Err(Error::InvalidPath(format!(
            "expected SRC:/PATH, got {}",
            spec
        ))),
    }
}
