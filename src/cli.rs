//! Command line parsing exposed via the library.
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use crate::{bundler::Bundler, config::ConfigFile, BundleOptions, ChangeOutputPath};

#[derive(StructOpt)]
#[structopt(about = "Bundle JavaScript modules into a single file")]
enum PumiceCommands {
    /// Generate a bundle
    Bundle {
        /// Write bundle to output
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,
        /// Path to a JSON config file
        #[structopt(short, long, parse(from_os_str))]
        config: Option<PathBuf>,
        /// Build each frontier of the graph in parallel
        #[structopt(long)]
        parallel: bool,
        /// Rename the bundle to a hash of its file name
        #[structopt(long)]
        hash_output: bool,
        /// Bundle entry point
        #[structopt(parse(from_os_str))]
        entry: Option<PathBuf>,
    },

    /// Print the module graph for an entry point
    Graph {
        /// Path to a JSON config file
        #[structopt(short, long, parse(from_os_str))]
        config: Option<PathBuf>,
        /// Print the file name for each module
        #[structopt(short = "f", long)]
        include_file: bool,
        /// Module entry point
        #[structopt(parse(from_os_str))]
        entry: Option<PathBuf>,
    },
}

fn load_options(
    config: Option<PathBuf>,
    entry: Option<PathBuf>,
) -> Result<BundleOptions> {
    match (config, entry) {
        (Some(config), entry) => ConfigFile::load(config)?.into_options(entry),
        (None, Some(entry)) => Ok(BundleOptions::new(entry)),
        (None, None) => anyhow::bail!("an entry point or --config is required"),
    }
}

fn bundle(
    entry: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    parallel: bool,
    hash_output: bool,
) -> Result<()> {
    let mut options = load_options(config, entry)?;
    if let Some(output) = output {
        options = options.output(output);
    }
    if parallel {
        options = options.parallel(true);
    }
    if hash_output {
        options = options.plugin(ChangeOutputPath);
    }
    let path = Bundler::new(options).build()?;
    println!("{}", path.display());
    Ok(())
}

fn graph(
    entry: Option<PathBuf>,
    config: Option<PathBuf>,
    include_file: bool,
) -> Result<()> {
    let options = load_options(config, entry)?;
    let assets = Bundler::new(options).graph()?;
    for asset in assets.iter() {
        if include_file {
            println!("{} {}", asset.id, asset.path.display());
        } else {
            println!("{}", asset.id);
        }
        for (specifier, id) in asset.specifier_to_id.iter() {
            println!("  {} -> {}", specifier, id);
        }
    }
    Ok(())
}

/// Parse the given arguments list or `std::env::os_args` and run the program.
pub fn run<T>(argv: Option<Vec<T>>) -> Result<()>
where
    T: Into<OsString> + Clone,
{
    if std::env::var("RUST_LOG").ok().is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let app = PumiceCommands::clap();
    let matches = if let Some(argv) = argv {
        app.get_matches_from(argv)
    } else {
        app.get_matches()
    };
    let args = PumiceCommands::from_clap(&matches);
    match args {
        PumiceCommands::Bundle {
            entry,
            config,
            output,
            parallel,
            hash_output,
        } => bundle(entry, config, output, parallel, hash_output)?,
        PumiceCommands::Graph {
            entry,
            config,
            include_file,
        } => graph(entry, config, include_file)?,
    }
    Ok(())
}
