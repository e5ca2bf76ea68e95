use crate::io::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "smellmap")]
#[command(about = "Architectural smell analyzer for microservice deployments", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a microservice application for architectural smells
    Analyze {
        /// Application context directory (root for repository paths)
        #[arg(long, default_value = ".")]
        context: PathBuf,

        /// Application config file
        #[arg(short, long, default_value = "smellmap.yaml")]
        config: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip dynamic (live-cluster) analyses
        #[arg(long)]
        no_dynamic: bool,

        /// Skip static analyses
        #[arg(long)]
        no_static: bool,

        /// Worker threads for static analyses (defaults to the number of cores)
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Write a starter configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}
