use anyhow::Result;
use clap::Parser;
use smellmap::cli::{Cli, Commands};
use smellmap::commands::{self, AnalyzeConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            context,
            config,
            format,
            output,
            no_dynamic,
            no_static,
            jobs,
        } => commands::handle_analyze(AnalyzeConfig {
            context,
            config,
            format,
            output,
            no_dynamic,
            no_static,
            jobs,
        }),
        Commands::Init { force } => commands::init_config(force),
    }
}
