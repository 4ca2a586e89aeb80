use std::io;

use clap::{Args, CommandFactory, Parser, Subcommand};
use imxfuse::{
    cli::{self, config::Config, DeviceArgs, LockArgs, ProgramArgs, ShowArgs, WriteMacArgs},
    logging::initialize_logger,
};
use log::{debug, LevelFilter};
use miette::Result;

#[derive(Debug, Parser)]
#[command(about, propagate_version = true, version)]
struct Cli {
    #[command(subcommand)]
    subcommand: Commands,

    /// Log level
    #[arg(long, default_value = "info", env = "IMXFUSE_LOG", global = true)]
    log_level: LevelFilter,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Display the security-relevant fuse settings
    Show(ShowArgs),
    /// Program the SRK hash fuses from a fuse file
    Program(ProgramArgs),
    /// Program the MAC address fuses
    WriteMac(WriteMacArgs),
    /// Change the protection state of a fuse lock
    Lock(LockArgs),
    /// Print every fuse word in the map
    Dump(DeviceArgs),
    /// Generate completion scripts for the given shell
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: clap_complete::Shell,
}

fn main() -> Result<()> {
    miette::set_panic_hook();

    let cli = Cli::parse();
    initialize_logger(cli.log_level);
    debug!("{:#?}", cli.subcommand);

    // Load any user configuration, if present.
    let config = Config::load()?;

    // Execute the correct action based on the provided subcommand and
    // its associated arguments.
    match cli.subcommand {
        Commands::Show(args) => cli::show(args, &config),
        Commands::Program(args) => cli::program(args, &config),
        Commands::WriteMac(args) => cli::write_mac(args, &config),
        Commands::Lock(args) => cli::lock(args, &config),
        Commands::Dump(args) => cli::dump(args, &config),
        Commands::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "imxfuse", &mut io::stdout());
            Ok(())
        }
    }
}
