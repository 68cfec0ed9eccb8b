use clap::{Parser, Subcommand};
use scenario_tools::describe::{self, DescribeArgs};
use scenario_tools::inspect::{self, InspectArgs};
use scenario_tools::package::{self, PackageArgs};
use scenario_tools::params::{self, ParamsArgs};
use scenario_tools::sample::{self, SampleArgs};

#[derive(Parser, Debug)]
#[command(name = "scenario-tools", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an FMI 2.0 modelDescription.xml for the scenario FMU.
    Describe(DescribeArgs),
    /// Build a co-simulation .fmu from the shared library and a model description.
    Package(PackageArgs),
    /// Write an SSP parameter set (.ssv) with the scenario parameters.
    Params(ParamsArgs),
    /// Step through a scenario and write the outputs as CSV.
    Sample(SampleArgs),
    /// Print the parsed scenario and its warnings as JSON.
    Inspect(InspectArgs),
}

fn main() -> anyhow::Result<()> {
    scenario_tools::init_logging();

    match Cli::parse().command {
        Commands::Describe(args) => describe::run(args),
        Commands::Package(args) => package::run(args),
        Commands::Params(args) => params::run(args),
        Commands::Sample(args) => sample::run(args),
        Commands::Inspect(args) => inspect::run(args),
    }
}
