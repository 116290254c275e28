//! Command execution implementations

use super::Commands;
use super::definitions::{BwmCommands, GffCommands, MdlCommands, PthCommands, TpcCommands};
use super::{bwm, gff, mdl, pth, tpc};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Mdl { command } => command.execute(),
            Commands::Bwm { command } => command.execute(),
            Commands::Gff { command } => command.execute(),
            Commands::Pth { command } => command.execute(),
            Commands::Tpc { command } => command.execute(),
        }
    }
}

impl MdlCommands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            MdlCommands::Inspect { path } => mdl::inspect(path),
            MdlCommands::ToJson {
                source,
                destination,
            } => mdl::to_json(source, destination.as_deref()),
            MdlCommands::Rewrite {
                source,
                destination,
                options,
            } => mdl::rewrite(source, destination, &options.resolve()?),
        }
    }
}

impl BwmCommands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            BwmCommands::Inspect { path } => bwm::inspect(path),
            BwmCommands::ToJson {
                source,
                destination,
            } => bwm::to_json(source, destination.as_deref()),
            BwmCommands::Rewrite {
                source,
                destination,
            } => bwm::rewrite(source, destination),
        }
    }
}

impl GffCommands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            GffCommands::ToJson {
                source,
                destination,
            } => gff::to_json(source, destination.as_deref()),
        }
    }
}

impl PthCommands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            PthCommands::Inspect { path } => pth::inspect(path),
        }
    }
}

impl TpcCommands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            TpcCommands::Info { path } => tpc::info(path),
            TpcCommands::ToPng {
                source,
                destination,
            } => tpc::to_png(source, destination),
            TpcCommands::Batch {
                source,
                destination,
                quiet,
            } => tpc::batch(source, destination, *quiet),
        }
    }
}
