use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::formats::mdl::{Edition, MdlWriteOptions, Platform};

pub mod bwm;
pub mod definitions;
pub mod execute;
pub mod gff;
pub mod mdl;
pub mod pth;
pub mod tpc;

use definitions::{BwmCommands, GffCommands, MdlCommands, PthCommands, TpcCommands};

#[derive(Subcommand)]
pub enum Commands {
    /// MDL/MDX model operations
    Mdl {
        #[command(subcommand)]
        command: MdlCommands,
    },

    /// BWM walkmesh operations (WOK, PWK, DWK)
    Bwm {
        #[command(subcommand)]
        command: BwmCommands,
    },

    /// GFF document operations
    Gff {
        #[command(subcommand)]
        command: GffCommands,
    },

    /// PTH path file operations
    Pth {
        #[command(subcommand)]
        command: PthCommands,
    },

    /// TPC texture operations
    Tpc {
        #[command(subcommand)]
        command: TpcCommands,
    },
}

/// Encoder switches shared by the model commands
#[derive(Args, Debug, Clone, Default)]
pub struct WriteOptionArgs {
    /// Target the Xbox build
    #[arg(long)]
    pub xbox: bool,

    /// Target The Sith Lords
    #[arg(long)]
    pub tsl: bool,

    /// Store animation orientations as packed quaternions (lossy)
    #[arg(long)]
    pub compress_quaternions: bool,

    /// JSON file with `MdlWriteOptions`; flags above override it
    #[arg(long = "options", value_name = "JSON")]
    pub options_file: Option<PathBuf>,
}

impl WriteOptionArgs {
    /// Resolve the encoder options.
    ///
    /// # Errors
    /// Returns an error if the options file cannot be read or parsed.
    pub fn resolve(&self) -> anyhow::Result<MdlWriteOptions> {
        let mut options = match &self.options_file {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => MdlWriteOptions::default(),
        };
        if self.xbox {
            options.platform = Platform::Xbox;
        }
        if self.tsl {
            options.edition = Edition::Tsl;
        }
        if self.compress_quaternions {
            options.compress_quaternions = true;
        }
        Ok(options)
    }
}

/// Print `text` or write it to `output` when given.
pub(crate) fn emit(text: &str, output: Option<&std::path::Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"edition": "tsl", "compress_quaternions": true}"#).unwrap();

        let args = WriteOptionArgs {
            xbox: true,
            options_file: Some(path),
            ..Default::default()
        };
        let options = args.resolve().unwrap();
        assert_eq!(options.platform, Platform::Xbox);
        assert_eq!(options.edition, Edition::Tsl);
        assert!(options.compress_quaternions);

        assert_eq!(WriteOptionArgs::default().resolve().unwrap(), MdlWriteOptions::default());
    }
}
