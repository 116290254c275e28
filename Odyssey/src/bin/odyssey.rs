//! Odyssey command-line binary

fn main() -> anyhow::Result<()> {
    odyssey::cli::run_cli()
}
