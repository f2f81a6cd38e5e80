// src/bin/cli.rs
use bd_catalog::cli;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli::run()
}
