//! Subcommand modules for the `orfpick` binary.

pub mod longest;
pub mod predict;
pub mod select;

/// Progress goes to stderr; `--verbose` adds per-candidate diagnostics.
pub fn init_logger(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    simple_logger::init_with_level(level)?;

    Ok(())
}
