extern crate clap;
use clap::*;

mod cmd_orfpick;

fn main() -> anyhow::Result<()> {
    let app = Command::new("orfpick")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`orfpick` - Select likely coding ORFs from transcript candidates")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_orfpick::predict::make_subcommand())
        .subcommand(cmd_orfpick::select::make_subcommand())
        .subcommand(cmd_orfpick::longest::make_subcommand())
        .after_help(
            r###"Subcommands:

* Pipelines:
    * predict - Train, score and select ORFs, then write the final annotations

* Pieces of the pipeline:
    * select  - Apply the retention rule to a six-frame scores table
    * longest - Extract the longest FASTA records

"###,
        );

    // Dispatch to the chosen subcommand
    match app.get_matches().subcommand() {
        Some(("predict", sub_matches)) => cmd_orfpick::predict::execute(sub_matches),
        Some(("select", sub_matches)) => cmd_orfpick::select::execute(sub_matches),
        Some(("longest", sub_matches)) => cmd_orfpick::longest::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
