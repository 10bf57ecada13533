use clap::*;
use orfpick::libs::evidence::Evidence;
use orfpick::libs::select::{self, Selector};
use std::io::Write;
use std::path::Path;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("select")
        .about("Applies the retention rule to a six-frame scores table")
        .after_help(
            r###"
Input lines are `accession length score_1 score_2 ... score_6`, whitespace separated.
score_1 is the ORF's own frame. Lines starting with `#` are ignored.

A candidate is retained when any of these holds:
* its accession has a domain hit (--retain-pfam-hits)
* its accession has a homology hit (--retain-blastp-hits)
* its length is at least --retain-long-orfs
* score_1 > 0 and score_1 is greater than every other score

Retained accessions are written one per line, in input order.

Examples:
1. Select from a scores table:
   orfpick select longest_orfs.cds.scores

2. With evidence:
   orfpick select longest_orfs.cds.scores --retain-blastp-hits blastp.outfmt6 -o selected.lst

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Scores table, [stdin] for standard input"),
        )
        .arg(
            Arg::new("retain_long_orfs")
                .long("retain-long-orfs")
                .num_args(1)
                .default_value("900")
                .value_parser(value_parser!(usize))
                .help("Retain ORFs at least this long (nt) regardless of score"),
        )
        .arg(
            Arg::new("retain_pfam_hits")
                .long("retain-pfam-hits")
                .num_args(1)
                .help("Domain table output of hmmscan; hits are retained"),
        )
        .arg(
            Arg::new("retain_blastp_hits")
                .long("retain-blastp-hits")
                .num_args(1)
                .help("Tabular blastp output; hits are retained"),
        )
        .arg(
            Arg::new("single_best_only")
                .long("single-best-only")
                .action(ArgAction::SetTrue)
                .help("Keep only the best ORF per transcript"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Report each evidence-driven retention"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    super::init_logger(args.get_flag("verbose"))?;

    let infile = args.get_one::<String>("infile").unwrap();
    let min_long_orf = *args.get_one::<usize>("retain_long_orfs").unwrap();
    let single_best_only = args.get_flag("single_best_only");

    let evidence = Evidence::load(
        args.get_one::<String>("retain_pfam_hits").map(Path::new),
        args.get_one::<String>("retain_blastp_hits").map(Path::new),
    )?;

    //----------------------------
    // Operating
    //----------------------------
    let rows = select::parse_scores(orfpick::reader(infile)?, Path::new(infile))?;
    let selector = Selector::new(&evidence, min_long_orf).single_best_only(single_best_only);

    let mut writer = orfpick::writer(args.get_one::<String>("outfile").unwrap())?;
    for acc in selector.select_accessions(&rows) {
        writer.write_fmt(format_args!("{}\n", acc))?;
    }
    writer.flush()?;

    Ok(())
}
