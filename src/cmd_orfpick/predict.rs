use clap::*;
use orfpick::libs::pipeline::{self, PredictOptions};
use orfpick::libs::tool::ToolResolver;
use std::path::PathBuf;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("predict")
        .about("Predicts likely coding regions from candidate ORFs")
        .after_help(
            r###"
This command picks the candidate ORFs most likely to be protein coding. It expects the
working directory `<transcripts>.orfpick_dir/` written by the ORF enumeration stage,
holding longest_orfs.cds, longest_orfs.gff3, longest_orfs.pep and base_freqs.dat.

Process:
1. Curates a training set: the 10*T longest candidates, made non-redundant
   with cd-hit-est at 80% identity, then the T longest survivors
2. Trains the hexamer model and scores every candidate in six frames
3. Retains a candidate if it has a domain hit, a homology hit,
   is at least --retain-long-orfs nt long, or scores positive in its own
   frame and better than in any other frame
4. Maps the retained candidates back to GFF3, drops eclipsed ORFs and
   writes .gff3, .bed, .pep, .cds and .mRNA

Notes:
* Stages 1 and 2 leave `<output>.ok` sentinels in the working directory;
  a rerun skips every stage whose sentinel exists
* Delete a sentinel to force its stage to run again
* Helper tools are looked up in --util-dir, $ORFPICK_UTIL_DIR, ./util next to
  the executable, then PATH
* --retain-pfam-hits takes `hmmscan --domtblout` output
* --retain-blastp-hits takes `blastp -outfmt 6` output

Examples:
1. Default run:
   orfpick predict Trinity.fasta

2. With homology and domain evidence:
   orfpick predict Trinity.fasta --retain-pfam-hits pfam.domtblout --retain-blastp-hits blastp.outfmt6

3. Use your own training sequences and keep one ORF per transcript:
   orfpick predict Trinity.fasta --train known.cds --single-best-only

"###,
        )
        .arg(
            Arg::new("transcripts")
                .required(true)
                .index(1)
                .help("Transcripts FASTA file"),
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
            Arg::new("cpu")
                .long("cpu")
                .num_args(1)
                .default_value("2")
                .value_parser(value_parser!(usize))
                .help("Number of threads for cd-hit-est"),
        )
        .arg(
            Arg::new("train")
                .long("train")
                .num_args(1)
                .help("FASTA of coding sequences to train on; skips curation"),
        )
        .arg(
            Arg::new("top")
                .long("top")
                .short('T')
                .num_args(1)
                .default_value("500")
                .value_parser(value_parser!(usize))
                .help("Number of longest non-redundant ORFs to train on"),
        )
        .arg(
            Arg::new("genetic_code")
                .long("genetic-code")
                .short('G')
                .num_args(1)
                .default_value("universal")
                .help("Genetic code for translating peptides"),
        )
        .arg(
            Arg::new("single_best_only")
                .long("single-best-only")
                .action(ArgAction::SetTrue)
                .help("Keep only the best ORF per transcript"),
        )
        .arg(
            Arg::new("outdir")
                .long("output-dir")
                .short('O')
                .num_args(1)
                .default_value(".")
                .help("Directory holding the working directory and final outputs"),
        )
        .arg(
            Arg::new("util_dir")
                .long("util-dir")
                .num_args(1)
                .help("Directory of helper tools"),
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

    let opts = PredictOptions {
        transcripts: PathBuf::from(args.get_one::<String>("transcripts").unwrap()),
        output_dir: PathBuf::from(args.get_one::<String>("outdir").unwrap()),
        min_long_orf: *args.get_one::<usize>("retain_long_orfs").unwrap(),
        domain_hits: args.get_one::<String>("retain_pfam_hits").map(PathBuf::from),
        homology_hits: args.get_one::<String>("retain_blastp_hits").map(PathBuf::from),
        cpu: *args.get_one::<usize>("cpu").unwrap(),
        train: args.get_one::<String>("train").map(PathBuf::from),
        training_target: *args.get_one::<usize>("top").unwrap(),
        genetic_code: args.get_one::<String>("genetic_code").unwrap().to_string(),
        single_best_only: args.get_flag("single_best_only"),
    };

    let resolver = ToolResolver::discover(args.get_one::<String>("util_dir").map(|s| s.as_str()));

    //----------------------------
    // Operating
    //----------------------------
    let report = pipeline::run(&opts, resolver)?;
    log::info!(
        "{} ORFs selected, {} steps executed",
        report.selected,
        report.executed.len()
    );

    Ok(())
}
