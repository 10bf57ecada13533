use clap::*;
use orfpick::libs::curate;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("longest")
        .about("Extracts the longest FASTA records")
        .after_help(
            r###"
This command writes the N longest records of a FASTA file, longest first.
Records of equal length keep their input order. Sequences are written on one line.

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'
* The whole file is held in memory

Examples:
1. The 5000 longest candidate ORFs:
   orfpick longest longest_orfs.cds 5000 -o longest_orfs.cds.top_5000_longest

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input FASTA file to process"),
        )
        .arg(
            Arg::new("count")
                .required(true)
                .index(2)
                .value_parser(value_parser!(usize))
                .help("Number of records to keep"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    super::init_logger(false)?;

    let reader = orfpick::reader(args.get_one::<String>("infile").unwrap())?;
    let count = *args.get_one::<usize>("count").unwrap();
    let mut writer = orfpick::writer(args.get_one::<String>("outfile").unwrap())?;

    let records = curate::top_longest_records(reader, count)?;
    curate::write_records(&mut writer, &records)?;
    writer.flush()?;

    Ok(())
}
