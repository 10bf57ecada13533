//! Picks the positive training examples for the coding model.
//!
//! Redundancy removal is the expensive part, so it only sees a pool of the
//! `10 * T` longest candidates. The `T` longest survivors become the training
//! set.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::libs::error::{PipelineError, Result};
use crate::libs::layout::RunLayout;
use crate::libs::stage::{Checkpoint, StageRunner};
use crate::libs::tool::Tool;

/// Size of the pre-filtered pool, as a multiple of the training target.
pub const POOL_FACTOR: usize = 10;

/// Sequence identity at which `cd-hit-est` merges candidates.
pub const CLUSTER_IDENTITY: &str = "0.80";

/// Reads every record and returns the `n` longest, longest first.
/// Records of equal length keep their input order.
pub fn top_longest_records<R: BufRead>(reader: R, n: usize) -> std::io::Result<Vec<noodles_fasta::Record>> {
    let mut fa_in = noodles_fasta::io::Reader::new(reader);

    let mut records = vec![];
    for result in fa_in.records() {
        records.push(result?);
    }

    // sort_by is stable
    records.sort_by(|a, b| b.sequence().len().cmp(&a.sequence().len()));
    records.truncate(n);

    Ok(records)
}

pub fn write_records<W: Write>(writer: W, records: &[noodles_fasta::Record]) -> std::io::Result<()> {
    let mut fa_out = noodles_fasta::io::writer::Builder::default()
        .set_line_base_count(usize::MAX)
        .build_from_writer(writer);

    for record in records {
        fa_out.write_record(record)?;
    }

    Ok(())
}

/// Writes the `n` longest records of `infile` to `outfile`; returns how many
/// were written.
pub fn write_top_longest(infile: &Path, outfile: &Path, n: usize) -> Result<usize> {
    let reader = crate::reader(&infile.to_string_lossy()).map_err(|e| {
        PipelineError::Precondition(format!("{:#}", e))
    })?;
    let records = top_longest_records(reader, n).map_err(|e| PipelineError::io(infile, e))?;

    let file = std::fs::File::create(outfile).map_err(|e| PipelineError::io(outfile, e))?;
    let mut writer = std::io::BufWriter::new(file);
    write_records(&mut writer, &records).map_err(|e| PipelineError::io(outfile, e))?;
    writer.flush().map_err(|e| PipelineError::io(outfile, e))?;

    Ok(records.len())
}

/// Number of candidates handed to redundancy removal for a training target.
pub fn pool_size(target: usize) -> Result<usize> {
    target.checked_mul(POOL_FACTOR).ok_or_else(|| {
        PipelineError::Precondition(format!("training set size {} is too large", target))
    })
}

/// A user-supplied training file must exist, hold something and be readable.
pub fn check_training_override(path: &Path) -> Result<()> {
    if !crate::libs::io::is_nonempty_file(path) {
        return Err(PipelineError::Precondition(format!(
            "training file {} is missing or empty",
            path.display()
        )));
    }
    std::fs::File::open(path).map_err(|e| {
        PipelineError::Precondition(format!(
            "training file {} is not readable: {}",
            path.display(),
            e
        ))
    })?;
    Ok(())
}

/// Returns the training file, building it as one checkpointed stage unless
/// `user_train` overrides it.
pub fn resolve_training_set(
    runner: &mut StageRunner,
    layout: &RunLayout,
    user_train: Option<&Path>,
    target: usize,
    cpu: usize,
) -> Result<PathBuf> {
    if let Some(path) = user_train {
        check_training_override(path)?;
        info!("==> training set: using {}", path.display());
        return Ok(path.to_path_buf());
    }

    let pool_size = pool_size(target)?;
    let pool = layout.top_longest(pool_size);
    let pool_nr = layout.top_longest_nr(pool_size);
    let train = layout.top_longest(target);

    let cluster = runner
        .command(Tool::Cluster)?
        .args(["-r", "1", "-i"])
        .arg(&pool)
        .args(["-c", CLUSTER_IDENTITY, "-o"])
        .arg(&pool_nr)
        .args(["-M", "0", "-T"])
        .arg(cpu.to_string());

    let checkpoint = Checkpoint::for_output(&train);
    runner.run_stage("training set", &checkpoint, || {
        let pooled = write_top_longest(&layout.longest_cds, &pool, pool_size)?;
        if pooled == 0 {
            return Err(PipelineError::Precondition(format!(
                "no candidate ORFs in {}",
                layout.longest_cds.display()
            )));
        }
        info!("    {} candidates in the length pool", pooled);

        cluster.run("training set")?;

        let kept = write_top_longest(&pool_nr, &train, target)?;
        info!("    {} non-redundant candidates kept for training", kept);
        Ok(())
    })?;

    Ok(train)
}
