//! The predict pipeline: training set, model, scoring, selection, and the
//! downstream conversions, in that order.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::libs::curate;
use crate::libs::error::{PipelineError, Result};
use crate::libs::evidence::Evidence;
use crate::libs::layout::RunLayout;
use crate::libs::select::{self, Selector};
use crate::libs::stage::{Checkpoint, StageRunner};
use crate::libs::tool::{Tool, ToolResolver};

pub const DEFAULT_TRAINING_TARGET: usize = 500;
pub const DEFAULT_CPU: usize = 2;
pub const DEFAULT_GENETIC_CODE: &str = "universal";

#[derive(Debug, Clone)]
pub struct PredictOptions {
    pub transcripts: PathBuf,
    pub output_dir: PathBuf,
    pub min_long_orf: usize,
    pub domain_hits: Option<PathBuf>,
    pub homology_hits: Option<PathBuf>,
    pub cpu: usize,
    pub train: Option<PathBuf>,
    pub training_target: usize,
    pub genetic_code: String,
    pub single_best_only: bool,
}

impl PredictOptions {
    pub fn new<P: Into<PathBuf>>(transcripts: P) -> Self {
        Self {
            transcripts: transcripts.into(),
            output_dir: PathBuf::from("."),
            min_long_orf: select::DEFAULT_MIN_LONG_ORF,
            domain_hits: None,
            homology_hits: None,
            cpu: DEFAULT_CPU,
            train: None,
            training_target: DEFAULT_TRAINING_TARGET,
            genetic_code: DEFAULT_GENETIC_CODE.to_string(),
            single_best_only: false,
        }
    }

    /// Tools this run will call.
    pub fn required_tools(&self) -> Vec<Tool> {
        Tool::ALL
            .into_iter()
            .filter(|t| *t != Tool::Cluster || self.train.is_none())
            .collect()
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct PredictReport {
    pub layout: RunLayout,
    pub selected: usize,
    /// Names of the stages that executed, in order
    pub executed: Vec<String>,
}

/// Checks every precondition before any stage runs.
pub fn preflight(opts: &PredictOptions, resolver: &ToolResolver) -> Result<RunLayout> {
    if opts.training_target == 0 {
        return Err(PipelineError::Precondition(
            "training set size must be at least 1".to_string(),
        ));
    }
    curate::pool_size(opts.training_target)?;

    let layout = RunLayout::new(&opts.transcripts, &opts.output_dir)?;
    layout.check_inputs()?;

    if let Some(train) = &opts.train {
        curate::check_training_override(train)?;
    }
    for (what, path) in [
        ("domain hits", &opts.domain_hits),
        ("homology hits", &opts.homology_hits),
    ] {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(PipelineError::Precondition(format!(
                    "{} file not found: {}",
                    what,
                    path.display()
                )));
            }
        }
    }

    resolver.resolve_all(&opts.required_tools())?;

    Ok(layout)
}

pub fn run(opts: &PredictOptions, resolver: ToolResolver) -> Result<PredictReport> {
    let layout = preflight(opts, &resolver)?;
    info!("==> Paths");
    info!("    \"transcripts\" = {}", layout.transcripts.display());
    info!("    \"workdir\"     = {}", layout.workdir.display());
    if let Some(dir) = resolver.util_dir() {
        info!("    \"util\"        = {}", dir.display());
    }

    let mut runner = StageRunner::new(resolver);

    //----------------------------
    // Model
    //----------------------------
    let train = curate::resolve_training_set(
        &mut runner,
        &layout,
        opts.train.as_deref(),
        opts.training_target,
        opts.cpu,
    )?;

    let trainer = runner
        .command(Tool::Train)?
        .arg(&train)
        .arg(&layout.base_freqs)
        .stdout_to(&layout.hexamer_scores);
    runner.run_stage(
        "train model",
        &Checkpoint::for_output(&layout.hexamer_scores),
        || trainer.run("train model"),
    )?;

    let scorer = runner
        .command(Tool::Score)?
        .arg(&layout.longest_cds)
        .arg(&layout.hexamer_scores)
        .stdout_to(&layout.cds_scores);
    runner.run_stage(
        "score candidates",
        &Checkpoint::for_output(&layout.cds_scores),
        || scorer.run("score candidates"),
    )?;

    //----------------------------
    // Selection
    //----------------------------
    let evidence = runner.run_step("load evidence", || {
        Evidence::load(opts.domain_hits.as_deref(), opts.homology_hits.as_deref())
    })?;
    if opts.domain_hits.is_some() {
        info!("    {} accessions with domain hits", evidence.domain.len());
    }
    if opts.homology_hits.is_some() {
        info!("    {} accessions with homology hits", evidence.homology.len());
    }

    let selected = runner.run_step("select candidates", || {
        let rows = select::load_scores(&layout.cds_scores)?;
        let accessions = Selector::new(&evidence, opts.min_long_orf)
            .single_best_only(opts.single_best_only)
            .select_accessions(&rows);
        write_accessions(&layout.selected, &accessions)?;
        info!("    {} of {} candidates retained", accessions.len(), rows.len());
        Ok(accessions.len())
    })?;

    //----------------------------
    // Downstream
    //----------------------------
    let index = runner.command(Tool::Index)?.arg(&layout.longest_gff3);
    runner.run_step("index annotations", || index.run("index annotations"))?;

    let project = runner
        .command(Tool::Project)?
        .arg(&layout.selected)
        .arg(&layout.gff3_index)
        .stdout_to(&layout.best_candidates_gff3);
    runner.run_step("project selection", || project.run("project selection"))?;

    let eclipse = runner
        .command(Tool::Eclipse)?
        .arg(&layout.best_candidates_gff3)
        .stdout_to(&layout.eclipsed_removed_gff3);
    runner.run_step("remove eclipsed", || eclipse.run("remove eclipsed"))?;

    runner.run_step("write gff3", || {
        std::fs::copy(&layout.eclipsed_removed_gff3, &layout.final_gff3)
            .map(|_| ())
            .map_err(|e| PipelineError::io(&layout.final_gff3, e))
    })?;

    let bed = runner
        .command(Tool::Bed)?
        .arg(&layout.final_gff3)
        .stdout_to(&layout.final_bed);
    runner.run_step("write bed", || bed.run("write bed"))?;

    for (seq_type, dest, stage) in [
        ("prot", &layout.final_pep, "write peptides"),
        ("CDS", &layout.final_cds, "write cds"),
        ("cDNA", &layout.final_mrna, "write mRNA"),
    ] {
        let emit = runner
            .command(Tool::Proteins)?
            .arg("--gff3")
            .arg(&layout.final_gff3)
            .arg("--fasta")
            .arg(&layout.transcripts)
            .args(["--seqType", seq_type, "--genetic_code", opts.genetic_code.as_str()])
            .stdout_to(dest);
        runner.run_step(stage, || emit.run(stage))?;
    }

    info!("==> Done, outputs at {}.{}.*", layout.basename, crate::libs::layout::PIPELINE);

    let executed = runner.executed().into_iter().map(String::from).collect();
    Ok(PredictReport {
        layout,
        selected,
        executed,
    })
}

/// One accession per line.
pub fn write_accessions(path: &Path, accessions: &[String]) -> Result<()> {
    let io_err = |e| PipelineError::io(path, e);

    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut writer = std::io::BufWriter::new(file);
    for acc in accessions {
        writeln!(writer, "{}", acc).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::error::ErrorKind;
    use tempfile::tempdir;

    fn upstream(dir: &Path) -> PredictOptions {
        let transcripts = dir.join("t.fa");
        std::fs::write(&transcripts, ">t1\nATGAAATAA\n").unwrap();
        let opts = PredictOptions {
            output_dir: dir.to_path_buf(),
            ..PredictOptions::new(&transcripts)
        };

        let layout = RunLayout::new(&opts.transcripts, &opts.output_dir).unwrap();
        std::fs::create_dir(&layout.workdir).unwrap();
        for path in [
            &layout.longest_cds,
            &layout.longest_gff3,
            &layout.longest_pep,
            &layout.base_freqs,
        ] {
            std::fs::write(path, "x\n").unwrap();
        }
        opts
    }

    #[test]
    fn test_required_tools() {
        let mut opts = PredictOptions::new("t.fa");
        assert!(opts.required_tools().contains(&Tool::Cluster));

        opts.train = Some(PathBuf::from("train.cds"));
        assert!(!opts.required_tools().contains(&Tool::Cluster));
        assert_eq!(opts.required_tools().len(), Tool::ALL.len() - 1);
    }

    #[test]
    fn test_preflight_missing_workdir() {
        let dir = tempdir().unwrap();
        let transcripts = dir.path().join("t.fa");
        std::fs::write(&transcripts, ">t1\nATG\n").unwrap();
        let opts = PredictOptions {
            output_dir: dir.path().to_path_buf(),
            ..PredictOptions::new(&transcripts)
        };

        let err = preflight(&opts, &ToolResolver::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(err.to_string().contains("t.fa.orfpick_dir"));
    }

    #[test]
    fn test_preflight_missing_evidence_and_tools() {
        let dir = tempdir().unwrap();
        let util = tempdir().unwrap();
        let resolver = ToolResolver::new(Some(util.path().to_path_buf()));

        let mut opts = upstream(dir.path());
        opts.homology_hits = Some(dir.path().join("blastp.outfmt6"));
        let err = preflight(&opts, &resolver).unwrap_err();
        assert!(err.to_string().contains("homology hits file not found"));

        opts.homology_hits = None;
        opts.train = Some(dir.path().join("missing.cds"));
        let err = preflight(&opts, &resolver).unwrap_err();
        assert!(err.to_string().contains("missing.cds"));
    }

    #[test]
    fn test_preflight_training_target() {
        let dir = tempdir().unwrap();
        let opts = upstream(dir.path());

        for target in [0, usize::MAX] {
            let opts = PredictOptions {
                training_target: target,
                ..opts.clone()
            };
            let err = preflight(&opts, &ToolResolver::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Precondition);
        }
    }

    #[test]
    fn test_write_accessions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected");
        write_accessions(&path, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");

        write_accessions(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
