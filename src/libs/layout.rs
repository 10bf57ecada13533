use std::path::{Path, PathBuf};

use crate::libs::error::{PipelineError, Result};

/// Tag used in the working directory and final output names.
pub const PIPELINE: &str = "orfpick";

/// Every file a run reads or writes, derived once from the transcript file
/// name and the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub transcripts: PathBuf,
    pub basename: String,
    pub output_dir: PathBuf,
    pub workdir: PathBuf,

    // written upstream
    pub longest_cds: PathBuf,
    pub longest_gff3: PathBuf,
    pub longest_pep: PathBuf,
    pub base_freqs: PathBuf,

    pub hexamer_scores: PathBuf,
    pub cds_scores: PathBuf,
    pub selected: PathBuf,
    pub gff3_index: PathBuf,
    pub best_candidates_gff3: PathBuf,
    pub eclipsed_removed_gff3: PathBuf,

    pub final_gff3: PathBuf,
    pub final_bed: PathBuf,
    pub final_pep: PathBuf,
    pub final_cds: PathBuf,
    pub final_mrna: PathBuf,
}

impl RunLayout {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(transcripts: P, output_dir: Q) -> Result<Self> {
        let transcripts = transcripts.as_ref().to_path_buf();
        let basename = transcripts
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| {
                PipelineError::Precondition(format!(
                    "cannot derive a base name from {}",
                    transcripts.display()
                ))
            })?;

        let output_dir = output_dir.as_ref().to_path_buf();
        let workdir = output_dir.join(format!("{}.{}_dir", basename, PIPELINE));
        let in_work = |name: &str| workdir.join(name);
        let in_out = |ext: &str| output_dir.join(format!("{}.{}.{}", basename, PIPELINE, ext));

        let longest_cds = in_work("longest_orfs.cds");
        let longest_gff3 = in_work("longest_orfs.gff3");
        let longest_pep = in_work("longest_orfs.pep");
        let base_freqs = in_work("base_freqs.dat");
        let hexamer_scores = in_work("hexamer.scores");
        let cds_scores = in_work("longest_orfs.cds.scores");
        let selected = in_work("longest_orfs.cds.scores.selected");
        let gff3_index = with_suffix(&longest_gff3, ".inx");
        let best_candidates_gff3 = in_work("longest_orfs.cds.best_candidates.gff3");
        let eclipsed_removed_gff3 =
            in_work("longest_orfs.cds.best_candidates.eclipsed_removed.gff3");

        let final_gff3 = in_out("gff3");
        let final_bed = in_out("bed");
        let final_pep = in_out("pep");
        let final_cds = in_out("cds");
        let final_mrna = in_out("mRNA");

        Ok(Self {
            transcripts,
            basename,
            output_dir,
            workdir,
            longest_cds,
            longest_gff3,
            longest_pep,
            base_freqs,
            hexamer_scores,
            cds_scores,
            selected,
            gff3_index,
            best_candidates_gff3,
            eclipsed_removed_gff3,
            final_gff3,
            final_bed,
            final_pep,
            final_cds,
            final_mrna,
        })
    }

    /// The `n` longest candidates, before or after redundancy removal.
    pub fn top_longest(&self, n: usize) -> PathBuf {
        with_suffix(&self.longest_cds, &format!(".top_{}_longest", n))
    }

    /// Output of clustering `top_longest(n)`.
    pub fn top_longest_nr(&self, n: usize) -> PathBuf {
        with_suffix(&self.top_longest(n), ".nr80")
    }

    /// Fails unless the transcripts and everything the upstream stage writes
    /// into the working directory are present.
    pub fn check_inputs(&self) -> Result<()> {
        if !self.transcripts.is_file() {
            return Err(PipelineError::Precondition(format!(
                "transcript file not found: {}",
                self.transcripts.display()
            )));
        }
        if !self.workdir.is_dir() {
            return Err(PipelineError::Precondition(format!(
                "working directory {} not found; run the ORF enumeration stage first",
                self.workdir.display()
            )));
        }
        for path in [
            &self.longest_cds,
            &self.longest_gff3,
            &self.longest_pep,
            &self.base_freqs,
        ] {
            if !path.is_file() {
                return Err(PipelineError::Precondition(format!(
                    "required file not found: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_derived_paths() {
        let layout = RunLayout::new("data/Trinity.fasta", "out").unwrap();

        assert_eq!(layout.basename, "Trinity.fasta");
        assert_eq!(layout.workdir, Path::new("out/Trinity.fasta.orfpick_dir"));
        assert_eq!(
            layout.longest_cds,
            Path::new("out/Trinity.fasta.orfpick_dir/longest_orfs.cds")
        );
        assert_eq!(
            layout.gff3_index,
            Path::new("out/Trinity.fasta.orfpick_dir/longest_orfs.gff3.inx")
        );
        assert_eq!(
            layout.top_longest(5000),
            Path::new("out/Trinity.fasta.orfpick_dir/longest_orfs.cds.top_5000_longest")
        );
        assert_eq!(
            layout.top_longest_nr(5000),
            Path::new("out/Trinity.fasta.orfpick_dir/longest_orfs.cds.top_5000_longest.nr80")
        );
        assert_eq!(layout.final_gff3, Path::new("out/Trinity.fasta.orfpick.gff3"));
        assert_eq!(layout.final_mrna, Path::new("out/Trinity.fasta.orfpick.mRNA"));
    }

    #[test]
    fn test_check_inputs() {
        let dir = tempdir().unwrap();
        let transcripts = dir.path().join("t.fa");
        std::fs::write(&transcripts, ">t1\nACGT\n").unwrap();

        let layout = RunLayout::new(&transcripts, dir.path()).unwrap();
        let err = layout.check_inputs().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(err.to_string().contains("working directory"));

        std::fs::create_dir(&layout.workdir).unwrap();
        let err = layout.check_inputs().unwrap_err();
        assert!(err.to_string().contains("longest_orfs.cds"));

        for path in [
            &layout.longest_cds,
            &layout.longest_gff3,
            &layout.longest_pep,
            &layout.base_freqs,
        ] {
            std::fs::write(path, "").unwrap();
        }
        assert!(layout.check_inputs().is_ok());
    }
}
