use std::path::{Path, PathBuf};

use crate::libs::error::{PipelineError, Result};

/// Environment variable naming the directory of helper tools.
pub const UTIL_DIR_ENV: &str = "ORFPICK_UTIL_DIR";

/// External programs the pipeline delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Redundancy removal of nucleotide sequences
    Cluster,
    /// Builds the hexamer log-likelihood table from the training set
    Train,
    /// Scores every candidate in all six frames
    Score,
    /// Indexes structural annotations by transcript
    Index,
    /// Projects an accession list back to GFF3 records
    Project,
    /// Drops ORFs eclipsed by a longer one in another frame
    Eclipse,
    Bed,
    /// Emits peptide, CDS or transcript sequences from GFF3
    Proteins,
}

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::Cluster,
        Tool::Train,
        Tool::Score,
        Tool::Index,
        Tool::Project,
        Tool::Eclipse,
        Tool::Bed,
        Tool::Proteins,
    ];

    pub fn program(&self) -> &'static str {
        match self {
            Tool::Cluster => "cd-hit-est",
            Tool::Train => "seq_n_baseprobs_to_loglikelihood_vals.pl",
            Tool::Score => "score_CDS_likelihood_all_6_frames.pl",
            Tool::Index => "index_gff3_files_by_isoform.pl",
            Tool::Project => "gene_list_to_gff.pl",
            Tool::Eclipse => "remove_eclipsed_ORFs.pl",
            Tool::Bed => "gff3_file_to_bed.pl",
            Tool::Proteins => "gff3_file_to_proteins.pl",
        }
    }
}

/// Maps a [`Tool`] to an executable path.
///
/// A tool found in the util directory wins over one on `PATH`. Nothing here
/// touches the process environment.
#[derive(Debug, Clone, Default)]
pub struct ToolResolver {
    util_dir: Option<PathBuf>,
}

impl ToolResolver {
    pub fn new(util_dir: Option<PathBuf>) -> Self {
        Self { util_dir }
    }

    /// Util directory from, in order: `explicit`, `$ORFPICK_UTIL_DIR`, or a
    /// `util/` directory next to the running executable.
    pub fn discover(explicit: Option<&str>) -> Self {
        let util_dir = explicit
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(UTIL_DIR_ENV).map(PathBuf::from))
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|exe| exe.parent().map(|p| p.join("util")))
                    .filter(|p| p.is_dir())
            });

        Self { util_dir }
    }

    pub fn util_dir(&self) -> Option<&Path> {
        self.util_dir.as_deref()
    }

    pub fn resolve(&self, tool: Tool) -> Result<PathBuf> {
        let program = tool.program();

        if let Some(dir) = &self.util_dir {
            let candidate = dir.join(program);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        which::which(program).map_err(|_| {
            PipelineError::Precondition(format!(
                "required tool `{}` not found in {}PATH",
                program,
                self.util_dir
                    .as_ref()
                    .map(|d| format!("{} or ", d.display()))
                    .unwrap_or_default()
            ))
        })
    }

    /// Resolves every tool in `tools`, failing on the first missing one.
    pub fn resolve_all(&self, tools: &[Tool]) -> Result<Vec<(Tool, PathBuf)>> {
        tools
            .iter()
            .map(|&tool| self.resolve(tool).map(|path| (tool, path)))
            .collect()
    }
}
