//! Accession sets from external search reports.
//!
//! Evidence is advisory: rows that lack the accession column are skipped.
//! A report that was asked for but cannot be read is an error.

use std::io::BufRead;
use std::path::Path;

use indexmap::IndexSet;

use crate::libs::error::{PipelineError, Result};

/// Zero-based column of the query name in an `hmmscan --domtblout` table
/// (HMMER 3.x: target name, target accession, tlen, query name, ...).
pub const DOMTBLOUT_QUERY_COLUMN: usize = 3;

/// Zero-based column of the query id in BLAST tabular output (`-outfmt 6`).
pub const OUTFMT6_QUERY_COLUMN: usize = 0;

/// Accessions with at least one supporting hit, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceSet {
    accessions: IndexSet<String>,
}

impl EvidenceSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, accession: &str) -> bool {
        self.accessions.insert(accession.to_string())
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.accessions.contains(accession)
    }

    pub fn len(&self) -> usize {
        self.accessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.accessions.iter().map(|s| s.as_str())
    }
}

impl<S: AsRef<str>> FromIterator<S> for EvidenceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = EvidenceSet::new();
        for acc in iter {
            set.insert(acc.as_ref());
        }
        set
    }
}

/// Domain hits: `#` comments skipped, fields split on whitespace.
pub fn parse_domtblout<R: BufRead>(reader: R) -> std::io::Result<EvidenceSet> {
    let mut set = EvidenceSet::new();
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') {
            continue;
        }
        if let Some(acc) = line.split_whitespace().nth(DOMTBLOUT_QUERY_COLUMN) {
            set.insert(acc);
        }
    }
    Ok(set)
}

/// Homology hits: tab-separated, accession in the first field.
pub fn parse_outfmt6<R: BufRead>(reader: R) -> std::io::Result<EvidenceSet> {
    let mut set = EvidenceSet::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(acc) = line
            .split('\t')
            .nth(OUTFMT6_QUERY_COLUMN)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            set.insert(acc);
        }
    }
    Ok(set)
}

fn load_with<F>(path: &Path, what: &str, parse: F) -> Result<EvidenceSet>
where
    F: FnOnce(Box<dyn BufRead>) -> std::io::Result<EvidenceSet>,
{
    if !path.is_file() {
        return Err(PipelineError::Precondition(format!(
            "{} file not found: {}",
            what,
            path.display()
        )));
    }
    let reader = crate::reader(&path.to_string_lossy())
        .map_err(|e| PipelineError::Precondition(format!("{:#}", e)))?;
    parse(reader).map_err(|e| PipelineError::io(path, e))
}

pub fn load_domain_hits(path: &Path) -> Result<EvidenceSet> {
    load_with(path, "domain hits", parse_domtblout)
}

pub fn load_homology_hits(path: &Path) -> Result<EvidenceSet> {
    load_with(path, "homology hits", parse_outfmt6)
}

/// Both evidence sets; an unconfigured source yields an empty set.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub domain: EvidenceSet,
    pub homology: EvidenceSet,
}

impl Evidence {
    pub fn load(domain: Option<&Path>, homology: Option<&Path>) -> Result<Self> {
        let domain = match domain {
            Some(path) => load_domain_hits(path)?,
            None => EvidenceSet::new(),
        };
        let homology = match homology {
            Some(path) => load_homology_hits(path)?,
            None => EvidenceSet::new(),
        };

        Ok(Self { domain, homology })
    }
}
