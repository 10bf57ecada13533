//! Keeps or drops each scored candidate.
//!
//! A candidate is retained when it has a domain hit, a homology hit, is at
//! least `min_long_orf` nt long, or when its own-frame score is positive and
//! beats every other frame.

use std::io::BufRead;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use crate::libs::error::{PipelineError, Result};
use crate::libs::evidence::Evidence;

pub const DEFAULT_MIN_LONG_ORF: usize = 900;

/// One row of the six-frame scores table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub accession: String,
    pub length: usize,
    /// Never empty; `scores[0]` is the candidate's own frame
    scores: Vec<f64>,
}

impl ScoreRow {
    pub fn new<S: Into<String>>(
        accession: S,
        length: usize,
        scores: Vec<f64>,
    ) -> std::result::Result<Self, String> {
        if scores.is_empty() {
            return Err("expected at least one score".to_string());
        }
        Ok(Self {
            accession: accession.into(),
            length,
            scores,
        })
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn own_score(&self) -> f64 {
        self.scores[0]
    }

    /// Best score among the competing frames, if any were given.
    pub fn best_other(&self) -> Option<f64> {
        self.scores[1..].iter().copied().reduce(f64::max)
    }

    /// Own frame is positive and strictly better than all other frames.
    pub fn own_frame_wins(&self) -> bool {
        let own = self.own_score();
        own > 0.0 && self.best_other().map_or(true, |other| own > other)
    }
}

impl std::str::FromStr for ScoreRow {
    type Err = String;

    /// `accession length score_1 [score_2 ...]`, split on whitespace.
    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(format!(
                "expected accession, length and at least one score, got {} field(s)",
                fields.len()
            ));
        }

        let length = fields[1]
            .parse::<usize>()
            .map_err(|_| format!("invalid ORF length `{}`", fields[1]))?;
        let scores = fields[2..]
            .iter()
            .map(|s| s.parse::<f64>().map_err(|_| format!("invalid score `{}`", s)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        ScoreRow::new(fields[0], length, scores)
    }
}

/// Parses a scores table; `#` lines and blank lines are skipped. `source`
/// only labels errors.
pub fn parse_scores<R: BufRead>(reader: R, source: &Path) -> Result<Vec<ScoreRow>> {
    let mut rows = vec![];
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| PipelineError::io(source, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let row = trimmed
            .parse::<ScoreRow>()
            .map_err(|msg| PipelineError::parse(source, idx + 1, msg))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_scores(path: &Path) -> Result<Vec<ScoreRow>> {
    let reader = crate::reader(&path.to_string_lossy())
        .map_err(|e| PipelineError::Precondition(format!("{:#}", e)))?;
    parse_scores(reader, path)
}

/// Why a candidate was retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    DomainHit,
    HomologyHit,
    LongOrf,
    CodingScore,
}

impl Retention {
    pub fn is_evidence(&self) -> bool {
        matches!(self, Retention::DomainHit | Retention::HomologyHit)
    }
}

#[derive(Debug, Clone)]
pub struct Selector<'a> {
    pub evidence: &'a Evidence,
    pub min_long_orf: usize,
    pub single_best_only: bool,
}

impl<'a> Selector<'a> {
    pub fn new(evidence: &'a Evidence, min_long_orf: usize) -> Self {
        Self {
            evidence,
            min_long_orf,
            single_best_only: false,
        }
    }

    pub fn single_best_only(mut self, flag: bool) -> Self {
        self.single_best_only = flag;
        self
    }

    /// `None` means rejected.
    pub fn decide(&self, row: &ScoreRow) -> Option<Retention> {
        if self.evidence.domain.contains(&row.accession) {
            Some(Retention::DomainHit)
        } else if self.evidence.homology.contains(&row.accession) {
            Some(Retention::HomologyHit)
        } else if row.length >= self.min_long_orf {
            Some(Retention::LongOrf)
        } else if row.own_frame_wins() {
            Some(Retention::CodingScore)
        } else {
            None
        }
    }

    /// Retained rows in input order.
    pub fn select<'r>(&self, rows: &'r [ScoreRow]) -> Vec<(&'r ScoreRow, Retention)> {
        let mut kept = vec![];
        for row in rows {
            if let Some(reason) = self.decide(row) {
                match reason {
                    Retention::DomainHit => debug!("{} retained by domain hit", row.accession),
                    Retention::HomologyHit => debug!("{} retained by homology hit", row.accession),
                    _ => {}
                }
                kept.push((row, reason));
            }
        }

        if self.single_best_only {
            kept = single_best_per_transcript(kept);
        }

        kept
    }

    pub fn select_accessions(&self, rows: &[ScoreRow]) -> Vec<String> {
        self.select(rows)
            .into_iter()
            .map(|(row, _)| row.accession.clone())
            .collect()
    }
}

/// Transcript an ORF accession belongs to: `comp12_c0_seq1.p3` -> `comp12_c0_seq1`.
pub fn transcript_of(accession: &str) -> &str {
    match accession.rfind(".p") {
        Some(pos)
            if pos + 2 < accession.len()
                && accession[pos + 2..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &accession[..pos]
        }
        _ => accession,
    }
}

/// One winner per transcript: evidence first, then length, then own-frame
/// score, then input order. Survivors stay in input order.
fn single_best_per_transcript<'r>(
    kept: Vec<(&'r ScoreRow, Retention)>,
) -> Vec<(&'r ScoreRow, Retention)> {
    let mut best_of: IndexMap<&str, usize> = IndexMap::new();
    for (idx, (row, reason)) in kept.iter().enumerate() {
        let transcript = transcript_of(&row.accession);
        match best_of.get(transcript) {
            Some(&cur) => {
                let (cur_row, cur_reason) = kept[cur];
                let better = (reason.is_evidence(), row.length)
                    > (cur_reason.is_evidence(), cur_row.length)
                    || ((reason.is_evidence(), row.length)
                        == (cur_reason.is_evidence(), cur_row.length)
                        && row.own_score() > cur_row.own_score());
                if better {
                    best_of.insert(transcript, idx);
                }
            }
            None => {
                best_of.insert(transcript, idx);
            }
        }
    }

    best_of
        .values()
        .copied()
        .sorted()
        .map(|idx| kept[idx])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::evidence::EvidenceSet;
    use approx::assert_relative_eq;

    fn row(line: &str) -> ScoreRow {
        line.parse().unwrap()
    }

    #[test]
    fn test_parse_row() {
        let r = row("ORF.3  450  -2.1  5.0  1.0  0.2  -1.0  0.4");
        assert_eq!(r.accession, "ORF.3");
        assert_eq!(r.length, 450);
        assert_eq!(r.scores().len(), 6);
        assert_relative_eq!(r.own_score(), -2.1);
        assert_relative_eq!(r.best_other().unwrap(), 5.0);

        assert!("ORF.3 450".parse::<ScoreRow>().is_err());
        assert!("ORF.3 long 1.0".parse::<ScoreRow>().is_err());
        assert!("ORF.3 450 1.0 x".parse::<ScoreRow>().is_err());

        // a row always carries its own-frame score
        assert!(ScoreRow::new("ORF.3", 450, vec![]).is_err());
        let r = ScoreRow::new("ORF.3", 450, vec![0.5]).unwrap();
        assert!(r.own_frame_wins());
    }

    #[test]
    fn test_parse_scores_skips_comments() {
        let input = "#acc\tlen\tscores\n\nORF.1\t300\t1.0\t0.5\nORF.2\t600\t-1\t2\n";
        let rows = parse_scores(input.as_bytes(), Path::new("t.scores")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].accession, "ORF.2");

        let err = parse_scores("ORF.1 300 1.0\nORF.2 abc 1.0\n".as_bytes(), Path::new("t.scores"))
            .unwrap_err();
        assert_eq!(err.to_string(), "t.scores:2: invalid ORF length `abc`");
    }

    #[test]
    fn test_rejected_by_competing_frame() {
        let evidence = Evidence::default();
        let selector = Selector::new(&evidence, 900);

        let r = row("ORF.3  450  -2.1  5.0  1.0  0.2  -1.0  0.4");
        assert_eq!(selector.decide(&r), None);
    }

    #[test]
    fn test_long_orf_rule() {
        let evidence = Evidence::default();
        let selector = Selector::new(&evidence, 900);

        let r = row("ORF.3  950  -2.1  5.0  1.0  0.2  -1.0  0.4");
        assert_eq!(selector.decide(&r), Some(Retention::LongOrf));

        // the threshold itself counts as long
        let r = row("ORF.3  900  -2.1  5.0  1.0  0.2  -1.0  0.4");
        assert_eq!(selector.decide(&r), Some(Retention::LongOrf));
    }

    #[test]
    fn test_coding_score_rule() {
        let evidence = Evidence::default();
        let selector = Selector::new(&evidence, 900);

        let r = row("ORF.7  300  3.0  1.0  0.5  -0.2  0.1  0.0");
        assert_eq!(selector.decide(&r), Some(Retention::CodingScore));

        // ties with another frame do not win
        assert_eq!(selector.decide(&row("ORF.7 300 1.0 1.0 0 0 0 0")), None);
        // positive but not the best
        assert_eq!(selector.decide(&row("ORF.7 300 1.0 1.5 0 0 0 0")), None);
        // best but not positive
        assert_eq!(selector.decide(&row("ORF.7 300 0.0 -1 -1 -1 -1 -1")), None);
        // no competing frames
        assert_eq!(
            selector.decide(&row("ORF.7 300 0.5")),
            Some(Retention::CodingScore)
        );
    }

    #[test]
    fn test_evidence_rules() {
        let evidence = Evidence {
            domain: ["ORF.4"].into_iter().collect::<EvidenceSet>(),
            homology: ["ORF.9"].into_iter().collect::<EvidenceSet>(),
        };
        let selector = Selector::new(&evidence, 900);

        assert_eq!(
            selector.decide(&row("ORF.9 120 -5 1 1 1 1 1")),
            Some(Retention::HomologyHit)
        );
        assert_eq!(
            selector.decide(&row("ORF.4 120 -5 1 1 1 1 1")),
            Some(Retention::DomainHit)
        );
        assert_eq!(selector.decide(&row("ORF.5 120 -5 1 1 1 1 1")), None);
    }

    #[test]
    fn test_select_keeps_input_order() {
        let evidence = Evidence {
            domain: EvidenceSet::new(),
            homology: ["c.p1"].into_iter().collect::<EvidenceSet>(),
        };
        let rows = vec![
            row("z.p1 300 3.0 1.0 0 0 0 0"),
            row("a.p1 300 -3.0 1.0 0 0 0 0"),
            row("c.p1 120 -5 1 1 1 1 1"),
            row("b.p1 1200 -5 1 1 1 1 1"),
        ];
        let selector = Selector::new(&evidence, 900);
        assert_eq!(selector.select_accessions(&rows), vec!["z.p1", "c.p1", "b.p1"]);
    }

    #[test]
    fn test_rule_holds_for_every_row() {
        let evidence = Evidence {
            domain: ["r3"].into_iter().collect::<EvidenceSet>(),
            homology: ["r5"].into_iter().collect::<EvidenceSet>(),
        };
        let selector = Selector::new(&evidence, 500);

        let mut rows = vec![];
        for i in 0..40usize {
            let own = (i as f64 % 7.0) - 3.0;
            let other = (i as f64 % 5.0) - 2.0;
            rows.push(
                ScoreRow::new(
                    format!("r{}", i),
                    100 + i * 23,
                    vec![own, other, other - 1.0, -4.0, 0.0, other / 2.0],
                )
                .unwrap(),
            );
        }

        let kept = selector.select_accessions(&rows);
        for r in &rows {
            let max_other = r.scores()[1..].iter().cloned().fold(f64::MIN, f64::max);
            let expected = r.accession == "r3"
                || r.accession == "r5"
                || r.length >= 500
                || (r.scores()[0] > 0.0 && r.scores()[0] > max_other);
            assert_eq!(kept.contains(&r.accession), expected, "{}", r.accession);
        }

        // independent of row order
        let mut reversed = rows.clone();
        reversed.reverse();
        let mut kept_rev = selector.select_accessions(&reversed);
        kept_rev.reverse();
        assert_eq!(kept, kept_rev);
    }

    #[test]
    fn test_transcript_of() {
        assert_eq!(transcript_of("comp12_c0_seq1.p3"), "comp12_c0_seq1");
        assert_eq!(transcript_of("gene.px"), "gene.px");
        assert_eq!(transcript_of("ORF.7"), "ORF.7");
        assert_eq!(transcript_of("tx.p"), "tx.p");
    }

    #[test]
    fn test_single_best_only() {
        let evidence = Evidence {
            domain: ["t2.p2"].into_iter().collect::<EvidenceSet>(),
            homology: EvidenceSet::new(),
        };
        let rows = vec![
            row("t1.p1 300 3.0 1 0 0 0 0"),
            row("t1.p2 600 2.0 1 0 0 0 0"),
            row("t2.p1 1500 -1 1 0 0 0 0"),
            row("t2.p2 150 -1 1 0 0 0 0"),
            row("t3.p1 300 2.0 1 0 0 0 0"),
            row("t3.p2 300 4.0 1 0 0 0 0"),
        ];
        let selector = Selector::new(&evidence, 900).single_best_only(true);
        assert_eq!(
            selector.select_accessions(&rows),
            vec!["t1.p2", "t2.p2", "t3.p2"]
        );
    }
}
