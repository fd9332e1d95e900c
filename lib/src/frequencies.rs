//! Per-dataset character composition used as the null model for D2S.
//!
//! A frequency file looks like:
//!
//! ```text
//! A	0.3
//! C	0.2
//! G	0.2
//! T	0.3
//! NUM_SEQUENCES	10
//! NUM_CHARACTERS	1000
//! ```
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

use log::debug;

use crate::errors::{D2sError, D2sResult};
use crate::io::{open_reader, ColumnLines};
use crate::logging::LogHandle;

pub const NUM_SEQUENCES: &str = "NUM_SEQUENCES";
pub const NUM_CHARACTERS: &str = "NUM_CHARACTERS";

#[derive(Clone, Debug, PartialEq)]
pub struct CharFrequencyTable {
    probabilities: BTreeMap<char, f64>,
    num_sequences: u64,
    num_characters: u64,
}

fn malformed(line: usize, reason: String) -> D2sError {
    D2sError::MalformedFrequencyFile { line, reason }
}

/// Scalars are integers, but older composition files wrote `NUM_CHARACTERS`
/// as a float (e.g. `1000.0`), so integral decimals are accepted too.
fn parse_scalar(key: &str, value: &str, line: usize) -> D2sResult<u64> {
    if let Ok(v) = value.parse::<u64>() {
        return Ok(v);
    }
    match value.parse::<f64>() {
        Ok(v) if v >= 0. && v.fract() == 0. && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(malformed(
            line,
            format!("{} must be a non-negative integer, got {:?}", key, value),
        )),
    }
}

impl CharFrequencyTable {
    pub fn new(probabilities: BTreeMap<char, f64>, num_sequences: u64, num_characters: u64) -> Self {
        CharFrequencyTable {
            probabilities,
            num_sequences,
            num_characters,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P, log: LogHandle) -> D2sResult<Self> {
        let path = path.as_ref();
        if log.debug() {
            debug!("Loading frequencies from {}", path.display());
        }
        Self::from_reader(open_reader(path)?, log)
    }

    pub fn from_reader<R: BufRead>(reader: R, log: LogHandle) -> D2sResult<Self> {
        let mut probabilities = BTreeMap::new();
        let mut num_sequences = None;
        let mut num_characters = None;

        for line in ColumnLines::new(reader) {
            let (line_number, line) = line?;
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 2 {
                return Err(malformed(
                    line_number,
                    format!("expected 2 tab-separated fields, found {}", fields.len()),
                ));
            }
            let (key, value) = (fields[0], fields[1]);
            if log.debug() {
                debug!("{}:{}", key, value);
            }

            match key {
                NUM_SEQUENCES => num_sequences = Some(parse_scalar(key, value, line_number)?),
                NUM_CHARACTERS => num_characters = Some(parse_scalar(key, value, line_number)?),
                _ => {
                    let mut chars = key.chars();
                    let c = match (chars.next(), chars.next()) {
                        (Some(c), None) if c.is_ascii() => c,
                        _ => {
                            return Err(malformed(
                                line_number,
                                format!("{:?} is not a single character", key),
                            ))
                        }
                    };
                    let probability = value.parse::<f64>().map_err(|_| D2sError::Parse {
                        line: line_number,
                        reason: format!("probability for {} is not a number: {:?}", c, value),
                    })?;
                    probabilities.insert(c, probability);
                }
            }
        }

        let num_sequences = num_sequences
            .ok_or_else(|| malformed(0, format!("missing {} line", NUM_SEQUENCES)))?;
        let num_characters = num_characters
            .ok_or_else(|| malformed(0, format!("missing {} line", NUM_CHARACTERS)))?;

        Ok(CharFrequencyTable::new(
            probabilities,
            num_sequences,
            num_characters,
        ))
    }

    pub fn write_to(&self, writer: &mut dyn Write) -> D2sResult<()> {
        for (c, p) in &self.probabilities {
            writeln!(writer, "{}\t{}", c, p)?;
        }
        writeln!(writer, "{}\t{}", NUM_SEQUENCES, self.num_sequences)?;
        writeln!(writer, "{}\t{}", NUM_CHARACTERS, self.num_characters)?;
        Ok(())
    }

    pub fn probabilities(&self) -> &BTreeMap<char, f64> {
        &self.probabilities
    }

    pub fn num_sequences(&self) -> u64 {
        self.num_sequences
    }

    pub fn num_characters(&self) -> u64 {
        self.num_characters
    }

    pub fn probability(&self, c: char) -> Option<f64> {
        self.probabilities.get(&c).copied()
    }

    /// Probability of seeing `kmer` under an independent-character model.
    pub fn kmer_probability(&self, kmer: &str) -> D2sResult<f64> {
        kmer.chars().try_fold(1f64, |acc, c| {
            self.probability(c)
                .map(|p| acc * p)
                .ok_or(D2sError::UnknownCharacter(c))
        })
    }

    /// Number of k-mer start positions across every sequence of the dataset;
    /// each sequence loses `k - 1` positions at its end.
    pub fn total_possible_kmers(&self, k: usize) -> f64 {
        let lost = self.num_sequences as f64 * (k.saturating_sub(1)) as f64;
        self.num_characters as f64 - lost
    }
}
