use std::path::Path;

use log::{debug, error, info, warn};

use crate::errors::{D2sError, D2sResult};
use crate::frequencies::CharFrequencyTable;
use crate::io::check_file_exists;
use crate::kmers::{KmerRecord, KmerSource};
use crate::logging::LogHandle;
use crate::merge::{MergeMode, MergedPair, SortedSetMerger};
use crate::params::D2sParams;

/// One side of a comparison: a sorted kmer file and its composition.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub kmers: KmerSource,
    pub frequencies: CharFrequencyTable,
}

impl Dataset {
    pub fn new(kmers: KmerSource, frequencies: CharFrequencyTable) -> Self {
        Dataset { kmers, frequencies }
    }

    /// Loads the frequency table; both paths must exist before anything is read.
    pub fn from_paths<P, Q>(kmer_path: P, freq_path: Q, log: LogHandle) -> D2sResult<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        check_file_exists(&kmer_path)?;
        check_file_exists(&freq_path)?;
        let frequencies = CharFrequencyTable::from_path(freq_path, log)?;
        Ok(Dataset::new(KmerSource::new(kmer_path), frequencies))
    }

    pub fn name(&self) -> String {
        self.kmers.name()
    }
}

/// A shared kmer's contribution given its two centered counts.
///
/// When both centered counts are zero the term carries no information and
/// is defined as zero rather than 0/0.
pub fn contribution(centered_x: f64, centered_y: f64) -> f64 {
    if centered_x == 0. && centered_y == 0. {
        return 0.;
    }
    (centered_x * centered_y) / centered_x.hypot(centered_y)
}

/// Accumulates the raw D2S statistic over the kmers two datasets share.
pub struct D2sScorer<'a> {
    x: &'a CharFrequencyTable,
    y: &'a CharFrequencyTable,
    total_kmers_x: f64,
    total_kmers_y: f64,
    score: f64,
    shared_kmers: u64,
    log: LogHandle,
}

impl<'a> D2sScorer<'a> {
    pub fn new(
        x: &'a CharFrequencyTable,
        y: &'a CharFrequencyTable,
        k: usize,
        log: LogHandle,
    ) -> Self {
        let total_kmers_x = x.total_possible_kmers(k);
        let total_kmers_y = y.total_possible_kmers(k);
        if log.debug() {
            debug!(
                "kmerset1_NumKmers:{}\tkmerset2_NumKmers:{}",
                total_kmers_x, total_kmers_y
            );
        }
        D2sScorer {
            x,
            y,
            total_kmers_x,
            total_kmers_y,
            score: 0.,
            shared_kmers: 0,
            log,
        }
    }

    /// Folds in one shared kmer and returns its contribution.
    pub fn add(&mut self, left: &KmerRecord, right: &KmerRecord) -> D2sResult<f64> {
        let p_x = self.x.kmer_probability(&left.sequence)?;
        let p_y = self.y.kmer_probability(&right.sequence)?;
        let centered_x = left.count as f64 - self.total_kmers_x * p_x;
        let centered_y = right.count as f64 - self.total_kmers_y * p_y;
        let term = contribution(centered_x, centered_y);
        if self.log.debug() {
            debug!(
                "PwX:{}\tPwY:{}\tkmerScoreXBis:{}\tkmerScoreYBis:{}\td2Score:{}",
                p_x, p_y, centered_x, centered_y, term
            );
        }
        self.score += term;
        self.shared_kmers += 1;
        Ok(term)
    }

    /// Adds a merged pair; pairs missing a side are skipped.
    pub fn add_pair(&mut self, pair: &MergedPair) -> D2sResult<()> {
        if let (Some(left), Some(right)) = (&pair.left, &pair.right) {
            self.add(left, right)?;
        }
        Ok(())
    }

    pub fn score_pairs<I>(mut self, pairs: I) -> D2sResult<f64>
    where
        I: Iterator<Item = D2sResult<MergedPair>>,
    {
        for pair in pairs {
            self.add_pair(&pair?)?;
        }
        Ok(self.score())
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn shared_kmers(&self) -> u64 {
        self.shared_kmers
    }
}

/// Returns the common kmer length of both sources, `None` if either has no
/// kmers at all (there's nothing to score then).
pub fn check_kmer_lengths(
    x: &KmerSource,
    y: &KmerSource,
    log: LogHandle,
) -> D2sResult<Option<usize>> {
    match (x.kmer_length()?, y.kmer_length()?) {
        (Some(left_len), Some(right_len)) if left_len != right_len => {
            if log.enabled(log::Level::Error) {
                error!(
                    "Kmer sizes are different between the two datasets: {}:{}\t{}:{}",
                    x.name(),
                    left_len,
                    y.name(),
                    right_len
                );
            }
            Err(D2sError::KmerLengthMismatch {
                left: x.name(),
                left_len,
                right: y.name(),
                right_len,
            })
        }
        (Some(k), Some(_)) => Ok(Some(k)),
        _ => Ok(None),
    }
}

/// Raw D2S statistic between two prepared datasets for a known `k`.
///
/// Each call opens its own readers, so several calls can run at once.
pub fn score_with_k(
    x: &Dataset,
    y: &Dataset,
    k: usize,
    params: &D2sParams,
    log: LogHandle,
) -> D2sResult<f64> {
    let merger = SortedSetMerger::new(
        x.kmers.open(params.check_order)?,
        y.kmers.open(params.check_order)?,
        MergeMode::intersection(),
        log,
    )
    .report_interval(params.report_interval);
    let scorer = D2sScorer::new(&x.frequencies, &y.frequencies, k, log);
    scorer.score_pairs(merger)
}

/// Raw D2S statistic between two prepared datasets.
pub fn score_datasets(
    x: &Dataset,
    y: &Dataset,
    params: &D2sParams,
    log: LogHandle,
) -> D2sResult<f64> {
    match check_kmer_lengths(&x.kmers, &y.kmers, log)? {
        Some(k) => {
            if log.info() {
                info!("k-mer:{}", k);
            }
            score_with_k(x, y, k, params, log)
        }
        None => {
            if log.enabled(log::Level::Warn) {
                warn!("{} or {} has no kmers", x.name(), y.name());
            }
            Ok(0.)
        }
    }
}
