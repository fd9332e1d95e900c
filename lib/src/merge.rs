use std::cmp::Ordering;

use log::{debug, info};

use crate::errors::D2sResult;
use crate::kmers::{KmerKey, KmerRecord};
use crate::logging::LogHandle;

pub const DEFAULT_REPORT_INTERVAL: u64 = 10_000_000;

/// Which kinds of merged pairs the merger hands back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeMode {
    pub emit_both: bool,
    pub emit_left_only: bool,
    pub emit_right_only: bool,
}

impl MergeMode {
    pub fn intersection() -> Self {
        MergeMode {
            emit_both: true,
            emit_left_only: false,
            emit_right_only: false,
        }
    }

    pub fn left_only() -> Self {
        MergeMode {
            emit_both: false,
            emit_left_only: true,
            emit_right_only: false,
        }
    }

    pub fn right_only() -> Self {
        MergeMode {
            emit_both: false,
            emit_left_only: false,
            emit_right_only: true,
        }
    }

    pub fn union() -> Self {
        MergeMode {
            emit_both: true,
            emit_left_only: true,
            emit_right_only: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedPair {
    pub left: Option<KmerRecord>,
    pub right: Option<KmerRecord>,
}

impl MergedPair {
    pub fn key(&self) -> Option<KmerKey> {
        self.left
            .as_ref()
            .or_else(|| self.right.as_ref())
            .map(|r| r.key)
    }

    pub fn is_shared(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

struct MergeCursor<I> {
    records: I,
    current: Option<KmerRecord>,
    exhausted: bool,
}

impl<I> MergeCursor<I>
where
    I: Iterator<Item = D2sResult<KmerRecord>>,
{
    fn new(records: I) -> Self {
        MergeCursor {
            records,
            current: None,
            exhausted: false,
        }
    }

    /// Replaces the current record with the next one from the stream and
    /// returns the record that was current.
    fn advance(&mut self) -> D2sResult<Option<KmerRecord>> {
        let previous = self.current.take();
        if !self.exhausted {
            match self.records.next() {
                Some(record) => self.current = Some(record?),
                None => self.exhausted = true,
            }
        }
        Ok(previous)
    }
}

/// Merge-joins two kmer streams sorted ascending by key.
///
/// Both inputs must be sorted; if they aren't, shared kmers are silently
/// missed (use `KmerReader::check_order` to catch that).
pub struct SortedSetMerger<L, R>
where
    L: Iterator<Item = D2sResult<KmerRecord>>,
    R: Iterator<Item = D2sResult<KmerRecord>>,
{
    left: MergeCursor<L>,
    right: MergeCursor<R>,
    mode: MergeMode,
    primed: bool,
    failed: bool,
    steps: u64,
    report_interval: u64,
    log: LogHandle,
}

impl<L, R> SortedSetMerger<L, R>
where
    L: Iterator<Item = D2sResult<KmerRecord>>,
    R: Iterator<Item = D2sResult<KmerRecord>>,
{
    pub fn new(left: L, right: R, mode: MergeMode, log: LogHandle) -> Self {
        SortedSetMerger {
            left: MergeCursor::new(left),
            right: MergeCursor::new(right),
            mode,
            primed: false,
            failed: false,
            steps: 0,
            report_interval: DEFAULT_REPORT_INTERVAL,
            log,
        }
    }

    pub fn report_interval(mut self, interval: u64) -> Self {
        self.report_interval = interval;
        self
    }

    /// Number of merge steps taken so far (emitted or not).
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn step(&mut self) -> D2sResult<Option<(MergedPair, bool)>> {
        if !self.primed {
            self.left.advance()?;
            self.right.advance()?;
            self.primed = true;
        }

        let order = match (&self.left.current, &self.right.current) {
            (None, None) => return Ok(None),
            (Some(l), Some(r)) => l.key.cmp(&r.key),
            // an exhausted side sorts after everything still live
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
        };

        let (pair, emit) = match order {
            Ordering::Equal => (
                MergedPair {
                    left: self.left.advance()?,
                    right: self.right.advance()?,
                },
                self.mode.emit_both,
            ),
            Ordering::Less => (
                MergedPair {
                    left: self.left.advance()?,
                    right: None,
                },
                self.mode.emit_left_only,
            ),
            Ordering::Greater => (
                MergedPair {
                    left: None,
                    right: self.right.advance()?,
                },
                self.mode.emit_right_only,
            ),
        };

        self.steps += 1;
        if self.log.debug() {
            debug!("{:?}\t{:?}", pair.left, pair.right);
        }
        if self.report_interval > 0 && self.steps % self.report_interval == 0 && self.log.info() {
            info!("K-mer loop round {}", self.steps);
        }
        Ok(Some((pair, emit)))
    }
}

impl<L, R> Iterator for SortedSetMerger<L, R>
where
    L: Iterator<Item = D2sResult<KmerRecord>>,
    R: Iterator<Item = D2sResult<KmerRecord>>,
{
    type Item = D2sResult<MergedPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.step() {
                Ok(Some((pair, true))) => return Some(Ok(pair)),
                Ok(Some((_, false))) => continue,
                Ok(None) => return None,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::D2sError;
    use proptest::prelude::*;

    fn stream(records: &[(u128, &str, u64)]) -> std::vec::IntoIter<D2sResult<KmerRecord>> {
        records
            .iter()
            .map(|(k, s, c)| Ok(KmerRecord::new(*k, s, *c)))
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn merge(
        left: &[(u128, &str, u64)],
        right: &[(u128, &str, u64)],
        mode: MergeMode,
    ) -> Vec<MergedPair> {
        SortedSetMerger::new(stream(left), stream(right), mode, LogHandle::silent())
            .collect::<D2sResult<_>>()
            .unwrap()
    }

    const A: [(u128, &str, u64); 3] = [(1, "AAAA", 5), (2, "AAAC", 3), (5, "AACG", 1)];
    const B: [(u128, &str, u64); 3] = [(1, "AAAA", 2), (3, "AACA", 4), (5, "AACG", 7)];

    #[test]
    fn test_intersection() {
        let pairs = merge(&A, &B, MergeMode::intersection());
        assert_eq!(
            pairs,
            vec![
                MergedPair {
                    left: Some(KmerRecord::new(1, "AAAA", 5)),
                    right: Some(KmerRecord::new(1, "AAAA", 2)),
                },
                MergedPair {
                    left: Some(KmerRecord::new(5, "AACG", 1)),
                    right: Some(KmerRecord::new(5, "AACG", 7)),
                },
            ]
        );
    }

    #[test]
    fn test_one_sided_modes() {
        let left = merge(&A, &B, MergeMode::left_only());
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].left, Some(KmerRecord::new(2, "AAAC", 3)));
        assert_eq!(left[0].right, None);

        let right = merge(&A, &B, MergeMode::right_only());
        assert_eq!(right.len(), 1);
        assert_eq!(right[0].left, None);
        assert_eq!(right[0].right, Some(KmerRecord::new(3, "AACA", 4)));
    }

    #[test]
    fn test_union_tails() {
        // left runs out first, then right's tail must still come through
        let pairs = merge(
            &[(1, "AAAC", 1)],
            &[(0, "AAAA", 1), (1, "AAAC", 2), (7, "AACT", 3), (9, "AAGC", 4)],
            MergeMode::union(),
        );
        let keys: Vec<_> = pairs.iter().map(|p| p.key().unwrap()).collect();
        assert_eq!(keys, vec![0, 1, 7, 9]);
        assert!(pairs[1].is_shared());
        assert!(!pairs[3].is_shared());

        // and the other way around
        let pairs = merge(&[(2, "AAAG", 1), (3, "AAAT", 1)], &[], MergeMode::union());
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.right.is_none()));

        assert!(merge(&[], &[], MergeMode::union()).is_empty());
    }

    #[test]
    fn test_errors_stop_merge() {
        let bad = vec![
            Ok(KmerRecord::new(1, "AAAC", 1)),
            Err(D2sError::Parse {
                line: 2,
                reason: "bad".to_string(),
            }),
            Ok(KmerRecord::new(3, "AAAT", 1)),
        ];
        let mut merger = SortedSetMerger::new(
            bad.into_iter(),
            stream(&[(1, "AAAC", 1), (3, "AAAT", 1)]),
            MergeMode::intersection(),
            LogHandle::silent(),
        );
        assert!(merger.next().unwrap().is_err());
        assert!(merger.next().is_none());
    }

    #[test]
    fn test_steps_counted() {
        let mut merger = SortedSetMerger::new(
            stream(&A),
            stream(&B),
            MergeMode::intersection(),
            LogHandle::silent(),
        )
        .report_interval(1);
        for pair in merger.by_ref() {
            pair.unwrap();
        }
        // keys 1, 2, 3, 5
        assert_eq!(merger.steps(), 4);
    }

    fn to_records(keys: &[u64]) -> Vec<(u128, &'static str, u64)> {
        keys.iter().map(|k| (u128::from(*k), "A", 1)).collect()
    }

    proptest! {
        #[test]
        fn test_merge_matches_sets(
            left in prop::collection::btree_set(0u64..200, 0..50),
            right in prop::collection::btree_set(0u64..200, 0..50),
        ) {
            let l: Vec<u64> = left.iter().copied().collect();
            let r: Vec<u64> = right.iter().copied().collect();
            let (lr, rr) = (to_records(&l), to_records(&r));

            let shared: Vec<u128> = merge(&lr, &rr, MergeMode::intersection())
                .iter()
                .map(|p| p.key().unwrap())
                .collect();
            let expected: Vec<u128> = left.intersection(&right).map(|k| u128::from(*k)).collect();
            prop_assert_eq!(shared, expected);

            let all: Vec<u128> = merge(&lr, &rr, MergeMode::union())
                .iter()
                .map(|p| p.key().unwrap())
                .collect();
            let expected: Vec<u128> = left.union(&right).map(|k| u128::from(*k)).collect();
            prop_assert_eq!(all, expected);
        }
    }
}
