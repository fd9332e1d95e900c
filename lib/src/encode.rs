//! Turns a lexicographically sorted `sequence<TAB>count` dump (e.g. from
//! `jellyfish dump -c`) into the numeric-keyed kmer files the merger reads.
//!
//! Each base becomes one decimal digit (A=0, C=1, G=2, T=3) so, for kmers of
//! one length, numeric order matches lexicographic order.
use std::io::{BufRead, Write};

use log::{debug, info};

use crate::errors::{D2sError, D2sResult};
use crate::format_err;
use crate::io::ColumnLines;
use crate::kmers::KmerKey;
use crate::logging::LogHandle;

fn base_digit(base: u8) -> Option<KmerKey> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

pub fn encode_kmer(kmer: &str) -> D2sResult<KmerKey> {
    kmer.bytes().try_fold(0, |key: KmerKey, base| -> D2sResult<KmerKey> {
        let digit = base_digit(base).ok_or(D2sError::UnknownCharacter(base as char))?;
        key.checked_mul(10)
            .and_then(|k| k.checked_add(digit))
            .ok_or_else(|| format_err!("kmer {} is too long to encode", kmer))
    })
}

/// Encodes every kmer from `reader` into `writer`, returning how many were
/// written. Fails if the kmers aren't strictly increasing.
pub fn encode_counts<R: BufRead>(
    reader: R,
    writer: &mut dyn Write,
    log: LogHandle,
) -> D2sResult<u64> {
    let mut last: Option<(KmerKey, usize)> = None;
    let mut written = 0;

    for line in ColumnLines::new(reader) {
        let (line_number, line) = line?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 2 {
            return Err(D2sError::Parse {
                line: line_number,
                reason: format!("expected 2 tab-separated fields, found {}", fields.len()),
            });
        }
        let sequence = fields[0].to_ascii_uppercase();
        let count = fields[1].parse::<u64>().map_err(|_| D2sError::Parse {
            line: line_number,
            reason: format!("bad kmer count {:?}", fields[1]),
        })?;
        let key = encode_kmer(&sequence)?;
        if log.debug() {
            debug!("{}\t{}\tkmer value: {}", sequence, count, key);
        }

        if let Some((previous, k)) = last {
            if sequence.len() != k {
                return Err(D2sError::Parse {
                    line: line_number,
                    reason: format!("kmer length {} differs from {}", sequence.len(), k),
                });
            }
            if key <= previous {
                return Err(D2sError::UnsortedInput {
                    line: line_number,
                    previous,
                    current: key,
                });
            }
        }
        last = Some((key, sequence.len()));

        writeln!(writer, "{}\t{}\t{}", key, sequence, count)?;
        written += 1;
    }

    if log.info() {
        info!("Encoded {} kmers", written);
    }
    Ok(written)
}
