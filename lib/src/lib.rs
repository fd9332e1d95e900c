use std::io::stdin;
use std::path::Path;

pub mod distance;
pub mod encode;
pub mod errors;
pub mod frequencies;
pub mod io;
pub mod kmers;
pub mod logging;
pub mod merge;
pub mod params;
pub mod scoring;

use crate::distance::{pair_distance, D2sDistance};
use crate::errors::D2sResult;
use crate::io::{buffer_reader, check_file_exists, create_writer, open_reader};
use crate::logging::LogHandle;
use crate::params::D2sParams;
use crate::scoring::Dataset;

/// Computes the D2S distance between two kmer sets given their kmer and
/// character frequency files.
///
/// All four paths are checked before anything is read.
pub fn distance_from_paths<P: AsRef<Path>>(
    kmerset1: P,
    kmerset1_freq: P,
    kmerset2: P,
    kmerset2_freq: P,
    params: &D2sParams,
    log: LogHandle,
) -> D2sResult<D2sDistance> {
    for path in &[&kmerset1, &kmerset1_freq, &kmerset2, &kmerset2_freq] {
        check_file_exists(path)?;
    }
    let x = Dataset::from_paths(&kmerset1, &kmerset1_freq, log)?;
    let y = Dataset::from_paths(&kmerset2, &kmerset2_freq, log)?;
    pair_distance(&x, &y, params, log)
}

/// Encodes a sorted `sequence<TAB>count` dump into a numeric kmer file.
///
/// Reads stdin when `input` is `None`; either side may be gzipped.
pub fn encode_file(input: Option<&str>, output: &str, log: LogHandle) -> D2sResult<u64> {
    let reader = match input {
        Some(path) => open_reader(path)?,
        None => buffer_reader(stdin()),
    };
    let mut writer = create_writer(Some(output))?;
    let written = encode::encode_counts(reader, &mut writer, log)?;
    writer.finish()?;
    Ok(written)
}
