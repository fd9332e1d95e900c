use log::info;
use serde::Serialize;

use crate::errors::D2sResult;
use crate::logging::LogHandle;
use crate::params::D2sParams;
use crate::scoring::{check_kmer_lengths, score_with_k, Dataset};

/// Substituted for zero self-scores and non-positive normalized scores.
pub const EPSILON: f64 = 1e-5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct D2sDistance {
    pub query: String,
    pub reference: String,
    #[serde(rename = "kmerLength")]
    pub kmer_length: Option<usize>,
    #[serde(rename = "crossScore")]
    pub cross_score: f64,
    #[serde(rename = "querySelfScore")]
    pub query_self_score: f64,
    #[serde(rename = "referenceSelfScore")]
    pub reference_self_score: f64,
    pub distance: f64,
}

impl D2sDistance {
    /// The `query;reference;distance` line downstream matrix tools expect.
    pub fn to_line(&self) -> String {
        format!("{};{};{}\n", self.query, self.reference, self.distance)
    }
}

/// Turns a cross score and the two self scores into a distance.
///
/// The result is always finite and non-negative; it's zero when all three
/// scores are equal (i.e. a dataset compared with itself).
pub fn normalize(cross_score: f64, self_score_x: f64, self_score_y: f64) -> f64 {
    let self_x = if self_score_x == 0. {
        EPSILON
    } else {
        self_score_x
    };
    let self_y = if self_score_y == 0. {
        EPSILON
    } else {
        self_score_y
    };

    let mut value = cross_score / (self_x * self_y).sqrt();
    // D2S can be negative; NaN only shows up with negative self scores
    if value <= 0. || !value.is_finite() {
        value = EPSILON;
    }
    value.ln().abs()
}

/// Computes the D2S distance between two prepared datasets.
///
/// The kmer lengths are checked once, up front, then the cross score and
/// both self scores are computed (concurrently if `params.parallel`) and
/// normalized.
pub fn pair_distance(
    x: &Dataset,
    y: &Dataset,
    params: &D2sParams,
    log: LogHandle,
) -> D2sResult<D2sDistance> {
    let kmer_length = check_kmer_lengths(&x.kmers, &y.kmers, log)?;
    if let (Some(k), true) = (kmer_length, log.info()) {
        info!("k-mer:{}", k);
    }

    let (cross_score, query_self_score, reference_self_score) = match kmer_length {
        // no kmers on one side so nothing can be shared
        None => {
            let self_x = self_score(x, params, log)?;
            let self_y = self_score(y, params, log)?;
            (0., self_x, self_y)
        }
        Some(k) => {
            let score = |a: &Dataset, b: &Dataset| score_with_k(a, b, k, params, log);
            if params.parallel {
                let (xy, (xx, yy)) =
                    rayon::join(|| score(x, y), || rayon::join(|| score(x, x), || score(y, y)));
                (xy?, xx?, yy?)
            } else {
                (score(x, y)?, score(x, x)?, score(y, y)?)
            }
        }
    };

    if log.info() {
        info!("kmerset1 VS. kmerset2 d2Score:{}", cross_score);
        info!("kmerset1 VS. kmerset1 d2Score:{}", query_self_score);
        info!("kmerset2 VS. kmerset2 d2Score:{}", reference_self_score);
    }

    let distance = normalize(cross_score, query_self_score, reference_self_score);
    if log.info() {
        info!("D2S_distance:{}", distance);
    }

    Ok(D2sDistance {
        query: x.name(),
        reference: y.name(),
        kmer_length,
        cross_score,
        query_self_score,
        reference_self_score,
        distance,
    })
}

fn self_score(x: &Dataset, params: &D2sParams, log: LogHandle) -> D2sResult<f64> {
    match x.kmers.kmer_length()? {
        Some(k) => score_with_k(x, x, k, params, log),
        None => Ok(0.),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::D2sError;
    use crate::frequencies::CharFrequencyTable;
    use crate::kmers::KmerSource;
    use proptest::prelude::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(2., 2., 2.), 0.);
        assert!((normalize(1., 4., 1.) - 2f64.ln()).abs() < 1e-12);
        assert_eq!(normalize(-3., 2., 2.), EPSILON.ln().abs());
        assert_eq!(normalize(0., 2., 2.), EPSILON.ln().abs());
    }

    #[test]
    fn test_normalize_epsilon_clamp() {
        // a zero self score must not divide by zero
        let d = normalize(1e-5, 0., 1e-5);
        assert!(d.is_finite());
        assert_eq!(d, (1e-5 / (EPSILON * 1e-5).sqrt()).ln().abs());
        assert!(normalize(1., 0., 0.).is_finite());
        assert!(normalize(1., -1., 2.).is_finite());
    }

    proptest! {
        #[test]
        fn test_normalize_symmetric_non_negative(
            xy in -1e6f64..1e6,
            xx in 0f64..1e6,
            yy in 0f64..1e6,
        ) {
            let d = normalize(xy, xx, yy);
            prop_assert!(d >= 0.);
            prop_assert!(d.is_finite());
            prop_assert_eq!(d, normalize(xy, yy, xx));
        }

        #[test]
        fn test_normalize_self_is_zero(xx in 1e-3f64..1e6) {
            prop_assert_eq!(normalize(xx, xx, xx), 0.);
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        x: Dataset,
        y: Dataset,
        z: Dataset,
    }

    const FREQ_X: &str = "A\t0.3\nC\t0.2\nG\t0.2\nT\t0.3\nNUM_SEQUENCES\t2\nNUM_CHARACTERS\t60\n";
    const FREQ_Y: &str = "A\t0.25\nC\t0.25\nG\t0.25\nT\t0.25\nNUM_SEQUENCES\t1\nNUM_CHARACTERS\t45\n";

    fn dataset(dir: &tempfile::TempDir, name: &str, kmers: &str, freqs: &str) -> Dataset {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(kmers.as_bytes())
            .unwrap();
        let freqs = CharFrequencyTable::from_reader(Cursor::new(freqs), LogHandle::silent()).unwrap();
        Dataset::new(KmerSource::new(path), freqs)
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let x = dataset(
            &dir,
            "x.kmers",
            "0\tAAA\t9\n1\tAAC\t4\n12\tACG\t2\n123\tCGT\t1\n333\tTTT\t8\n",
            FREQ_X,
        );
        let y = dataset(
            &dir,
            "y.kmers",
            "0\tAAA\t1\n12\tACG\t6\n33\tATT\t3\n333\tTTT\t2\n",
            FREQ_Y,
        );
        let z = dataset(&dir, "z.kmers", "0\tAAAA\t1\n", FREQ_Y);
        Fixture { _dir: dir, x, y, z }
    }

    #[test]
    fn test_pair_distance() {
        let f = fixture();
        let params = D2sParams::default();
        let d = pair_distance(&f.x, &f.y, &params, LogHandle::silent()).unwrap();
        assert_eq!(d.kmer_length, Some(3));
        assert!(d.distance >= 0.);
        assert!(d.query_self_score > 0.);
        assert_eq!(
            d.distance,
            normalize(d.cross_score, d.query_self_score, d.reference_self_score)
        );
        assert!(d.to_line().starts_with(&format!("{};{};", d.query, d.reference)));
        assert!(d.to_line().ends_with('\n'));

        // serial and parallel runs agree exactly
        let serial = D2sParams {
            parallel: false,
            ..D2sParams::default()
        };
        assert_eq!(
            pair_distance(&f.x, &f.y, &serial, LogHandle::silent()).unwrap(),
            d
        );
    }

    #[test]
    fn test_pair_distance_symmetric() {
        let f = fixture();
        let params = D2sParams::default();
        let xy = pair_distance(&f.x, &f.y, &params, LogHandle::silent()).unwrap();
        let yx = pair_distance(&f.y, &f.x, &params, LogHandle::silent()).unwrap();
        assert_eq!(xy.cross_score, yx.cross_score);
        assert_eq!(xy.distance, yx.distance);
    }

    #[test]
    fn test_self_distance_is_zero() {
        let f = fixture();
        let d = pair_distance(&f.x, &f.x, &D2sParams::default(), LogHandle::silent()).unwrap();
        assert_eq!(d.cross_score, d.query_self_score);
        assert_eq!(d.distance, 0.);
    }

    #[test]
    fn test_length_mismatch() {
        let f = fixture();
        match pair_distance(&f.x, &f.z, &D2sParams::default(), LogHandle::silent()) {
            Err(D2sError::KmerLengthMismatch {
                left_len,
                right_len,
                ..
            }) => assert_eq!((left_len, right_len), (3, 4)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_json_record() {
        let f = fixture();
        let d = pair_distance(&f.x, &f.y, &D2sParams::default(), LogHandle::silent()).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kmerLength"], 3);
        assert_eq!(json["distance"], d.distance);
    }
}
