use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::errors::{D2sError, D2sResult};
use crate::io::{open_reader, ColumnLines};

/// Numeric kmer key; 21-mers already overflow a `u64` in decimal encoding.
pub type KmerKey = u128;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KmerRecord {
    pub key: KmerKey,
    pub sequence: String,
    pub count: u64,
}

impl KmerRecord {
    pub fn new(key: KmerKey, sequence: &str, count: u64) -> Self {
        KmerRecord {
            key,
            sequence: sequence.to_string(),
            count,
        }
    }

    pub fn k(&self) -> usize {
        self.sequence.len()
    }

    /// Parses a `key<TAB>sequence<TAB>count` line.
    pub fn from_line(line: &str, line_number: usize) -> D2sResult<Self> {
        let parse_err = |reason: String| D2sError::Parse {
            line: line_number,
            reason,
        };
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 3 {
            return Err(parse_err(format!(
                "expected 3 tab-separated fields, found {}",
                fields.len()
            )));
        }
        let key = fields[0]
            .parse::<KmerKey>()
            .map_err(|_| parse_err(format!("bad kmer key {:?}", fields[0])))?;
        let count = fields[2]
            .parse::<u64>()
            .map_err(|_| parse_err(format!("bad kmer count {:?}", fields[2])))?;
        Ok(KmerRecord::new(key, fields[1], count))
    }
}

/// Lazily parses kmer records from a sorted kmer count stream.
pub struct KmerReader<R: BufRead> {
    lines: ColumnLines<R>,
    check_order: bool,
    last_key: Option<KmerKey>,
}

impl<R: BufRead> KmerReader<R> {
    pub fn new(reader: R) -> Self {
        KmerReader {
            lines: ColumnLines::new(reader),
            check_order: false,
            last_key: None,
        }
    }

    /// Fail with `UnsortedInput` when a key does not strictly increase.
    pub fn check_order(mut self, check: bool) -> Self {
        self.check_order = check;
        self
    }

    fn next_record(&mut self, line_number: usize, line: &str) -> D2sResult<KmerRecord> {
        let record = KmerRecord::from_line(line, line_number)?;
        if self.check_order {
            if let Some(previous) = self.last_key {
                if record.key <= previous {
                    return Err(D2sError::UnsortedInput {
                        line: line_number,
                        previous,
                        current: record.key,
                    });
                }
            }
        }
        self.last_key = Some(record.key);
        Ok(record)
    }
}

impl<R: BufRead> Iterator for KmerReader<R> {
    type Item = D2sResult<KmerRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line_number, line) = match self.lines.next()? {
            Ok(l) => l,
            Err(e) => return Some(Err(e)),
        };
        Some(self.next_record(line_number, &line))
    }
}

/// A kmer file that can be scanned from the start any number of times.
///
/// Every call to `open` hands out an independent reader, so concurrent
/// scoring passes never share a file handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KmerSource {
    path: PathBuf,
}

impl KmerSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        KmerSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path.display().to_string()
    }

    pub fn open(&self, check_order: bool) -> D2sResult<KmerReader<Box<dyn BufRead + Send>>> {
        Ok(KmerReader::new(open_reader(&self.path)?).check_order(check_order))
    }

    /// Length of the first kmer in the file, `None` if it has no records.
    pub fn kmer_length(&self) -> D2sResult<Option<usize>> {
        match self.open(false)?.next() {
            Some(record) => Ok(Some(record?.k())),
            None => Ok(None),
        }
    }
}
