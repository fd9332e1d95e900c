use std::fs::File;
use std::io::{self, stdout, BufRead, BufReader, BufWriter, Read, Stdout, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::errors::{D2sError, D2sResult};

pub const GZIP_EXT: &str = ".gz";

fn is_gzipped(path: &Path) -> bool {
    path.to_str()
        .map(|p| p.ends_with(GZIP_EXT))
        .unwrap_or(false)
}

/// Fails with `InputNotFound` unless `path` exists.
pub fn check_file_exists<P: AsRef<Path>>(path: P) -> D2sResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(D2sError::InputNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Opens `path` for buffered reading, decompressing if it ends in `.gz`.
pub fn open_reader<P: AsRef<Path>>(path: P) -> D2sResult<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    check_file_exists(path)?;
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Wraps an arbitrary reader (e.g. stdin) the same way `open_reader` wraps files.
pub fn buffer_reader<'a, R: Read + Send + 'a>(reader: R) -> Box<dyn BufRead + Send + 'a> {
    Box::new(BufReader::new(reader))
}

/// Destination for distances and encoded kmers.
///
/// Dropping a gzip writer without calling `finish` leaves the trailer to
/// `GzEncoder`'s destructor, which swallows write errors.
pub enum OutputWriter {
    Stdout(Stdout),
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputWriter {
    /// Flushes everything, writing the gzip trailer if there is one.
    pub fn finish(self) -> D2sResult<()> {
        match self {
            OutputWriter::Stdout(mut out) => out.flush()?,
            OutputWriter::Plain(mut file) => file.flush()?,
            OutputWriter::Gzip(encoder) => encoder.finish()?.flush()?,
        }
        Ok(())
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputWriter::Stdout(out) => out.write(buf),
            OutputWriter::Plain(file) => file.write(buf),
            OutputWriter::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputWriter::Stdout(out) => out.flush(),
            OutputWriter::Plain(file) => file.flush(),
            OutputWriter::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Creates `path` for writing, compressing if it ends in `.gz`; `None` is stdout.
///
/// Call `OutputWriter::finish` once done so a failed final write is reported.
pub fn create_writer<P: AsRef<Path>>(path: Option<P>) -> D2sResult<OutputWriter> {
    match path {
        None => Ok(OutputWriter::Stdout(stdout())),
        Some(path) => {
            let path = path.as_ref();
            let file = BufWriter::new(File::create(path)?);
            if is_gzipped(path) {
                Ok(OutputWriter::Gzip(GzEncoder::new(
                    file,
                    Compression::default(),
                )))
            } else {
                Ok(OutputWriter::Plain(file))
            }
        }
    }
}

/// Iterates over the meaningful lines of a column file.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. Each item
/// carries the 1-based line number for error reporting.
pub struct ColumnLines<R: BufRead> {
    reader: R,
    line_buf: String,
    line_number: usize,
}

impl<R: BufRead> ColumnLines<R> {
    pub fn new(reader: R) -> Self {
        ColumnLines {
            reader,
            line_buf: String::with_capacity(128),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for ColumnLines<R> {
    type Item = D2sResult<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.line_buf.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    return Some(Ok((self.line_number, line.to_string())));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
