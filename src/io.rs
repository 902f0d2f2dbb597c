//! Reading distance matrices.
//!
//! # Format
//! A matrix starts with the number of taxa `n`, followed by `n` rows, each a
//! taxon name and `n` distances:
//!
//! ```text
//! 3
//! alpha 0 1 2
//! beta  1 0 1
//! gamma 2 1 0
//! ```
//!
//! Tokens are separated by any whitespace, line breaks included. Several
//! matrices may follow each other in one stream; [`MatrixReader`] yields them
//! in order until the input ends.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;

use crate::error::{FormatError, Result};
use crate::matrix::DistanceMatrix;

const GZIP_HEADER: [u8; 2] = [0x1f, 0x8b];

/// Open a matrix file, or stdin when `path` is `-`.
///
/// Gzip-compressed input is recognised by its magic bytes and decoded on the fly.
pub fn open_input<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    if p.as_os_str() == "-" {
        return maybe_gunzip(BufReader::new(io::stdin()));
    }
    maybe_gunzip(BufReader::new(File::open(p)?))
}

pub(crate) fn maybe_gunzip<R: BufRead + 'static>(mut reader: R) -> io::Result<Box<dyn BufRead>> {
    let is_gz = reader.fill_buf()?.starts_with(&GZIP_HEADER);
    if is_gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Read every matrix in the file at `path`.
pub fn read_matrices<P: AsRef<Path>>(path: P) -> Result<Vec<DistanceMatrix>> {
    MatrixReader::new(open_input(path)?).collect()
}

/// Iterator over the matrices of a stream.
///
/// Yields `Err` at most once: after a malformed matrix the position in the
/// stream is unknown, so iteration stops.
pub struct MatrixReader<R> {
    input: R,
    line: String,
    tokens: VecDeque<String>,
    failed: bool,
}

impl<R: BufRead> MatrixReader<R> {
    pub fn new(input: R) -> Self {
        MatrixReader {
            input,
            line: String::new(),
            tokens: VecDeque::new(),
            failed: false,
        }
    }

    fn next_token(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Ok(Some(token));
            }
            self.line.clear();
            if self.input.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.tokens
                .extend(self.line.split_whitespace().map(str::to_owned));
        }
    }

    /// Read the next matrix; `Ok(None)` at a clean end of input.
    pub fn read_matrix(&mut self) -> Result<Option<DistanceMatrix>> {
        let Some(header) = self.next_token()? else {
            return Ok(None);
        };
        let size: usize = header
            .parse()
            .map_err(|_| FormatError::Header(header.clone()))?;
        let entries = size
            .checked_mul(size)
            .ok_or_else(|| FormatError::Header(header.clone()))?;

        let mut names = Vec::new();
        names.try_reserve_exact(size)?;
        let mut data = Vec::new();
        data.try_reserve_exact(entries)?;

        for row in 1..=size {
            let name = self.next_token()?.ok_or(FormatError::RowsTruncated {
                expected: size,
                found: row - 1,
            })?;
            for col in 0..size {
                let token = self.next_token()?.ok_or(FormatError::EntriesTruncated {
                    row,
                    expected: size,
                    found: col,
                })?;
                let value = token
                    .parse::<f64>()
                    .map_err(|source| FormatError::Numeric { row, token, source })?;
                data.push(value);
            }
            names.push(name);
        }

        Ok(Some(DistanceMatrix::new(names, data)?))
    }
}

impl<R: BufRead> Iterator for MatrixReader<R> {
    type Item = Result<DistanceMatrix>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_matrix() {
            Ok(Some(matrix)) => Some(Ok(matrix)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Invariant};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Read, Write};

    fn read_all(text: &str) -> Vec<Result<DistanceMatrix>> {
        MatrixReader::new(Cursor::new(text.as_bytes())).collect()
    }

    #[test]
    fn test_two_matrices() {
        let text = "3\nalpha 0 1 2\nbeta 1 0 1\ngamma 2 1 0\n2\nx 0 5\ny 5 0\n";
        let matrices: Vec<DistanceMatrix> = read_all(text).into_iter().map(|m| m.unwrap()).collect();

        assert_eq!(matrices.len(), 2);
        assert_eq!(matrices[0].names(), &["alpha", "beta", "gamma"]);
        assert_eq!(matrices[0].get(0, 2), 2.0);
        assert_eq!(matrices[1].size(), 2);
        assert_eq!(matrices[1].get(1, 0), 5.0);
    }

    #[test]
    fn test_rows_may_wrap() {
        let text = "  3\nalpha\n0 1\n2\nbeta 1 0 1 gamma 2 1\n0";
        let matrices = read_all(text);
        assert_eq!(matrices.len(), 1);
        assert_eq!(matrices[0].as_ref().unwrap().row(2), &[2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all("").is_empty());
        assert!(read_all("   \n\n").is_empty());
    }

    #[test]
    fn test_bad_header() {
        let out = read_all("three\na 0\n");
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(Error::Format(FormatError::Header(ref h))) if h == "three"));
    }

    #[test]
    fn test_truncated() {
        let out = read_all("3\na 0 1 2\nb 1 0 1\n");
        assert!(matches!(
            out[0],
            Err(Error::Format(FormatError::RowsTruncated { expected: 3, found: 2 }))
        ));

        let out = read_all("3\na 0 1 2\nb 1 0\n");
        assert!(matches!(
            out[0],
            Err(Error::Format(FormatError::EntriesTruncated { row: 2, expected: 3, found: 2 }))
        ));
    }

    #[test]
    fn test_bad_number_stops_iteration() {
        let out = read_all("2\na 0 x\nb 1 0\n2\nc 0 1\nd 1 0\n");
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            Err(Error::Format(FormatError::Numeric { row: 1, ref token, .. })) if token == "x"
        ));
    }

    #[test]
    fn test_invariants_checked() {
        let out = read_all("2\na 0 1\nb 2 0\n");
        assert!(matches!(
            out[0],
            Err(Error::InvariantViolation(Invariant::Asymmetric { row: 0, col: 1 }))
        ));
    }

    #[test]
    fn test_gzip_detected() {
        let text = "2\na 0 1.5\nb 1.5 0\n";
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        let compressed = enc.finish().unwrap();

        let mut plain = String::new();
        maybe_gunzip(Cursor::new(compressed))
            .unwrap()
            .read_to_string(&mut plain)
            .unwrap();
        assert_eq!(plain, text);

        let mut untouched = String::new();
        maybe_gunzip(Cursor::new(text.as_bytes().to_vec()))
            .unwrap()
            .read_to_string(&mut untouched)
            .unwrap();
        assert_eq!(untouched, text);
    }
}
