// src/intake/parse.rs

use csv::{ReaderBuilder, Trim};
use std::io::Cursor;
use tracing::trace;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row plus the first few data rows of a CSV buffer.
#[derive(Debug)]
pub(crate) struct Sample {
    pub headers: Vec<String>,
    /// Data rows as raw strings, one per field, header order.
    pub rows: Vec<Vec<String>>,
}

pub(crate) fn strip_bom(content: &[u8]) -> &[u8] {
    content.strip_prefix(UTF8_BOM).unwrap_or(content)
}

/// Build the reader every intake pass uses: comma-delimited, header row,
/// header names trimmed, ragged rows treated as errors.
pub(crate) fn reader(content: &[u8]) -> csv::Reader<Cursor<&[u8]>> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::Headers)
        .from_reader(Cursor::new(strip_bom(content)))
}

/// Read the header and at most `limit` data rows. Anything past `limit` is
/// left unread.
pub(crate) fn read_sample(content: &[u8], limit: usize) -> Result<Sample, csv::Error> {
    let mut rdr = reader(content);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::with_capacity(limit);
    for (idx, result) in rdr.records().take(limit).enumerate() {
        let record = result?;
        trace!(row = idx, fields = record.len(), "sampled row");
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Sample { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_stops_at_limit() {
        let content = b"a,b\n1,2\n3,4\n5,6\n";
        let sample = read_sample(content, 2).unwrap();
        assert_eq!(sample.headers, vec!["a", "b"]);
        assert_eq!(sample.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_bom_and_header_whitespace_removed() {
        let content = b"\xEF\xBB\xBF a , b\n 1 ,2\n";
        let sample = read_sample(content, 5).unwrap();
        assert_eq!(sample.headers, vec!["a", "b"]);
        // values stay untouched
        assert_eq!(sample.rows[0], vec![" 1 ", "2"]);
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let content = b"a,b\n1,2,3\n";
        assert!(read_sample(content, 5).is_err());
    }

    #[test]
    fn test_malformation_past_limit_is_not_read() {
        let content = b"a,b\n1,2\n1,2,3\n";
        let sample = read_sample(content, 1).unwrap();
        assert_eq!(sample.rows.len(), 1);
    }
}
