//! Plain-text adapters between URL lists, result rows and files.

use crate::results::{HEADER, ResultRecord};
use std::io::{self, Read, Write};

/// Read URLs from a list or a CSV export.
///
/// If the first record is a CSV header with a `URL` column
/// (case-insensitive), that column is read from every following record.
/// Otherwise the input is a plain list with one URL per line. Blank lines
/// and `#` comments are skipped in both forms.
pub fn read_urls<R: Read>(mut reader: R) -> io::Result<Vec<String>> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    let input = input.trim_start_matches('\u{feff}');

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());
    let column = rdr
        .headers()
        .ok()
        .and_then(|header| header.iter().position(|f| f.eq_ignore_ascii_case("url")));

    let Some(idx) = column else {
        return Ok(input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect());
    };

    let mut urls = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(url) = record.get(idx).filter(|url| !url.is_empty()) {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

/// Write records as tab-separated values with a header row
pub fn write_tsv<W: Write>(mut writer: W, records: &[ResultRecord]) -> io::Result<()> {
    writeln!(writer, "{}", HEADER.join("\t"))?;
    for record in records {
        let row = record.to_row().map(|field| field.replace(['\t', '\n', '\r'], " "));
        writeln!(writer, "{}", row.join("\t"))?;
    }
    writer.flush()
}

/// Write records as a JSON array
pub fn write_json<W: Write>(mut writer: W, records: &[ResultRecord]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()
}
