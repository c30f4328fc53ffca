//! The tabular-input collaborator that feeds the engine.
//!
//! Reads delimited connection logs and maps designated columns to
//! [ConnectionPair]s. Row-shape problems are handled here; address parsing
//! failures are fatal and bubble up to the caller.
use super::containers::ConnectionPair;
use super::error::Result;
use csv::{Reader, StringRecord};
use std::io::Read;

/// Reads all rows from a delimited text file, skipping the header row.
pub fn read_rows(filepath: &str, delimiter: u8) -> Result<Vec<StringRecord>> {
    log::info!("Reading {filepath}");

    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(filepath)?;

    collect_rows(reader)
}

fn collect_rows<R: Read>(mut reader: Reader<R>) -> Result<Vec<StringRecord>> {
    let mut rows = Vec::new();

    for record in reader.records() {
        rows.push(record?);
    }

    Ok(rows)
}

/// Converts rows into connection pairs using the two designated columns.
///
/// Rows too short to carry both columns are skipped with a warning; a column
/// that is present but not a valid IPv4 literal fails the whole batch.
pub fn pairs_from_rows(
    rows: &[StringRecord],
    source_column: usize,
    destination_column: usize,
) -> Result<Vec<ConnectionPair>> {
    let mut pairs = Vec::with_capacity(rows.len());

    for row in rows {
        let (Some(source), Some(destination)) =
            (row.get(source_column), row.get(destination_column))
        else {
            log::warn!(
                "Skipping row with fewer than {} fields",
                source_column.max(destination_column) + 1
            );
            continue;
        };

        pairs.push(ConnectionPair::from_strs(source, destination)?);
    }

    Ok(pairs)
}

/// Loads connection pairs from a delimited log file.
///
/// Calls read_rows() and maps the designated columns to pairs.
pub fn load_pairs(
    filepath: &str,
    delimiter: u8,
    source_column: usize,
    destination_column: usize,
) -> Result<Vec<ConnectionPair>> {
    log::info!("Loading connection log.");
    let rows = read_rows(filepath, delimiter)?;
    log::debug!("Read {} data rows from {filepath}", rows.len());

    pairs_from_rows(&rows, source_column, destination_column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::error::ScanError;

    fn rows(data: &str, delimiter: u8) -> Vec<StringRecord> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        collect_rows(reader).unwrap()
    }

    #[test]
    fn header_row_is_skipped() {
        let rows = rows("source,destination\n10.0.0.1,192.168.1.10\n", b',');

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some("10.0.0.1"));
    }

    #[test]
    fn designated_columns_are_mapped() {
        // Column layout of the semicolon-delimited sample logs: id;src;dst.
        let rows = rows(
            "id;source;destination\n1;10.0.0.1;192.168.1.10\n2;10.0.0.2;192.168.1.20\n",
            b';',
        );
        let pairs = pairs_from_rows(&rows, 1, 2).unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ConnectionPair::from_strs("10.0.0.1", "192.168.1.10").unwrap());
        assert_eq!(pairs[1], ConnectionPair::from_strs("10.0.0.2", "192.168.1.20").unwrap());
    }

    #[test]
    fn short_rows_are_skipped() {
        let rows = rows("source,destination\n10.0.0.1\n10.0.0.2,192.168.1.20\n", b',');
        let pairs = pairs_from_rows(&rows, 0, 1).unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].source, "10.0.0.2".parse::<std::net::Ipv4Addr>().unwrap());
    }

    #[test]
    fn malformed_address_fails_the_batch() {
        let rows = rows("source,destination\n10.0.0.1,bogus\n", b',');
        let err = pairs_from_rows(&rows, 0, 1).unwrap_err();

        assert!(matches!(err, ScanError::AddressParse(literal) if literal == "bogus"));
    }

    #[test]
    fn missing_file_is_a_csv_error() {
        let err = read_rows("/definitely/not/here.csv", b',').unwrap_err();
        assert!(matches!(err, ScanError::Csv(_)));
    }
}
