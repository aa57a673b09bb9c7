//! Row-oriented text format for q-tables.
//!
//! One row per key, six comma-separated fields and no header:
//!
//! ```text
//! position,gap_top,distance,velocity,q_flap,q_noop
//! 7,4,12,-3,0.25,
//! ```
//!
//! A missing action value is an empty field, never `0.0`, so absence
//! survives a round trip.

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::{
    Error, Result,
    q_learning::q_table::{ActionValues, QTable},
    types::DiscreteKey,
};

/// Fields per row
pub const FIELD_COUNT: usize = 6;

/// One persisted table entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QValueRow {
    pub key: DiscreteKey,
    pub values: ActionValues,
}

impl QValueRow {
    /// Text fields in file order
    pub fn to_fields(&self) -> [String; FIELD_COUNT] {
        let value = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        [
            self.key.position.to_string(),
            self.key.gap_top.to_string(),
            self.key.distance.to_string(),
            self.key.velocity.to_string(),
            value(self.values.flap),
            value(self.values.noop),
        ]
    }

    /// Parse one record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on a wrong field count, a non-numeric or
    /// off-lattice key component, or a non-numeric value field.
    pub fn from_record(line: usize, record: &StringRecord) -> Result<Self> {
        if record.len() != FIELD_COUNT {
            return Err(Error::parse(
                line,
                format!("expected {FIELD_COUNT} fields, found {}", record.len()),
            ));
        }

        let level = |idx: usize, name: &str| -> Result<u8> {
            let text = record[idx].trim();
            text.parse::<u8>()
                .map_err(|_| Error::parse(line, format!("{name} '{text}' is not a lattice level")))
        };
        let position = level(0, "position")?;
        let gap_top = level(1, "gap top")?;
        let distance = level(2, "distance")?;
        let velocity = parse_velocity(line, record[3].trim())?;

        let key = DiscreteKey::new(position, gap_top, distance, velocity)
            .map_err(|e| Error::parse(line, e.to_string()))?;

        let values = ActionValues {
            flap: parse_value(line, "flap value", &record[4])?,
            noop: parse_value(line, "no-op value", &record[5])?,
        };

        Ok(Self { key, values })
    }
}

// Older tables wrote velocity as a float ("-3.0"); accept integral floats.
fn parse_velocity(line: usize, text: &str) -> Result<i32> {
    if let Ok(velocity) = text.parse::<i32>() {
        return Ok(velocity);
    }
    match text.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX) => {
            Ok(v as i32)
        }
        _ => Err(Error::parse(
            line,
            format!("velocity '{text}' is not an integer"),
        )),
    }
}

fn parse_value(line: usize, name: &str, text: &str) -> Result<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| Error::parse(line, format!("{name} '{text}' is not a number")))
}

/// Table entries as rows, sorted by key
pub fn serialize(table: &QTable) -> Vec<QValueRow> {
    table
        .sorted_entries()
        .into_iter()
        .map(|(key, values)| QValueRow { key, values })
        .collect()
}

/// Rebuild a table from rows. Later rows for the same key replace earlier
/// ones; rows with both values absent add nothing.
pub fn deserialize<I>(rows: I) -> QTable
where
    I: IntoIterator<Item = QValueRow>,
{
    let mut table = QTable::new();
    for row in rows {
        table.insert_entry(row.key, row.values);
    }
    table
}

/// Write a table as CSV text.
pub fn write_table<W: Write>(table: &QTable, writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    for row in serialize(table) {
        csv_writer.write_record(row.to_fields())?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Parse every record of a CSV stream. Blank lines are skipped.
///
/// # Errors
///
/// Stops at the first malformed row; a partial table is never returned.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<QValueRow>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record
            .map_err(|err| malformed_text(idx + 1, &err).unwrap_or_else(|| Error::Csv(err)))?;
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 1);
        rows.push(QValueRow::from_record(line, &record)?);
    }
    Ok(rows)
}

// Undecodable bytes belong to one row, so report them as that row's parse error.
fn malformed_text(fallback_line: usize, err: &csv::Error) -> Option<Error> {
    match err.kind() {
        csv::ErrorKind::Utf8 { pos, err } => {
            let line = pos.as_ref().map_or(fallback_line, |pos| pos.line() as usize);
            Some(Error::parse(
                line,
                format!("field {} is not valid UTF-8", err.field() + 1),
            ))
        }
        _ => None,
    }
}

/// Read a whole table from CSV text.
pub fn read_table<R: Read>(reader: R) -> Result<QTable> {
    Ok(deserialize(read_rows(reader)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;

    fn key(position: u8, velocity: i32) -> DiscreteKey {
        DiscreteKey::new(position, 2, 14, velocity).unwrap()
    }

    fn sample_table() -> QTable {
        let mut table = QTable::new();
        table.set(key(3, -4), Action::Flap, 0.125);
        table.set(key(3, -4), Action::NoOp, -2.5);
        table.set(key(0, 9), Action::NoOp, 0.0);
        table.set(key(15, 0), Action::Flap, 1.0 / 3.0);
        table
    }

    fn to_text(table: &QTable) -> String {
        let mut buffer = Vec::new();
        write_table(table, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_missing_values_written_as_empty_fields() {
        let text = to_text(&sample_table());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["0,2,14,9,,0", "3,2,14,-4,0.125,-2.5", "15,2,14,0,0.3333333333333333,"]
        );
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let table = sample_table();
        let rebuilt = deserialize(serialize(&table).into_iter().rev());
        assert_eq!(to_text(&table), to_text(&rebuilt));
    }

    #[test]
    fn test_roundtrip_preserves_absence() {
        let table = sample_table();
        let restored = read_table(to_text(&table).as_bytes()).unwrap();

        assert_eq!(restored.size(), table.size());
        for (key, values) in table.iter() {
            let other = restored.entry(key).unwrap();
            assert_eq!(values.flap.is_some(), other.flap.is_some());
            assert_eq!(values.noop.is_some(), other.noop.is_some());
            for action in Action::ALL {
                assert!((table.get(key, action) - restored.get(key, action)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_reads_float_velocity_and_blank_lines() {
        let table = read_table("1,2,3,-7.0,0.5,\n\n4,5,6,2,,1.5\n".as_bytes()).unwrap();
        assert_eq!(table.size(), 2);
        let first = DiscreteKey::new(1, 2, 3, -7).unwrap();
        assert_eq!(table.get(&first, Action::Flap), 0.5);
        assert_eq!(table.entry(&first).unwrap().noop, None);
    }

    #[test]
    fn test_wrong_field_count_is_parse_error() {
        let err = read_table("1,2,3,4,0.5,0.1\n1,2,3,4,0.5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "got {err:?}");
    }

    #[test]
    fn test_non_numeric_key_is_parse_error() {
        let err = read_table("a,2,3,4,0.5,0.1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));

        let err = read_table("1,2,3,fast,0.5,0.1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));

        let err = read_table("1,2,3,1.5,0.5,0.1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_off_lattice_key_is_parse_error() {
        let err = read_table("16,2,3,4,0.5,0.1\n".as_bytes()).unwrap_err();
        match err {
            Error::Parse { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("outside the 0..=15 lattice"), "{reason}");
                assert!(!reason.contains("configuration"), "{reason}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_value_is_parse_error() {
        let err = read_table("1,2,3,4,high,0.1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error_on_its_row() {
        let err = read_table(&b"1,2,3,4,0.5,0.1\n1,2,3,4,\xff,0.1\n"[..]).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "got {err:?}");
    }

    #[test]
    fn test_row_with_no_values_adds_nothing() {
        let table = read_table("1,2,3,4,,\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }
}
