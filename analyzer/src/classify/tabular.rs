//! Row/column introspection for delimited text and spreadsheets.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader};
use csv::StringRecord;
use serde_json::{Map, Number, Value};

use super::ClassifyError;

/// Number of leading rows returned as sample data.
pub(crate) const SAMPLE_ROWS: usize = 3;

/// Field text read as a missing value.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA",
    "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Shape of a table plus its first [`SAMPLE_ROWS`] rows.
#[derive(Debug, Default)]
pub(crate) struct Table {
    pub column_names: Vec<String>,
    pub row_count: usize,
    pub sample: Vec<Map<String, Value>>,
}

impl Table {
    /// Blank names become `Unnamed: <i>`; repeated names get a `.1`, `.2`, ... suffix.
    fn with_header<I>(header: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let column_names = header
            .into_iter()
            .enumerate()
            .map(|(i, name)| if name.is_empty() { format!("Unnamed: {i}") } else { name })
            .map(|mut name| {
                let mut count = seen.get(&name).copied().unwrap_or(0);
                while count > 0 {
                    seen.insert(name.clone(), count + 1);
                    name = format!("{name}.{count}");
                    count = seen.get(&name).copied().unwrap_or(0);
                }
                seen.insert(name.clone(), 1);
                name
            })
            .collect();

        Self {
            column_names,
            ..Default::default()
        }
    }

    /// Count a data row, keeping it if it falls within the sample.
    fn push_row(&mut self, cells: impl IntoIterator<Item = Value>) {
        self.row_count += 1;
        if self.sample.len() < SAMPLE_ROWS {
            self.push_sample(cells);
        }
    }

    /// Missing trailing cells are null.
    fn push_sample(&mut self, cells: impl IntoIterator<Item = Value>) {
        let mut cells = cells.into_iter();
        let record = self
            .column_names
            .iter()
            .map(|name| (name.clone(), cells.next().unwrap_or(Value::Null)))
            .collect();
        self.sample.push(record);
    }
}

/// Value type a single CSV field could be read as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum FieldKind {
    /// Only missing values seen so far
    #[default]
    Missing,
    Int,
    Float,
    Bool,
    Text,
}

impl FieldKind {
    fn of(raw: &str) -> Self {
        if is_na(raw) {
            FieldKind::Missing
        } else if raw.parse::<i64>().is_ok() {
            FieldKind::Int
        } else if raw.parse::<f64>().is_ok() {
            FieldKind::Float
        } else if parse_bool(raw).is_some() {
            FieldKind::Bool
        } else {
            FieldKind::Text
        }
    }

    /// Narrowest kind holding both.
    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (kind, FieldKind::Missing) | (FieldKind::Missing, kind) => kind,
            (a, b) if a == b => a,
            (FieldKind::Int, FieldKind::Float) | (FieldKind::Float, FieldKind::Int) => FieldKind::Float,
            _ => FieldKind::Text,
        }
    }
}

/// Type of one CSV column, inferred from every row.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnType {
    kind: FieldKind,
    has_missing: bool,
}

impl ColumnType {
    fn observe(&mut self, raw: Option<&str>) {
        match raw {
            Some(raw) if !is_na(raw) => self.kind = self.kind.merge(FieldKind::of(raw)),
            _ => self.has_missing = true,
        }
    }

    /// Read a field as this column's type. Integer columns with gaps are read as floats.
    fn value(&self, raw: Option<&str>) -> Value {
        let Some(raw) = raw.filter(|raw| !is_na(raw)) else {
            return Value::Null;
        };

        match self.kind {
            FieldKind::Int if !self.has_missing => raw.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            FieldKind::Int | FieldKind::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldKind::Bool => parse_bool(raw).map(Value::Bool).unwrap_or(Value::Null),
            FieldKind::Missing | FieldKind::Text => Value::String(raw.to_string()),
        }
    }
}

fn is_na(raw: &str) -> bool {
    NA_VALUES.contains(&raw)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Read comma-separated text whose first record is the header.
///
/// Every column gets one type from all of its fields, so a column mixing numbers and text is
/// reported as text throughout.
pub(crate) fn read_csv(content: &[u8]) -> Result<Table, ClassifyError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(content);

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Err(ClassifyError::NoColumns);
    }

    let mut table = Table::with_header(header.iter().map(str::to_string));
    let expected = table.column_names.len();
    let mut columns = vec![ColumnType::default(); expected];
    let mut sample: Vec<StringRecord> = Vec::with_capacity(SAMPLE_ROWS);

    for record in reader.records() {
        let record = record?;
        if record.len() > expected {
            return Err(ClassifyError::RaggedRecord {
                expected,
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                found: record.len(),
            });
        }

        for (i, column) in columns.iter_mut().enumerate() {
            column.observe(record.get(i));
        }
        table.row_count += 1;
        if sample.len() < SAMPLE_ROWS {
            sample.push(record);
        }
    }

    for record in &sample {
        table.push_sample(columns.iter().enumerate().map(|(i, column)| column.value(record.get(i))));
    }

    Ok(table)
}

/// Read the first worksheet of an xlsx/xls/ods workbook; the first row is the header.
pub(crate) fn read_spreadsheet(content: &[u8]) -> Result<Table, ClassifyError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(content))?;
    let range = workbook.worksheet_range_at(0).ok_or(ClassifyError::NoWorksheet)??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };

    let mut table = Table::with_header(header.iter().map(|cell| cell.to_string()));
    for row in rows {
        table.push_row(row.iter().map(cell_value));
    }

    Ok(table)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(int) => Value::from(*int),
        // Spreadsheets store every number as a float; whole values read back as integers
        Data::Float(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => Value::from(*float as i64),
        Data::Float(float) => Number::from_f64(*float).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tests::workbook_bytes;
    use serde_json::json;

    #[test]
    fn test_csv_shape_and_sample() {
        let csv = "id,name,score\n1,ada,9.5\n2,grace,8\n3,alan,7.25\n4,barbara,6\n5,edsger,5\n";
        let table = read_csv(csv.as_bytes()).unwrap();

        assert_eq!(table.row_count, 5);
        assert_eq!(table.column_names, vec!["id", "name", "score"]);
        assert_eq!(table.sample.len(), SAMPLE_ROWS);
        assert_eq!(
            Value::Object(table.sample[0].clone()),
            json!({"id": 1, "name": "ada", "score": 9.5})
        );
        assert_eq!(Value::Object(table.sample[2].clone()), json!({"id": 3, "name": "alan", "score": 7.25}));
    }

    #[test]
    fn test_csv_fewer_rows_than_sample() {
        let table = read_csv(b"a\nx\n").unwrap();
        assert_eq!(table.row_count, 1);
        assert_eq!(table.sample.len(), 1);
    }

    #[test]
    fn test_csv_header_only() {
        let table = read_csv(b"a,b,c\n").unwrap();
        assert_eq!(table.row_count, 0);
        assert_eq!(table.column_names.len(), 3);
        assert!(table.sample.is_empty());
    }

    #[test]
    fn test_csv_empty_input() {
        let err = read_csv(b"").unwrap_err();
        assert!(matches!(err, ClassifyError::NoColumns));
        assert_eq!(err.to_string(), "No columns to parse from file");
    }

    #[test]
    fn test_csv_short_rows_are_padded() {
        let table = read_csv(b"a,b,c\n1\n").unwrap();
        assert_eq!(Value::Object(table.sample[0].clone()), json!({"a": 1, "b": null, "c": null}));
    }

    #[test]
    fn test_csv_long_rows_are_rejected() {
        let err = read_csv(b"a,b\n1,2\n3,4,5\n").unwrap_err();
        match err {
            ClassifyError::RaggedRecord { expected, line, found } => {
                assert_eq!(expected, 2);
                assert_eq!(line, 3);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_csv_invalid_utf8() {
        assert!(read_csv(b"name\n\xff\xfe\n").is_err());
    }

    #[test]
    fn test_csv_unnamed_columns() {
        let table = read_csv(b",value\n1,2\n").unwrap();
        assert_eq!(table.column_names, vec!["Unnamed: 0", "value"]);
    }

    #[test]
    fn test_csv_columns_typed_as_a_whole() {
        let csv = "id,code,ratio,flag,note\n1,1,1,true,NA\n2,x,2.5,false,\n3,3,3,True,null\n";
        let table = read_csv(csv.as_bytes()).unwrap();

        assert_eq!(
            Value::Object(table.sample[0].clone()),
            json!({"id": 1, "code": "1", "ratio": 1.0, "flag": true, "note": null})
        );
        assert_eq!(
            Value::Object(table.sample[1].clone()),
            json!({"id": 2, "code": "x", "ratio": 2.5, "flag": false, "note": null})
        );
    }

    #[test]
    fn test_csv_integer_column_with_gaps_reads_as_float() {
        let table = read_csv(b"n,label\n1,a\nN/A,b\n3,\n").unwrap();

        assert_eq!(Value::Object(table.sample[0].clone()), json!({"n": 1.0, "label": "a"}));
        assert_eq!(Value::Object(table.sample[1].clone()), json!({"n": null, "label": "b"}));
        assert_eq!(Value::Object(table.sample[2].clone()), json!({"n": 3.0, "label": null}));
    }

    #[test]
    fn test_csv_type_uses_rows_beyond_sample() {
        let table = read_csv(b"v\n1\n2\n3\n4\nfour\n").unwrap();
        assert_eq!(table.row_count, 5);
        assert_eq!(Value::Object(table.sample[0].clone()), json!({"v": "1"}));
    }

    #[test]
    fn test_field_kind() {
        assert_eq!(FieldKind::of(""), FieldKind::Missing);
        assert_eq!(FieldKind::of("nan"), FieldKind::Missing);
        assert_eq!(FieldKind::of("None"), FieldKind::Missing);
        assert_eq!(FieldKind::of("42"), FieldKind::Int);
        assert_eq!(FieldKind::of("-3.5"), FieldKind::Float);
        assert_eq!(FieldKind::of("TRUE"), FieldKind::Bool);
        assert_eq!(FieldKind::of("hello"), FieldKind::Text);

        assert_eq!(FieldKind::Int.merge(FieldKind::Float), FieldKind::Float);
        assert_eq!(FieldKind::Missing.merge(FieldKind::Bool), FieldKind::Bool);
        assert_eq!(FieldKind::Bool.merge(FieldKind::Int), FieldKind::Text);
    }

    #[test]
    fn test_csv_duplicate_column_names() {
        let table = read_csv(b"a,a,b,a\n1,2,3,4\n").unwrap();

        assert_eq!(table.column_names, vec!["a", "a.1", "b", "a.2"]);
        assert_eq!(table.sample[0].len(), 4);
        assert_eq!(Value::Object(table.sample[0].clone()), json!({"a": 1, "a.1": 2, "b": 3, "a.2": 4}));
    }

    #[test]
    fn test_renamed_duplicate_does_not_clash() {
        let table = Table::with_header(["a", "a.1", "a"].map(String::from));
        assert_eq!(table.column_names, vec!["a", "a.1", "a.1.1"]);
    }

    #[test]
    fn test_spreadsheet_first_sheet() {
        let bytes = workbook_bytes(&[&["city", "population"], &["Oslo", "709000"], &["Bergen", "291000"]]);
        let table = read_spreadsheet(&bytes).unwrap();

        assert_eq!(table.column_names, vec!["city", "population"]);
        assert_eq!(table.row_count, 2);
        assert_eq!(Value::Object(table.sample[0].clone()), json!({"city": "Oslo", "population": 709000}));
    }

    #[test]
    fn test_spreadsheet_duplicate_column_names() {
        let bytes = workbook_bytes(&[&["x", "x", "y"], &["1", "2", "3"]]);
        let table = read_spreadsheet(&bytes).unwrap();

        assert_eq!(table.column_names, vec!["x", "x.1", "y"]);
        assert_eq!(Value::Object(table.sample[0].clone()), json!({"x": 1, "x.1": 2, "y": 3}));
    }

    #[test]
    fn test_spreadsheet_rejects_garbage() {
        assert!(read_spreadsheet(b"PK\x03\x04 truncated").is_err());
    }

    #[test]
    fn test_cell_value() {
        assert_eq!(cell_value(&Data::Float(2.0)), json!(2));
        assert_eq!(cell_value(&Data::Float(2.5)), json!(2.5));
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Bool(true)), json!(true));
        assert_eq!(cell_value(&Data::String("x".into())), json!("x"));
    }
}
