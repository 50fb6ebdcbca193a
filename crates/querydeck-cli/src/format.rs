//! Built-in result formatters

use querydeck_core::{DataError, FormatOptions, Formatter, Result, Row, SchemaType, Value};
use serde_json::Map;
use std::borrow::Cow;

/// Look up a formatter by the name used on the command line. `csv` is
/// returned for the "csv" name so callers can pass their options.
pub fn formatter(name: &str, csv: CsvFormatter) -> Result<Box<dyn Formatter>> {
    match name {
        "json" => Ok(Box::new(JsonFormatter)),
        "csv" => Ok(Box::new(csv)),
        other => Err(DataError::invalid_configuration(format!(
            "Unknown format '{}', expected json or csv",
            other
        ))),
    }
}

/// Pretty printed JSON array. Tabular rows become objects keyed by column,
/// schemaless rows are written as the document they hold.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, header: &[String], rows: &[Row], options: &FormatOptions) -> Result<Vec<u8>> {
        let documents: Vec<Value> = rows
            .iter()
            .map(|row| match options.schema_type {
                SchemaType::Tabular => {
                    let mut object = Map::new();
                    for (i, value) in row.iter().enumerate() {
                        let key = header
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("column_{}", i));
                        object.insert(key, value.clone());
                    }
                    Value::Object(object)
                }
                SchemaType::Schemaless => match row.as_slice() {
                    [document] => document.clone(),
                    _ => Value::Array(row.clone()),
                },
            })
            .collect();

        let mut out = serde_json::to_vec_pretty(&documents)?;
        out.push(b'\n');
        Ok(out)
    }
}

/// RFC 4180 style CSV. The header line is only written for the slice that
/// starts at row 0 so consecutive pages concatenate into one file.
pub struct CsvFormatter {
    separator: char,
    quote: char,
    null_value: String,
    with_column_names: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self {
            separator: ',',
            quote: '"',
            null_value: String::new(),
            with_column_names: true,
        }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn null_value(mut self, value: &str) -> Self {
        self.null_value = value.to_string();
        self
    }

    pub fn with_column_names(mut self, include: bool) -> Self {
        self.with_column_names = include;
        self
    }

    fn field(&self, raw: &str, out: &mut String) {
        let needs_quotes = raw.contains(self.separator)
            || raw.contains(self.quote)
            || raw.contains('\n')
            || raw.contains('\r');

        if !needs_quotes {
            out.push_str(raw);
            return;
        }

        out.push(self.quote);
        for c in raw.chars() {
            if c == self.quote {
                out.push(self.quote);
            }
            out.push(c);
        }
        out.push(self.quote);
    }

    fn line<'a>(&self, fields: impl Iterator<Item = Cow<'a, str>>, out: &mut String) {
        for (i, field) in fields.enumerate() {
            if i > 0 {
                out.push(self.separator);
            }
            self.field(&field, out);
        }
        out.push_str("\r\n");
    }
}

impl Formatter for CsvFormatter {
    fn format(&self, header: &[String], rows: &[Row], options: &FormatOptions) -> Result<Vec<u8>> {
        let mut out = String::new();

        if self.with_column_names && options.chunk_start == 0 {
            self.line(header.iter().map(|h| Cow::Borrowed(h.as_str())), &mut out);
        }

        for row in rows {
            self.line(
                row.iter().map(|value| match value {
                    Value::Null => Cow::Borrowed(self.null_value.as_str()),
                    Value::String(s) => Cow::Borrowed(s.as_str()),
                    other => Cow::Owned(other.to_string()),
                }),
                &mut out,
            );
        }

        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header() -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    fn options(chunk_start: usize) -> FormatOptions {
        FormatOptions {
            schema_type: SchemaType::Tabular,
            chunk_start,
        }
    }

    #[test]
    fn test_json_tabular_rows_become_objects() {
        let rows = vec![vec![json!(1), json!("ada")], vec![json!(2), json!(null)]];
        let out = JsonFormatter.format(&header(), &rows, &options(0)).unwrap();

        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            parsed,
            json!([{"id": 1, "name": "ada"}, {"id": 2, "name": null}])
        );
    }

    #[test]
    fn test_json_schemaless_rows_are_documents() {
        let rows = vec![vec![json!({"_id": "a", "tags": ["x"]})]];
        let opts = FormatOptions {
            schema_type: SchemaType::Schemaless,
            chunk_start: 0,
        };
        let out = JsonFormatter.format(&["document".into()], &rows, &opts).unwrap();

        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, json!([{"_id": "a", "tags": ["x"]}]));
    }

    #[test]
    fn test_csv_quotes_and_nulls() {
        let rows = vec![
            vec![json!(1), json!("plain")],
            vec![json!(2), json!("has, comma")],
            vec![json!(3), json!("say \"hi\"")],
            vec![json!(null), json!(true)],
        ];
        let out = CsvFormatter::new()
            .format(&header(), &rows, &options(0))
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,name\r\n1,plain\r\n2,\"has, comma\"\r\n3,\"say \"\"hi\"\"\"\r\n,true\r\n"
        );
    }

    #[test]
    fn test_csv_header_only_on_first_page() {
        let rows = vec![vec![json!(10), json!("x")]];
        let out = CsvFormatter::new()
            .format(&header(), &rows, &options(10))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "10,x\r\n");
    }

    #[test]
    fn test_csv_options() {
        let rows = vec![vec![json!(null), json!("a;b")]];
        let out = CsvFormatter::new()
            .separator(';')
            .null_value("NULL")
            .with_column_names(false)
            .format(&header(), &rows, &options(0))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "NULL;\"a;b\"\r\n");
    }

    #[test]
    fn test_formatter_lookup() {
        assert!(formatter("json", CsvFormatter::new()).is_ok());
        assert!(formatter("csv", CsvFormatter::new()).is_ok());
        assert!(matches!(
            formatter("xml", CsvFormatter::new()),
            Err(DataError::InvalidConfiguration(_))
        ));
    }
}
