//! CSV encoding and decoding of sprint records.

use std::collections::HashMap;

use super::reasons;
use crate::errors::StructuredError;
use crate::models::Sprint;

/// Returned by [`encode_csv`] for an empty sprint list.
pub const NO_DATA_SENTINEL: &str = "No data to export";

/// Export columns, in order.
pub const CSV_HEADERS: [&str; 16] = [
    "Sprint Name",
    "Business Days",
    "Number of People",
    "Working Hours",
    "Total Points in Sprint",
    "Carry Over Points Total",
    "Carry Over Points Completed",
    "New Work Points",
    "Unplanned Points Brought In",
    "Points Completed",
    "Planned Points",
    "Percent Complete",
    "Velocity",
    "Predicted Capacity",
    "Created At",
    "Updated At",
];

/// Optional columns read on import when present.
pub const ID_COLUMN: &str = "ID";
pub const LINK_COLUMN: &str = "Sprint Link";

const CONTEXT: &str = "decode-csv";

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Encode sprints as CSV, one row per sprint under [`CSV_HEADERS`].
///
/// String fields are quoted; numbers are written in shortest round-trip form.
pub fn encode_csv(sprints: &[Sprint]) -> String {
    if sprints.is_empty() {
        return NO_DATA_SENTINEL.to_string();
    }

    let mut lines = Vec::with_capacity(sprints.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for s in sprints {
        let row = [
            quote(&s.sprint_name),
            s.business_days.to_string(),
            s.number_of_people.to_string(),
            s.working_hours.to_string(),
            s.total_points_in_sprint.to_string(),
            s.carry_over_points_total.to_string(),
            s.carry_over_points_completed.to_string(),
            s.new_work_points.to_string(),
            s.unplanned_points_brought_in.to_string(),
            s.points_completed.to_string(),
            s.planned_points.to_string(),
            s.percent_complete.to_string(),
            s.velocity.to_string(),
            s.predicted_capacity.to_string(),
            quote(&s.created_at),
            quote(&s.updated_at),
        ];
        lines.push(row.join(","));
    }

    tracing::debug!(rows = sprints.len(), "Encoded CSV");
    lines.join("\n")
}

/// Split CSV text into records.
///
/// Commas, CR/LF and doubled quotes inside a quoted field are literal.
fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
        .into_iter()
        .filter(|r| !(r.len() == 1 && r[0].trim().is_empty()))
        .collect()
}

fn corrupt(message: String, reason: &str, details: serde_json::Value) -> StructuredError {
    let mut payload = serde_json::json!({ "reason": reason });
    if let (Some(target), Some(extra)) = (payload.as_object_mut(), details.as_object()) {
        target.extend(extra.clone());
    }
    StructuredError::data_corruption(message, Some(payload), CONTEXT)
}

/// A data row addressed by header name.
struct Row<'a> {
    line: usize,
    cells: &'a [String],
    columns: &'a HashMap<&'a str, usize>,
}

impl Row<'_> {
    /// The raw cell; string fields are kept exactly as quoted.
    fn text(&self, column: &str) -> Option<String> {
        self.columns
            .get(column)
            .and_then(|&i| self.cells.get(i))
            .cloned()
    }

    fn invalid_numeric(&self, column: &str) -> StructuredError {
        corrupt(
            format!(
                "Required numeric fields are missing or invalid in row {}: {}",
                self.line, column
            ),
            reasons::NUMERIC,
            serde_json::json!({ "row": self.line, "column": column }),
        )
    }

    fn number(&self, column: &str) -> Result<f64, StructuredError> {
        self.text(column)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.invalid_numeric(column))
    }

    fn count(&self, column: &str) -> Result<u32, StructuredError> {
        self.text(column)
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(|| self.invalid_numeric(column))
    }

    fn sprint(&self) -> Result<Sprint, StructuredError> {
        Ok(Sprint {
            id: self
                .text(ID_COLUMN)
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            sprint_name: self.text("Sprint Name").unwrap_or_default(),
            sprint_link: self.text(LINK_COLUMN).unwrap_or_default(),
            business_days: self.count("Business Days")?,
            number_of_people: self.count("Number of People")?,
            working_hours: self.number("Working Hours")?,
            total_points_in_sprint: self.number("Total Points in Sprint")?,
            carry_over_points_total: self.number("Carry Over Points Total")?,
            carry_over_points_completed: self.number("Carry Over Points Completed")?,
            new_work_points: self.number("New Work Points")?,
            unplanned_points_brought_in: self.number("Unplanned Points Brought In")?,
            points_completed: self.number("Points Completed")?,
            planned_points: self.number("Planned Points")?,
            percent_complete: self.number("Percent Complete")?,
            velocity: self.number("Velocity")?,
            predicted_capacity: self.number("Predicted Capacity")?,
            created_at: self.text("Created At").unwrap_or_default(),
            updated_at: self.text("Updated At").unwrap_or_default(),
        })
    }
}

/// Decode CSV produced by [`encode_csv`].
///
/// Columns are located by header name, so extra columns are tolerated. The
/// exported columns carry neither `id` nor `sprintLink`: without `ID` and
/// `Sprint Link` columns each row gets a fresh id and an empty link.
pub fn decode_csv(text: &str) -> Result<Vec<Sprint>, StructuredError> {
    let records = parse_records(text.trim_start_matches('\u{feff}'));

    if records.len() < 2 {
        return Err(corrupt(
            "Invalid CSV format: expected a header row and at least one data row".to_string(),
            reasons::FORMAT,
            serde_json::json!({ "lines": records.len() }),
        ));
    }

    let header = &records[0];
    let columns: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim(), i))
        .collect();

    if let Some(missing) = CSV_HEADERS.iter().find(|h| !columns.contains_key(*h)) {
        return Err(corrupt(
            format!("Invalid CSV format: missing column '{}'", missing),
            reasons::FORMAT,
            serde_json::json!({ "column": missing }),
        ));
    }

    let mut sprints = Vec::with_capacity(records.len() - 1);
    for (index, cells) in records[1..].iter().enumerate() {
        let line = index + 2;
        if cells.len() < header.len() {
            return Err(corrupt(
                format!(
                    "Row {} has insufficient columns: expected {}, found {}",
                    line,
                    header.len(),
                    cells.len()
                ),
                reasons::COLUMNS,
                serde_json::json!({ "row": line, "expected": header.len(), "found": cells.len() }),
            ));
        }

        let row = Row {
            line,
            cells,
            columns: &columns,
        };
        sprints.push(row.sprint()?);
    }

    tracing::debug!(rows = sprints.len(), "Decoded CSV");
    Ok(sprints)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprint(name: &str) -> Sprint {
        Sprint {
            id: "s-1".to_string(),
            sprint_name: name.to_string(),
            sprint_link: String::new(),
            business_days: 10,
            number_of_people: 4,
            working_hours: 52.0,
            total_points_in_sprint: 30.0,
            carry_over_points_total: 5.0,
            carry_over_points_completed: 3.0,
            new_work_points: 25.0,
            unplanned_points_brought_in: 2.5,
            points_completed: 25.0,
            planned_points: 30.0,
            percent_complete: 25.0 / 30.0 * 100.0,
            velocity: 25.0 / 52.0,
            predicted_capacity: 0.1 + 0.2,
            created_at: "2024-01-15T10:30:00.000Z".to_string(),
            updated_at: "2024-01-16T08:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_empty_input_returns_sentinel() {
        assert_eq!(encode_csv(&[]), "No data to export");
    }

    #[test]
    fn test_header_and_quoting() {
        let csv = encode_csv(&[sprint("Sprint 1, \"Alpha\"")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"Sprint 1, \"\"Alpha\"\"\",10,4,52,"));
        assert!(row.ends_with(",\"2024-01-15T10:30:00.000Z\",\"2024-01-16T08:00:00.000Z\""));
    }

    #[test]
    fn test_round_trip_keeps_exported_fields() {
        let original = vec![sprint("Sprint, with comma"), sprint("Line\nbreak")];
        let decoded = decode_csv(&encode_csv(&original)).unwrap();
        assert_eq!(decoded.len(), 2);
        for (before, after) in original.iter().zip(&decoded) {
            let after = Sprint {
                id: before.id.clone(),
                ..after.clone()
            };
            assert_eq!(&after, before);
        }
    }

    #[test]
    fn test_crlf_and_extra_columns() {
        let mut header = CSV_HEADERS.join(",");
        header.push_str(",ID,Sprint Link");
        let text = format!(
            "{}\r\n\"S1\",10,4,52,30,5,3,25,2,25,30,83.3,0.48,0,\"a\",\"b\",\"id-9\",\"https://x.io\"\r\n\r\n",
            header
        );
        let decoded = decode_csv(&text).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, "id-9");
        assert_eq!(decoded[0].sprint_link, "https://x.io");
        assert_eq!(decoded[0].percent_complete, 83.3);
    }

    #[test]
    fn test_header_only_is_invalid_format() {
        let err = decode_csv(&CSV_HEADERS.join(",")).unwrap_err();
        assert!(err.message().starts_with("Invalid CSV format"));
        assert_eq!(err.details().unwrap()["reason"], reasons::FORMAT);

        let err = decode_csv("").unwrap_err();
        assert!(err.message().starts_with("Invalid CSV format"));
    }

    #[test]
    fn test_short_row_has_insufficient_columns() {
        let text = format!("{}\n\"S1\",10,4", CSV_HEADERS.join(","));
        let err = decode_csv(&text).unwrap_err();
        assert!(err.message().contains("insufficient columns"));
        assert_eq!(err.details().unwrap()["reason"], reasons::COLUMNS);
    }

    #[test]
    fn test_non_numeric_column_rejected() {
        let text = format!(
            "{}\n\"S1\",ten,4,52,30,5,3,25,2,25,30,83.3,0.48,0,\"a\",\"b\"",
            CSV_HEADERS.join(",")
        );
        let err = decode_csv(&text).unwrap_err();
        assert!(err
            .message()
            .contains("Required numeric fields are missing or invalid"));
        assert_eq!(err.details().unwrap()["column"], "Business Days");
    }

    #[test]
    fn test_infinite_numbers_rejected() {
        for cell in ["inf", "-infinity", "NaN"] {
            let text = format!(
                "{}\n\"S1\",10,4,{},30,5,3,25,2,25,30,83.3,0.48,0,\"a\",\"b\"",
                CSV_HEADERS.join(","),
                cell
            );
            let err = decode_csv(&text).unwrap_err();
            assert_eq!(err.details().unwrap()["reason"], reasons::NUMERIC);
            assert_eq!(err.details().unwrap()["column"], "Working Hours");
        }
    }

    #[test]
    fn test_round_trip_drops_id_and_link() {
        let original = Sprint {
            sprint_link: "https://tracker.example.com/1".to_string(),
            ..sprint("Sprint 1")
        };
        let decoded = decode_csv(&encode_csv(&[original.clone()])).unwrap();

        assert_ne!(decoded[0].id, original.id);
        assert!(!decoded[0].id.is_empty());
        assert_eq!(decoded[0].sprint_link, "");
        assert_eq!(decoded[0].sprint_name, original.sprint_name);
    }

    #[test]
    fn test_parse_records_quoted_commas() {
        let records = parse_records("a,\"b,c\",d\n\"x\"\"y\",,z");
        assert_eq!(records[0], vec!["a", "b,c", "d"]);
        assert_eq!(records[1], vec!["x\"y", "", "z"]);
    }
}
