//! Customer bulk-import pipeline. A CSV or Excel upload is decoded into a
//! grid of strings, the header row is matched against the known column
//! aliases, and each data row either yields a customer or a row error.
//! Structural problems (wrong format, unreadable file, missing required
//! column) abort the whole import instead.

use std::io::Cursor;
use std::str::FromStr;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::models::customer::NewCustomer;

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub customers: Vec<NewCustomer>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Email,
    MobileNumber,
    Location,
    InsuranceType,
    Income,
    SourceOfIncome,
    FamilyMembers,
}

/// Columns a file must carry to be importable, in the order the
/// per-row "first missing field" error reports them.
const REQUIRED_COLUMNS: &[(Column, &str)] = &[
    (Column::Name, "Name"),
    (Column::Email, "Email"),
    (Column::MobileNumber, "MobileNumber"),
];

/// Lowercased with whitespace, underscores and dashes stripped, so
/// "Mobile No", "mobile_number" and "MobileNumber" all land on the same
/// column.
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn column_for(normalized: &str) -> Option<Column> {
    match normalized {
        "name" | "customername" | "fullname" => Some(Column::Name),
        "email" | "emailaddress" | "mail" => Some(Column::Email),
        "mobile" | "mobilenumber" | "mobileno" | "phonenumber" | "phone" | "contactnumber" => {
            Some(Column::MobileNumber)
        }
        "location" | "city" | "area" => Some(Column::Location),
        "insurancetype" | "insurance" => Some(Column::InsuranceType),
        "income" => Some(Column::Income),
        "sourceofincome" | "sourceincome" | "incomesource" => Some(Column::SourceOfIncome),
        "familymembers" | "familymember" | "familycount" | "family" => {
            Some(Column::FamilyMembers)
        }
        _ => None,
    }
}

pub fn parse_customers(file_name: &str, bytes: &[u8]) -> AppResult<ImportOutcome> {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let grid = match extension.as_str() {
        "csv" => read_csv(bytes)?,
        "xlsx" | "xls" => read_workbook(bytes)?,
        _ => {
            return Err(AppError::Import(
                "Unsupported file format. Please upload a CSV or Excel file.".to_string(),
            ))
        }
    };
    parse_grid(grid)
}

fn read_csv(bytes: &[u8]) -> AppResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|err| AppError::Import(format!("Unable to read the CSV file: {}", err)))?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(rows)
}

fn read_workbook(bytes: &[u8]) -> AppResult<Vec<Vec<String>>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|err| AppError::Import(format!("Unable to read the Excel file: {}", err)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Import("The workbook has no sheets.".to_string()))?
        .map_err(|err| AppError::Import(format!("Unable to read the Excel file: {}", err)))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        // Whole numbers (phone-ish columns) must not render as floats
        Data::Float(value) if value.fract() == 0.0 => format!("{}", *value as i64),
        other => other.to_string(),
    }
}

fn parse_grid(rows: Vec<Vec<String>>) -> AppResult<ImportOutcome> {
    let mut iter = rows.into_iter();
    let header = iter
        .next()
        .ok_or_else(|| AppError::Import("The uploaded file is empty.".to_string()))?;

    // Map each known column to its position in this file
    let mut positions: Vec<(Column, usize)> = Vec::new();
    for (index, cell) in header.iter().enumerate() {
        if let Some(column) = column_for(&normalize_header(cell)) {
            if !positions.iter().any(|(c, _)| *c == column) {
                positions.push((column, index));
            }
        }
    }
    for (column, label) in REQUIRED_COLUMNS {
        if !positions.iter().any(|(c, _)| c == column) {
            return Err(AppError::Import(format!(
                "Missing required column '{}'.",
                label
            )));
        }
    }

    let field = |row: &[String], column: Column| -> String {
        positions
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, index)| row.get(*index))
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default()
    };

    let mut outcome = ImportOutcome::default();
    // The header is row 1
    let mut row_number = 1usize;
    for row in iter {
        row_number += 1;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut missing = None;
        for (column, label) in REQUIRED_COLUMNS {
            if field(&row, *column).is_empty() {
                missing = Some(*label);
                break;
            }
        }
        if let Some(label) = missing {
            outcome
                .errors
                .push(format!("Row {}: {} is required.", row_number, label));
            continue;
        }

        let income_text = field(&row, Column::Income);
        let income = match parse_income(&income_text) {
            Ok(value) => value,
            Err(()) => {
                outcome.errors.push(format!(
                    "Row {}: Income value '{}' is invalid.",
                    row_number, income_text
                ));
                continue;
            }
        };

        let family_text = field(&row, Column::FamilyMembers);
        let family_members = match parse_family_members(&family_text) {
            Ok(value) => value,
            Err(()) => {
                outcome.errors.push(format!(
                    "Row {}: Family members value '{}' is invalid.",
                    row_number, family_text
                ));
                continue;
            }
        };

        outcome.customers.push(NewCustomer {
            name: field(&row, Column::Name),
            email: field(&row, Column::Email),
            mobile_number: field(&row, Column::MobileNumber),
            location: field(&row, Column::Location),
            insurance_type: optional(field(&row, Column::InsuranceType)),
            income,
            source_of_income: optional(field(&row, Column::SourceOfIncome)),
            family_members,
        });
    }

    Ok(outcome)
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_income(text: &str) -> Result<Option<Decimal>, ()> {
    if text.is_empty() {
        return Ok(None);
    }
    match Decimal::from_str(text) {
        Ok(value) if value >= Decimal::ZERO => Ok(Some(value)),
        _ => Err(()),
    }
}

fn parse_family_members(text: &str) -> Result<Option<i32>, ()> {
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<i32>() {
        Ok(value) if value >= 0 => Ok(Some(value)),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_csv(text: &str) -> AppResult<ImportOutcome> {
        parse_customers("upload.csv", text.as_bytes())
    }

    #[test]
    fn header_matching_ignores_case_and_separators() {
        for header in ["Mobile No", "mobile_number", "MOBILE-NUMBER", "phone"] {
            let csv = format!(
                "Name,Email,{}\nAsha,asha@example.com,9800000001\n",
                header
            );
            let outcome = parse_csv(&csv).unwrap();
            assert!(outcome.errors.is_empty(), "header {:?}", header);
            assert_eq!(outcome.customers[0].mobile_number, "9800000001");
        }
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_customers("upload.txt", b"Name,Email,Mobile\n").unwrap_err();
        assert!(matches!(err, AppError::Import(message)
            if message == "Unsupported file format. Please upload a CSV or Excel file."));
    }

    #[test]
    fn missing_required_column_fails_the_whole_file() {
        let err = parse_csv("Name,Location\nAsha,Mumbai\n").unwrap_err();
        assert!(matches!(err, AppError::Import(message)
            if message == "Missing required column 'Email'."));
    }

    #[test]
    fn blank_rows_are_skipped_silently() {
        let outcome = parse_csv(
            "Name,Email,Mobile\nAsha,asha@example.com,9800000001\n,,\nRavi,ravi@example.com,9800000002\n",
        )
        .unwrap();
        assert_eq!(outcome.customers.len(), 2);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn missing_required_field_yields_one_error_naming_the_first_gap() {
        // Both Name and Mobile are blank; only Name is reported
        let outcome = parse_csv("Name,Email,Mobile\n,asha@example.com,\n").unwrap();
        assert!(outcome.customers.is_empty());
        assert_eq!(outcome.errors, vec!["Row 2: Name is required."]);
    }

    #[test]
    fn row_numbers_count_the_header_as_row_one() {
        let outcome = parse_csv(
            "Name,Email,Mobile\nAsha,asha@example.com,9800000001\n,ravi@example.com,9800000002\n",
        )
        .unwrap();
        assert_eq!(outcome.errors, vec!["Row 3: Name is required."]);
    }

    #[test]
    fn invalid_income_is_a_row_error() {
        let outcome = parse_csv(
            "Name,Email,Mobile,Income\nAsha,asha@example.com,9800000001,lots\n",
        )
        .unwrap();
        assert!(outcome.customers.is_empty());
        assert_eq!(outcome.errors, vec!["Row 2: Income value 'lots' is invalid."]);
    }

    #[test]
    fn negative_family_members_is_a_row_error() {
        let outcome = parse_csv(
            "Name,Email,Mobile,Family Members\nAsha,asha@example.com,9800000001,-2\n",
        )
        .unwrap();
        assert_eq!(
            outcome.errors,
            vec!["Row 2: Family members value '-2' is invalid."]
        );
    }

    #[test]
    fn optional_fields_flow_through() {
        let outcome = parse_csv(
            "Name,Email,Mobile,Location,Insurance Type,Income,Source of Income,Family\n\
             Asha,asha@example.com,9800000001,Mumbai,Health,98000.50,Salary,4\n",
        )
        .unwrap();
        let customer = &outcome.customers[0];
        assert_eq!(customer.location, "Mumbai");
        assert_eq!(customer.insurance_type.as_deref(), Some("Health"));
        assert_eq!(customer.income, Some(Decimal::from_str("98000.50").unwrap()));
        assert_eq!(customer.source_of_income.as_deref(), Some("Salary"));
        assert_eq!(customer.family_members, Some(4));
    }

    #[test]
    fn empty_file_is_a_structural_error() {
        let err = parse_csv("").unwrap_err();
        assert!(matches!(err, AppError::Import(message)
            if message == "The uploaded file is empty."));
    }

    #[test]
    fn whole_number_cells_render_without_decimals() {
        assert_eq!(cell_text(&Data::Float(9800000001.0)), "9800000001");
        assert_eq!(cell_text(&Data::Float(98000.5)), "98000.5");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn a_bad_row_does_not_sink_the_good_ones() {
        let outcome = parse_csv(
            "Name,Email,Mobile\nAsha,asha@example.com,9800000001\n,bad@example.com,9800000002\nRavi,ravi@example.com,9800000003\n",
        )
        .unwrap();
        assert_eq!(outcome.customers.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
    }
}
