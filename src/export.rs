//! Excel and PDF renditions of the user and customer lists, plus the CSV
//! template handed out for bulk uploads.

use std::env;

use anyhow::anyhow;
use genpdf::{elements, style, Element};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::{AppError, AppResult};
use crate::models::{CustomerDisplay, UserDisplay};

/// Header row of the downloadable import template. The importer accepts
/// looser spellings, but this is the canonical shape.
pub const CUSTOMER_TEMPLATE_CSV: &str =
    "Name,Email,MobileNumber,Location,InsuranceType,Income,SourceOfIncome\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn parse(value: Option<&str>) -> AppResult<Self> {
        match value.unwrap_or("excel").to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(AppError::Validation(format!(
                "Unknown export format '{}'.",
                other
            ))),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn file_name(self, stem: &str) -> String {
        match self {
            ExportFormat::Excel => format!("{}.xlsx", stem),
            ExportFormat::Pdf => format!("{}.pdf", stem),
        }
    }
}

const CUSTOMER_HEADERS: &[&str] = &[
    "Name",
    "Email",
    "Mobile",
    "Location",
    "Insurance Type",
    "Income",
    "Source of Income",
    "Family Members",
    "Assigned To",
];

const USER_HEADERS: &[&str] = &["Name", "Email", "Mobile", "Role", "Status"];

fn customer_cells(customer: &CustomerDisplay) -> Vec<&str> {
    vec![
        &customer.name,
        &customer.email,
        &customer.mobile_number,
        &customer.location,
        &customer.insurance_type,
        &customer.income,
        &customer.source_of_income,
        &customer.family_members,
        &customer.assigned_employee_name,
    ]
}

fn user_cells(user: &UserDisplay) -> Vec<String> {
    vec![
        user.name.clone(),
        user.email.clone(),
        user.mobile_text(),
        user.role_name.clone(),
        user.status_text().to_string(),
    ]
}

fn excel_sheet(
    sheet_name: &str,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(sheet_name)
        .map_err(|err| AppError::Internal(anyhow!("excel export failed: {}", err)))?;

    let bold = Format::new().set_bold();
    for (column, header) in headers.iter().enumerate() {
        sheet
            .write_with_format(0, column as u16, *header, &bold)
            .map_err(|err| AppError::Internal(anyhow!("excel export failed: {}", err)))?;
    }
    for (row_index, row) in rows.iter().enumerate() {
        for (column, cell) in row.iter().enumerate() {
            sheet
                .write_string(row_index as u32 + 1, column as u16, cell.as_str())
                .map_err(|err| AppError::Internal(anyhow!("excel export failed: {}", err)))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|err| AppError::Internal(anyhow!("excel export failed: {}", err)))
}

fn pdf_table(title: &str, headers: &[&str], rows: Vec<Vec<String>>) -> AppResult<Vec<u8>> {
    let font_dir = env::var("FONT_DIR").unwrap_or_else(|_| "./fonts".to_string());
    let font_family = genpdf::fonts::from_files(&font_dir, "Roboto", None)
        .map_err(|err| AppError::Internal(anyhow!("pdf fonts unavailable: {}", err)))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(title);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    doc.push(
        elements::Paragraph::new(title).styled(style::Style::new().bold().with_font_size(16)),
    );
    doc.push(elements::Break::new(1.5));

    let mut table = elements::TableLayout::new(vec![1; headers.len()]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let header_style = style::Style::new().bold();
    let mut header_row = table.row();
    for header in headers {
        header_row = header_row.element(elements::Paragraph::new(*header).styled(header_style));
    }
    header_row
        .push()
        .map_err(|err| AppError::Internal(anyhow!("pdf export failed: {}", err)))?;

    for row in rows {
        let mut table_row = table.row();
        for cell in row {
            table_row = table_row.element(elements::Paragraph::new(cell));
        }
        table_row
            .push()
            .map_err(|err| AppError::Internal(anyhow!("pdf export failed: {}", err)))?;
    }

    doc.push(table);

    let mut buffer = Vec::new();
    doc.render(&mut buffer)
        .map_err(|err| AppError::Internal(anyhow!("pdf export failed: {}", err)))?;
    Ok(buffer)
}

pub fn customers_excel(customers: &[CustomerDisplay]) -> AppResult<Vec<u8>> {
    let rows = customers
        .iter()
        .map(|c| customer_cells(c).into_iter().map(str::to_string).collect())
        .collect();
    excel_sheet("Customers", CUSTOMER_HEADERS, rows)
}

pub fn customers_pdf(customers: &[CustomerDisplay]) -> AppResult<Vec<u8>> {
    let rows = customers
        .iter()
        .map(|c| customer_cells(c).into_iter().map(str::to_string).collect())
        .collect();
    pdf_table("Customers", CUSTOMER_HEADERS, rows)
}

pub fn users_excel(users: &[UserDisplay]) -> AppResult<Vec<u8>> {
    let rows = users.iter().map(user_cells).collect();
    excel_sheet("Users", USER_HEADERS, rows)
}

pub fn users_pdf(users: &[UserDisplay]) -> AppResult<Vec<u8>> {
    let rows = users.iter().map(user_cells).collect();
    pdf_table("Users", USER_HEADERS, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn template_header_is_stable() {
        assert_eq!(
            CUSTOMER_TEMPLATE_CSV,
            "Name,Email,MobileNumber,Location,InsuranceType,Income,SourceOfIncome\n"
        );
    }

    #[test]
    fn format_parses_and_defaults_to_excel() {
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Excel);
        assert_eq!(
            ExportFormat::parse(Some("PDF")).unwrap(),
            ExportFormat::Pdf
        );
        assert!(ExportFormat::parse(Some("docx")).is_err());
    }

    #[test]
    fn excel_export_produces_a_workbook() {
        let users = vec![UserDisplay {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            mobile: None,
            role_id: Uuid::new_v4(),
            role_name: "Employee".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }];
        let bytes = users_excel(&users).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }
}
