use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub location: String,
    pub insurance_type: Option<String>,
    pub income: Option<Decimal>,
    pub source_of_income: Option<String>,
    pub family_members: Option<i32>,
    pub assigned_employee_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_date: DateTime<Utc>,
}

/// Customer list row with the assignee name joined in.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct CustomerWithAssignee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub location: String,
    pub insurance_type: Option<String>,
    pub income: Option<Decimal>,
    pub source_of_income: Option<String>,
    pub family_members: Option<i32>,
    pub assigned_employee_id: Option<Uuid>,
    pub assigned_employee_name: Option<String>,
    pub created_date: DateTime<Utc>,
}

/// Flattened for templates so they never touch Option fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerDisplay {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub location: String,
    pub insurance_type: String,
    pub income: String,
    pub source_of_income: String,
    pub family_members: String,
    pub assigned_employee_id: String,
    pub assigned_employee_name: String,
    pub is_assigned: bool,
    pub created_date: String,
}

impl From<CustomerWithAssignee> for CustomerDisplay {
    fn from(row: CustomerWithAssignee) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            mobile_number: row.mobile_number,
            location: row.location,
            insurance_type: row.insurance_type.unwrap_or_default(),
            income: row.income.map(|v| v.to_string()).unwrap_or_default(),
            source_of_income: row.source_of_income.unwrap_or_default(),
            family_members: row
                .family_members
                .map(|v| v.to_string())
                .unwrap_or_default(),
            is_assigned: row.assigned_employee_id.is_some(),
            assigned_employee_id: row
                .assigned_employee_id
                .map(|v| v.to_string())
                .unwrap_or_default(),
            assigned_employee_name: row
                .assigned_employee_name
                .unwrap_or_else(|| "Unassigned".to_string()),
            created_date: row.created_date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Data for a customer about to be created, from the form or the importer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub location: String,
    pub insurance_type: Option<String>,
    pub income: Option<Decimal>,
    pub source_of_income: Option<String>,
    pub family_members: Option<i32>,
}

/// Optional filters applied to the customer index on top of role scoping.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerFilter {
    pub search_term: Option<String>,
    pub location: Option<String>,
    pub insurance_type: Option<String>,
    pub assignment: Option<String>,
    pub flash: Option<String>,
    pub error: Option<String>,
}

impl CustomerFilter {
    fn non_blank(value: &Option<String>) -> Option<&str> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn search(&self) -> Option<&str> {
        Self::non_blank(&self.search_term)
    }

    pub fn location_filter(&self) -> Option<&str> {
        Self::non_blank(&self.location)
    }

    pub fn insurance_filter(&self) -> Option<&str> {
        Self::non_blank(&self.insurance_type)
    }

    /// Some(true) for "assigned", Some(false) for "unassigned", None otherwise.
    pub fn assigned_filter(&self) -> Option<bool> {
        match Self::non_blank(&self.assignment)? {
            v if v.eq_ignore_ascii_case("assigned") => Some(true),
            v if v.eq_ignore_ascii_case("unassigned") => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filter_fields_are_ignored() {
        let filter = CustomerFilter {
            search_term: Some("  ".to_string()),
            location: Some("Pune".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search(), None);
        assert_eq!(filter.location_filter(), Some("Pune"));
        assert_eq!(filter.assigned_filter(), None);
    }

    #[test]
    fn assignment_filter_parses_both_states() {
        let mut filter = CustomerFilter {
            assignment: Some("Assigned".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.assigned_filter(), Some(true));
        filter.assignment = Some("unassigned".to_string());
        assert_eq!(filter.assigned_filter(), Some(false));
        filter.assignment = Some("whatever".to_string());
        assert_eq!(filter.assigned_filter(), None);
    }

    #[test]
    fn display_flattens_missing_fields() {
        let display = CustomerDisplay::from(CustomerWithAssignee {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            mobile_number: "9800000001".to_string(),
            location: "Mumbai".to_string(),
            insurance_type: None,
            income: None,
            source_of_income: None,
            family_members: None,
            assigned_employee_id: None,
            assigned_employee_name: None,
            created_date: Utc::now(),
        });
        assert_eq!(display.insurance_type, "");
        assert_eq!(display.assigned_employee_name, "Unassigned");
        assert!(!display.is_assigned);
    }
}
