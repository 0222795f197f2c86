//! Business rules on top of the repositories. Handlers call in here;
//! anything that is a pure decision lives as a plain function so it can
//! be tested without a database.

pub mod accounts;
pub mod customers;
pub mod dashboard;
pub mod follow_ups;
pub mod roles;
