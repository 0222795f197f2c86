//! Hand-written SQL behind the service layer. All queries are runtime
//! checked and take the shared pool; transactions are opened only where a
//! write spans multiple statements.

pub mod customers;
pub mod follow_ups;
pub mod products;
pub mod reminders;
pub mod roles;
pub mod sold_products;
pub mod users;
