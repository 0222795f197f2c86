pub mod customer;
pub mod follow_up;
pub mod product;
pub mod user;

pub use customer::{Customer, CustomerDisplay, CustomerFilter};
pub use follow_up::{DueReminder, FollowUpDetail, FollowUpDisplay};
pub use product::{Product, ProductDisplay, ProductDocument, SoldProductInfo};
pub use user::{Role, RoleKind, RoleWithUserCount, User, UserDisplay};
