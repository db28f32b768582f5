pub mod listing;
pub mod service;

pub use listing::{account_stream, collect_unique, LIST_PAGE_SIZE};
pub use service::{AdminService, AdminUpdateOutcome, AdminUserUpdate};
