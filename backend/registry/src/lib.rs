//! # Registry
//!
//! Records shared between the lost-and-found server and its clients.
//!
//! ## Contents
//!
//! - Student directory loaded from `students.csv`: student number to display name
//! - Found items, their filters and the two-step edit check
//! - Claim receipts, claimed items and ownership appeals
//! - Remote helpers that fetch the above over HTTP
//!
//! ## Notes
//!
//! - Nothing here is persisted. The server keeps every record in memory.
//! - Wire names are camelCase so the existing kiosk pages keep working.
//! - Passwords only ever travel inbound. No serialized record carries one.
pub mod claims;
pub mod items;
pub mod remote;
pub mod students;

pub use claims::{
    AppealError, AppealRequest, AppealTicket, ClaimReceipt, ClaimedItem, file_appeal,
};
pub use items::{
    EditCredentials, EditError, FormError, FoundItemForm, Item, ItemEdit, ItemFilter,
    normalize_name,
};
pub use students::StudentDirectory;
