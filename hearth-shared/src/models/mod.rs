/// Data model for Hearth
///
/// Plain records plus the SQL that reads and writes them. Relationships are
/// explicit queries, never implicit graph walks.
///
/// # Models
///
/// - `household`: The tenant entity and its member views
/// - `user`: Accounts, soft deletion, public summaries
/// - `invitation`: Household invitations and their status machine

pub mod household;
pub mod invitation;
pub mod user;
