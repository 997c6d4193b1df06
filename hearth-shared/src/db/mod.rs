/// Database layer for Hearth
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded schema migrations
///
/// Queries themselves live with the records in [`crate::models`].

pub mod migrations;
pub mod pool;
