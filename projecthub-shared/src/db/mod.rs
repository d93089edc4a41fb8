/// Database layer: connection pooling and schema migrations
///
/// Table access lives with each model in [`crate::models`].
pub mod migrations;
pub mod pool;
