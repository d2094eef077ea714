//! SeaORM entity definitions for the mirrored collections.

pub mod comment;
pub mod commit;
pub mod contributor;
pub mod issue;
pub mod prelude;
pub mod pull_request;
pub mod repository;
