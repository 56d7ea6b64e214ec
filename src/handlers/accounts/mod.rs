pub mod claim;
pub mod create;
pub mod delete;
pub mod get;
pub mod payload;
pub mod scrub;
pub mod search;
pub mod update;
