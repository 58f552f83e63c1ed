pub mod program;
pub mod query;
pub mod span;
