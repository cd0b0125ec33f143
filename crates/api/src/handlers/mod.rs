pub mod actions;
pub mod reports;
