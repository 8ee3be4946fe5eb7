pub mod error;
pub mod helpers;
pub mod letter_sender;
pub mod models;
pub mod run_tool;
pub mod validation;
