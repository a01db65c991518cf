pub mod analyze;
pub mod checks;
pub mod config;
pub mod models;
pub mod report;
pub mod source;

pub use analyze::{analyze, file_issues};
pub use report::Report;
pub use source::RepoSource;
