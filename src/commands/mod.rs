pub mod comments;
pub mod report;
pub mod sources;
