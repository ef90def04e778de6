mod generator;
mod issues;
mod ranking;
mod summary;

pub use generator::{ReportError, ReportGenerator, ReportSettings};
pub use issues::IssueThresholds;
pub use summary::{MemberScore, PartialCollection, WeeklyReport};
