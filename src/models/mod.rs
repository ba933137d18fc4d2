pub mod report;
pub mod session;

pub use report::{IssueKind, Location, Report, ReportStatus};
pub use session::Session;
