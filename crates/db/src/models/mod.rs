pub mod report;

pub use report::{ListArgs, ReportRow, SortColumn, SortOrder, StoredReportFile};
