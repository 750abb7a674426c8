mod operation;
mod report_app;

pub use operation::ReportOperation;
pub use report_app::ReportApp;
