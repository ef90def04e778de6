pub mod import;
pub mod kpi;
pub mod performance;
