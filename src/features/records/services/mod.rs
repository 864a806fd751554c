pub mod paginator;
mod record_service;
pub mod validator;

pub use record_service::{Outcome, RecordService};
