//! Form-submission relay: maps a site form to a spreadsheet row and appends it.

pub mod appender;
pub mod error;
pub mod form;
pub mod routes;

pub use appender::SheetAppender;
pub use error::SheetError;
pub use form::{FormSubmission, FormType};
