pub mod formatter;
pub mod json;

pub use formatter::{ResponseFormat, ResponseFormatter};
