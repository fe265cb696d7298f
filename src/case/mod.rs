pub mod reader;
pub mod types;

pub use reader::CaseReader;
pub use types::TestCase;
