pub mod llm;
pub mod normalize;
pub mod text_extract;

pub use normalize::{normalize_tests, payload_sex};
pub use text_extract::{clean_report_text, extract_test_items};
