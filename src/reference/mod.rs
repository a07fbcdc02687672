pub mod resolver;
pub mod table;

pub use resolver::*;
pub use table::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error(
        "Reference table must contain a test name column (test_name / test / name). Found: {}",
        .found.join(", ")
    )]
    MissingNameColumn { found: Vec<String> },

    #[error("Failed to read reference table {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
