pub mod extract;
pub mod fetch;

pub use extract::extract_zip;
pub use fetch::{fetch_dataset, DatasetSource};
