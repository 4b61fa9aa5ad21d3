//! Serializations of pipeline output
//!
//! Weekly summaries are written twice, as a JSON array of snapshot records and as
//! a CSV table whose columns are the union of the record keys. Discovery's export
//! mode writes typed rows through the same CSV writer.

mod csv;
mod json;

pub use csv::generate as generate_csv;
pub use csv::generate_rows as generate_csv_rows;
pub use json::generate as generate_json;
