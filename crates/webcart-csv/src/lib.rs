//! WooCommerce-style catalog export: parent and variation CSV payloads
//! with RFC4180 escaping and dynamic attribute columns.

pub mod catalog;
pub mod field;

pub use catalog::{parent_csv, variation_csv};
pub use field::{csv_field, csv_row};
