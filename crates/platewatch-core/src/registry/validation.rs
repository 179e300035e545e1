//! Common regex patterns for registry field validation.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Email pattern (whole string)
    pub static ref EMAIL: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();
}
