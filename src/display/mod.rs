//! Display formatting for terminal output
//!
//! Provides utilities for formatting audit records, policy state and type
//! listings for the terminal.

pub mod policy;
pub mod record;

pub use policy::{format_policy, format_type_list};
pub use record::{format_record_details, format_record_list};
