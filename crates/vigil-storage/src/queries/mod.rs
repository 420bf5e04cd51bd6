//! SQL per concern: company resolution, run insert/read, triggered rules.

pub mod company_ops;
pub mod run_insert;
pub mod run_read;
pub mod triggered_rules;
