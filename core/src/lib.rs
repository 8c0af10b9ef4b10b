//! Promotion bonus engine: reconciles a wager report and a deposit report
//! into a per-user bonus table.

pub mod config;
pub mod deposit;
pub mod eligibility;
pub mod error;
pub mod event;
pub mod identity;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod source;
pub mod types;
pub mod wager;
