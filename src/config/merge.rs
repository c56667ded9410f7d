//! Merge layer: defaults and override order.

pub mod merge_policy;
