//! Retail metrics engine: batch computation of per-customer behavioral
//! metrics and tenant-wide product/discount/time analytics from
//! point-of-sale transaction facts.

pub mod affinity;
pub mod calendar;
pub mod config;
pub mod discount_analytics;
pub mod engine;
pub mod error;
pub mod facts;
pub mod lifecycle;
pub mod predictive;
pub mod product_analytics;
pub mod record;
pub mod rfm;
pub mod stats;
pub mod store;
pub mod temporal;
pub mod time_analytics;
pub mod types;
pub mod value;
