//! HTTP front end for the cost estimator

pub mod api;
pub mod config;
