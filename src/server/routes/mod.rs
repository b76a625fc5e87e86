//! HTTP route handlers

pub mod serving;
