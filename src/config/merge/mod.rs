//! Merge policy and service for config composition.

pub mod service;
