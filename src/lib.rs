//! HealthTrack - personal and family health records
//!
//! This library provides the core functionality for HealthTrack: accounts,
//! family members and their health records, served as HTML pages.

pub mod config;
pub mod db;
pub mod forms;
pub mod models;
pub mod services;
pub mod views;
pub mod web;
