//! YaMDb - A review aggregation service
//!
//! This library provides titles, categories and genres, user reviews with an
//! aggregated rating, comments on reviews, and email confirmation-code
//! authentication behind a JSON API.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod permissions;
pub mod services;
