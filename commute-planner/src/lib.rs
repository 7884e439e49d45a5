//! Commute planner server.
//!
//! A web application that answers: "should I drive, or bike to the train,
//! and when do I need to leave?"

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod notify;
pub mod planner;
pub mod profile;
pub mod sources;
pub mod web;
