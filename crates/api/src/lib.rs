//! `nordjobs-api` — HTTP surface for the job sync service.
//!
//! Routes: the secret-guarded sync trigger and run history, the public apply
//! redirect, and a health probe. Everything else about the job board (page
//! rendering, admin UI) lives outside this service.

pub mod app;
pub mod config;
pub mod middleware;
pub mod routes;
