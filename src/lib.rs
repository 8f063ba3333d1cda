//! Situational-awareness dashboard for geotagged incident reports.
//!
//! The crate is split into a backend-facing layer (`api`, `auth`,
//! `storage`), a synchronization core (`feed`, `chat`), and the
//! terminal front end (`app`, `ui`, `theme`).

pub mod api;
pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod feed;
pub mod storage;
pub mod theme;
pub mod ui;
