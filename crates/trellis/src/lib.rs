//! Trellis - a Kanban-style issue tracker.
//!
//! Issues move through four fixed columns (Open, In Progress, Review,
//! Closed). Storage is swappable behind [`storage::IssueStore`]: a
//! process-local in-memory store or a remote tabular records API.
//!
//! The crate provides both the `trellis` CLI and the library it is built
//! on: the [`transition`] recorder, the [`filter`] engine and the
//! [`board`] projector.

#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod filter;
pub mod storage;
pub mod transition;

pub mod board;

// Public CLI module (needed by binary)
pub mod cli;

pub mod app;
pub mod commands;
pub mod output;
