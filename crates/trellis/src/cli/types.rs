//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::commands::init::BackendKind;
use crate::domain::{IssueStatus, Priority};

/// Issue status for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    /// Not started
    Open,
    /// Being worked on
    #[value(name = "in-progress", alias = "in_progress")]
    InProgress,
    /// Waiting for review
    Review,
    /// Done
    Closed,
}

impl std::fmt::Display for StatusArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", IssueStatus::from(*self).column_id())
    }
}

impl From<StatusArg> for IssueStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => IssueStatus::Open,
            StatusArg::InProgress => IssueStatus::InProgress,
            StatusArg::Review => IssueStatus::Review,
            StatusArg::Closed => IssueStatus::Closed,
        }
    }
}

/// Issue priority for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityArg {
    /// Can wait
    Low,
    /// Normal
    #[default]
    Medium,
    /// Soon
    High,
    /// Drop everything
    Critical,
}

impl std::fmt::Display for PriorityArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Priority::from(*self).key())
    }
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Critical => Priority::Critical,
        }
    }
}

/// Storage backend for `init`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendArg {
    /// Process-local store seeded with sample issues
    #[default]
    Memory,
    /// Remote records API
    Remote,
}

impl std::fmt::Display for BackendArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => BackendKind::Memory,
            BackendArg::Remote => BackendKind::Remote,
        }
    }
}
