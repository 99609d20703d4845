//! Common API types and data structures

use crate::hardware::{LocationError, Permission, RangingError};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, TrackingError>;

/// Errors surfaced to the caller of the tracking API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    /// Runtime permissions were not granted
    #[error("missing permissions: {}", format_permissions(.0))]
    PermissionDenied(Vec<Permission>),
    /// The Bluetooth adapter is switched off
    #[error("bluetooth is disabled")]
    BluetoothDisabled,
    /// Several preconditions failed at once
    #[error("tracking preconditions not met: {}", format_permissions(.missing_permissions))]
    PreconditionsNotMet {
        missing_permissions: Vec<Permission>,
        bluetooth_enabled: bool,
    },
    #[error("ranging subsystem error: {0}")]
    Ranging(#[from] RangingError),
    #[error("location provider error: {0}")]
    Location(#[from] LocationError),
}

fn format_permissions(permissions: &[Permission]) -> String {
    if permissions.is_empty() {
        return "none".to_string();
    }
    permissions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lifecycle state of a session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Active => write!(f, "active"),
        }
    }
}

/// Liveness flag shared by a running session and the handler it installs.
///
/// Handlers publish while holding the read side. Once [`close`] returns,
/// no handler of this session is publishing and none will again.
///
/// [`close`]: SessionGuard::close
#[derive(Debug, Clone)]
pub(crate) struct SessionGuard(Arc<RwLock<bool>>);

impl SessionGuard {
    pub(crate) fn open() -> Self {
        SessionGuard(Arc::new(RwLock::new(true)))
    }

    /// Wait for in-flight handlers, then mark the session closed
    pub(crate) fn close(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = false;
    }

    /// Run `f` only while the session is open; `None` once closed
    pub(crate) fn run_if_open<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let open = self.0.read().unwrap_or_else(PoisonError::into_inner);
        if *open {
            Some(f())
        } else {
            None
        }
    }
}
