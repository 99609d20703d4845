//! Runtime permission and adapter state queries

use std::fmt;

/// Runtime permissions required for tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    FineLocation,
    BluetoothScan,
    BluetoothConnect,
}

impl Permission {
    /// Everything `begin_tracking` needs
    pub const REQUIRED: [Permission; 3] = [
        Permission::FineLocation,
        Permission::BluetoothScan,
        Permission::BluetoothConnect,
    ];
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::FineLocation => write!(f, "ACCESS_FINE_LOCATION"),
            Permission::BluetoothScan => write!(f, "BLUETOOTH_SCAN"),
            Permission::BluetoothConnect => write!(f, "BLUETOOTH_CONNECT"),
        }
    }
}

/// Platform state checked before any subscription is attempted
pub trait PlatformStatus: Send + Sync {
    fn is_permission_granted(&self, permission: Permission) -> bool;

    fn is_bluetooth_enabled(&self) -> bool;

    /// Required permissions that are currently missing
    fn missing_permissions(&self) -> Vec<Permission> {
        Permission::REQUIRED
            .iter()
            .copied()
            .filter(|p| !self.is_permission_granted(*p))
            .collect()
    }
}
