//! Command tables for each node type
//!
//! Wire names are parsed once into an enum; handlers dispatch with an
//! exhaustive `match`, so adding a command without a handler fails to compile.

use std::fmt;

/// Commands accepted by a GPIO device node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    /// Energize the output
    On,
    /// De-energize the output
    Off,
    /// Re-report drivers
    Query,
}

impl DeviceCommand {
    /// Every accepted command, in nodedef order
    pub const ALL: [Self; 3] = [Self::On, Self::Off, Self::Query];

    /// Wire name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::On => "DON",
            Self::Off => "DOF",
            Self::Query => "QUERY",
        }
    }

    /// Look up a wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Commands accepted by the controller node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerCommand {
    /// Create every catalog node not yet registered
    CreateNew,
    /// Look for devices outside the catalog
    Discover,
    /// Push profile files to the supervisor
    UpdateProfile,
    /// Clear all notices
    RemoveNotices,
    /// Re-report drivers
    Query,
}

impl ControllerCommand {
    /// Every accepted command, in nodedef order
    pub const ALL: [Self; 5] = [
        Self::CreateNew,
        Self::Discover,
        Self::UpdateProfile,
        Self::RemoveNotices,
        Self::Query,
    ];

    /// Wire name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateNew => "CREATE_NEW",
            Self::Discover => "DISCOVER",
            Self::UpdateProfile => "UPDATE_PROFILE",
            Self::RemoveNotices => "REMOVE_NOTICES",
            Self::Query => "QUERY",
        }
    }

    /// Look up a wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for ControllerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
