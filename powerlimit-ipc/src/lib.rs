// ABOUTME: Shared D-Bus names, bus selection and status types between the powerlimit daemon and its clients.
// ABOUTME: Defines the proxy trait front-ends use to read and toggle the power-limit switch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known bus name the daemon registers.
pub const BUS_NAME: &str = "org.lineageos.PowerLimit";

/// Object path the daemon interface is served at.
pub const OBJECT_PATH: &str = "/org/lineageos/PowerLimit";

/// Interface name of the daemon object.
pub const INTERFACE_NAME: &str = "org.lineageos.PowerLimit1";

/// Which message bus the daemon and its clients talk over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

impl BusKind {
    /// Open a connection to the selected bus.
    pub async fn connect(self) -> zbus::Result<zbus::Connection> {
        match self {
            BusKind::System => zbus::Connection::system().await,
            BusKind::Session => zbus::Connection::session().await,
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::System => write!(f, "system"),
            BusKind::Session => write!(f, "session"),
        }
    }
}

impl std::str::FromStr for BusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(BusKind::System),
            "session" => Ok(BusKind::Session),
            other => Err(format!("Unknown bus kind: {other}")),
        }
    }
}

/// Snapshot of the daemon's view of the power-limit switch, returned by `Describe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerLimitStatus {
    pub limited: bool,
    pub node_path: String,
    pub node_present: bool,
    #[serde(default)]
    pub last_error: String,
}

impl PowerLimitStatus {
    /// Human-readable on/off label for the switch.
    pub fn limited_label(&self) -> &'static str {
        on_off(self.limited)
    }
}

/// Render a switch value the way front-ends print it.
pub fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// D-Bus proxy for front-ends to communicate with the daemon.
///
/// The daemon implements the server side of this interface using
/// `zbus::interface` on a struct that owns the power-limit switch.
#[zbus::proxy(
    interface = "org.lineageos.PowerLimit1",
    default_service = "org.lineageos.PowerLimit",
    default_path = "/org/lineageos/PowerLimit"
)]
pub trait PowerLimit {
    /// Whether the power limit switch is currently checked.
    #[zbus(property)]
    fn limited(&self) -> zbus::Result<bool>;

    /// Path of the sysfs node the daemon drives.
    #[zbus(property)]
    fn node_path(&self) -> zbus::Result<String>;

    /// Whether the node exists. A missing node reads as "off".
    #[zbus(property)]
    fn node_present(&self) -> zbus::Result<bool>;

    /// Most recent write failure, empty when the last change succeeded.
    #[zbus(property)]
    fn last_error(&self) -> zbus::Result<String>;

    /// Request a new switch value. Returns whether the node accepted it.
    fn set_limited(&self, limited: bool) -> zbus::Result<bool>;

    /// Re-read the node and return the resulting switch value.
    fn refresh(&self) -> zbus::Result<bool>;

    /// Status snapshot as serialized JSON.
    fn describe(&self) -> zbus::Result<String>;

    /// Shut down the daemon process.
    fn quit(&self) -> zbus::Result<()>;
}
