//! Error types for the widget manager.

/// Convenience result alias used across the crate.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors produced by the widget manager and its collaborators.
///
/// Creating a widget with an empty type, or transforming a surface that is
/// already registered, are not errors: those calls return `Ok(None)`.
#[derive(thiserror::Error, Debug)]
pub enum ManagerError {
    /// No factory is registered for the requested widget type.
    #[error("unknown widget type: {0}")]
    UnknownWidgetType(String),

    /// A factory with the same type name is already in the catalog.
    #[error("widget type '{0}' is already registered")]
    DuplicateWidgetType(String),

    /// No widget is registered under the given identifier.
    #[error("unknown widget: {0}")]
    UnknownWidget(String),

    /// The short name does not match a built-in transmission destination.
    #[error("unknown transmission destination: {0}")]
    UnknownDestination(String),

    /// A relay destination was selected without an endpoint.
    #[error("destination '{0}' requires an endpoint")]
    MissingRelayEndpoint(String),

    /// The relay worker thread could not be started.
    #[error("relay worker failed to start: {0}")]
    RelaySpawn(std::io::Error),

    /// File I/O error while reading or writing a layout.
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The layout file was written by a newer format version.
    #[error("incompatible layout version: found {found}, expected <= {expected}")]
    IncompatibleLayout { found: u32, expected: u32 },
}

impl ManagerError {
    pub fn unknown_widget_type(name: impl Into<String>) -> Self {
        Self::UnknownWidgetType(name.into())
    }

    pub fn unknown_widget(id: impl Into<String>) -> Self {
        Self::UnknownWidget(id.into())
    }
}
