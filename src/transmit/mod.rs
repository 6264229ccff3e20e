//! Transmit module
//!
//! Routes widget value changes to the active output destination.
//! A changed value is flattened into `Transmission` units, one per leaf, and
//! every change is additionally announced to wildcard listeners in raw form.

mod hub;
mod relay;

pub use hub::{Destination, TransmitFn, TransmitHub, WildcardFn};
pub use relay::{
    write_json_line, RelayHandle, RelaySink, TcpRelaySink, DEFAULT_RELAY_BUFFER_SIZE,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event name used when a widget reports a bare number or string.
pub const SCALAR_EVENT: &str = "value";

/// One transmitted leaf value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transmission {
    /// Identifier of the widget that changed.
    pub widget: String,
    /// Event name: a key, or `key/subkey` for nested values.
    pub event: String,
    pub value: Value,
}

impl Transmission {
    pub fn new(widget: impl Into<String>, event: impl Into<String>, value: Value) -> Self {
        Self {
            widget: widget.into(),
            event: event.into(),
            value,
        }
    }

    /// Address in `/widget/event` form, as used on the wire.
    pub fn osc_path(&self) -> String {
        format!("/{}/{}", self.widget, self.event)
    }
}

/// Splits a widget value into transmission units.
///
/// - objects and arrays: one unit per entry; entries that are themselves
///   objects or arrays expand one more level as `key/subkey`, anything deeper
///   is forwarded whole
/// - numbers and strings: a single `value` unit
/// - null and booleans at the top level: nothing
pub fn flatten(widget: &str, data: &Value) -> Vec<Transmission> {
    match data {
        Value::Object(_) | Value::Array(_) => entries(data)
            .into_iter()
            .flat_map(|(key, value)| match value {
                Value::Object(_) | Value::Array(_) => entries(value)
                    .into_iter()
                    .map(|(inner, leaf)| {
                        Transmission::new(widget, format!("{key}/{inner}"), leaf.clone())
                    })
                    .collect::<Vec<_>>(),
                _ => vec![Transmission::new(widget, key, value.clone())],
            })
            .collect(),
        Value::Number(_) | Value::String(_) => {
            vec![Transmission::new(widget, SCALAR_EVENT, data.clone())]
        }
        Value::Null | Value::Bool(_) => Vec::new(),
    }
}

fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}
