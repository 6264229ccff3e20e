//! Destination selection and in-process fan-out.

use serde_json::Value;

use super::relay::RelayHandle;
use super::{flatten, Transmission};
use crate::error::{ManagerError, ManagerResult};

/// Custom destination: called once per transmission unit.
pub type TransmitFn = Box<dyn FnMut(&Transmission)>;

/// Wildcard listener: called once per change with the widget id and raw value.
pub type WildcardFn = Box<dyn FnMut(&str, &Value)>;

/// Where transmission units go.
pub enum Destination {
    /// In-process subscribers registered with `TransmitHub::on`.
    Local,
    /// Queued to a relay worker.
    Relay(RelayHandle),
    /// An application-supplied function.
    Custom(TransmitFn),
}

impl Destination {
    /// Short name of the destination kind.
    pub fn name(&self) -> &'static str {
        match self {
            Destination::Local => "js",
            Destination::Relay(_) => "relay",
            Destination::Custom(_) => "custom",
        }
    }

    /// Builds a built-in destination from its short name.
    ///
    /// `js`/`local` need nothing; `ajax`, `relay`, and `node` need an endpoint.
    pub fn from_name(name: &str, endpoint: Option<&str>) -> ManagerResult<Self> {
        match name {
            "js" | "local" => Ok(Destination::Local),
            "ajax" | "relay" | "node" => {
                let endpoint = endpoint
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| ManagerError::MissingRelayEndpoint(name.to_string()))?;
                Ok(Destination::Relay(RelayHandle::connect(endpoint)?))
            }
            _ => Err(ManagerError::UnknownDestination(name.to_string())),
        }
    }
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Relay(relay) => write!(f, "Relay({})", relay.endpoint()),
            other => f.write_str(other.name()),
        }
    }
}

struct Subscriber {
    widget: String,
    /// Event name, or `*` for every event of the widget.
    event: String,
    callback: TransmitFn,
}

/// Holds the active destination and all in-process listeners.
pub struct TransmitHub {
    destination: Destination,
    subscribers: Vec<Subscriber>,
    wildcard: Vec<WildcardFn>,
}

impl TransmitHub {
    pub fn new() -> Self {
        Self {
            destination: Destination::Local,
            subscribers: Vec::new(),
            wildcard: Vec::new(),
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Replaces the destination. A replaced relay stops without waiting on its queue.
    pub fn set_destination(&mut self, destination: Destination) {
        tracing::info!(destination = ?destination, "transmission destination changed");
        self.destination = destination;
    }

    /// Selects a built-in destination by short name.
    pub fn sends_to(&mut self, name: &str, endpoint: Option<&str>) -> ManagerResult<()> {
        let destination = Destination::from_name(name, endpoint)?;
        self.set_destination(destination);
        Ok(())
    }

    /// Subscribes to `event` of `widget` on the local destination.
    pub fn on<F>(&mut self, widget: impl Into<String>, event: impl Into<String>, callback: F)
    where
        F: FnMut(&Transmission) + 'static,
    {
        self.subscribers.push(Subscriber {
            widget: widget.into(),
            event: event.into(),
            callback: Box::new(callback),
        });
    }

    /// Subscribes to every change of every widget, whatever the destination.
    pub fn on_any<F>(&mut self, callback: F)
    where
        F: FnMut(&str, &Value) + 'static,
    {
        self.wildcard.push(Box::new(callback));
    }

    /// Sends a widget's changed value.
    ///
    /// Returns the number of units handed to the destination.
    pub fn transmit(&mut self, widget: &str, data: &Value) -> usize {
        let units = flatten(widget, data);
        let count = units.len();
        tracing::debug!(widget, units = count, destination = self.destination.name(), "transmit");

        for unit in units {
            match &mut self.destination {
                Destination::Local => {
                    for subscriber in self.subscribers.iter_mut().filter(|s| {
                        s.widget == unit.widget && (s.event == "*" || s.event == unit.event)
                    }) {
                        (subscriber.callback)(&unit);
                    }
                }
                Destination::Relay(relay) => relay.send_lossy(unit),
                Destination::Custom(callback) => callback(&unit),
            }
        }

        for listener in self.wildcard.iter_mut() {
            listener(widget, data);
        }
        count
    }
}

impl Default for TransmitHub {
    fn default() -> Self {
        Self::new()
    }
}
