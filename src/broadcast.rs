//! Widget notification channels
//!
//! Applying a filter notifies widgets on named channels:
//!
//! ```text
//! filter<widget>            the filter constrains <widget>
//! filterAll                 the filter constrains every widget
//! updateFilterText<widget>  <widget> displays the filter chip
//! ```

use crate::filter::FilterDefinition;
use std::collections::HashMap;
use std::fmt;

/// A notification channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Filter(String),
    FilterAll,
    UpdateFilterText(String),
}

impl Channel {
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Filter(widget) => write!(f, "filter{widget}"),
            Channel::FilterAll => write!(f, "filterAll"),
            Channel::UpdateFilterText(widget) => write!(f, "updateFilterText{widget}"),
        }
    }
}

/// Fire-and-forget broadcast of filter changes
pub trait Broadcaster {
    fn broadcast(&mut self, channel: &Channel, filter: &FilterDefinition);
}

type Listener = Box<dyn FnMut(&FilterDefinition)>;

/// Handle returned by [`ChannelRegistry::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subscription registry keyed by channel name
#[derive(Default)]
pub struct ChannelRegistry {
    next_id: u64,
    listeners: HashMap<String, Vec<(SubscriptionId, Listener)>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        channel: impl Into<String>,
        listener: impl FnMut(&FilterDefinition) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(channel.into())
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Returns false when the subscription was not found.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for listeners in self.listeners.values_mut() {
            if let Some(pos) = listeners.iter().position(|(sid, _)| *sid == id) {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners.get(channel).map(Vec::len).unwrap_or(0)
    }
}

impl Broadcaster for ChannelRegistry {
    fn broadcast(&mut self, channel: &Channel, filter: &FilterDefinition) {
        let name = channel.name();
        match self.listeners.get_mut(&name) {
            Some(listeners) => {
                for (_, listener) in listeners.iter_mut() {
                    listener(filter);
                }
            }
            None => tracing::trace!("No listeners on channel '{name}'"),
        }
    }
}

impl fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("next_id", &self.next_id)
            .field("channels", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}
