//! Calendar metadata and the aggregator's input batch.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// A calendar from the provider's calendar list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
    /// Hex color like "#4285f4"
    pub color: String,
    pub primary: bool,
}

/// Raw events fetched for one calendar, prior to filtering
#[derive(Debug, Clone)]
pub struct CalendarEvents {
    pub calendar: Calendar,
    pub events: Vec<Event>,
}
