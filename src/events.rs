use crate::error::{Error, Result};

/// An official WCA event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WcaEvent {
    pub id: &'static str,
    pub name: &'static str,
}

pub const DEFAULT_EVENT: &str = "333";

pub static WCA_EVENTS: [WcaEvent; 16] = [
    WcaEvent { id: "333", name: "3x3x3 Cube" },
    WcaEvent { id: "222", name: "2x2x2 Cube" },
    WcaEvent { id: "444", name: "4x4x4 Cube" },
    WcaEvent { id: "555", name: "5x5x5 Cube" },
    WcaEvent { id: "666", name: "6x6x6 Cube" },
    WcaEvent { id: "777", name: "7x7x7 Cube" },
    WcaEvent { id: "333bf", name: "3x3x3 Blindfolded" },
    WcaEvent { id: "333fm", name: "3x3x3 Fewest Moves" },
    WcaEvent { id: "333oh", name: "3x3x3 One-Handed" },
    WcaEvent { id: "clock", name: "Clock" },
    WcaEvent { id: "minx", name: "Megaminx" },
    WcaEvent { id: "pyram", name: "Pyraminx" },
    WcaEvent { id: "skewb", name: "Skewb" },
    WcaEvent { id: "sq1", name: "Square-1" },
    WcaEvent { id: "444bf", name: "4x4x4 Blindfolded" },
    WcaEvent { id: "555bf", name: "5x5x5 Blindfolded" },
];

pub fn find_event(id: &str) -> Option<&'static WcaEvent> {
    WCA_EVENTS.iter().find(|e| e.id == id)
}

/// Like `find_event`, but an unknown id is an error
pub fn require_event(id: &str) -> Result<&'static WcaEvent> {
    find_event(id).ok_or_else(|| Error::UnknownEvent(id.to_string()))
}

/// Display name for an id, falling back to the id itself
pub fn event_name(id: &str) -> &str {
    find_event(id).map_or(id, |e| e.name)
}

fn position(id: &str) -> usize {
    WCA_EVENTS.iter().position(|e| e.id == id).unwrap_or(0)
}

/// The event after `id` in catalog order, wrapping around
pub fn next_event(id: &str) -> &'static WcaEvent {
    &WCA_EVENTS[(position(id) + 1) % WCA_EVENTS.len()]
}

/// The event before `id` in catalog order, wrapping around
pub fn previous_event(id: &str) -> &'static WcaEvent {
    &WCA_EVENTS[(position(id) + WCA_EVENTS.len() - 1) % WCA_EVENTS.len()]
}
