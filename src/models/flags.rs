//! Flag map plus every flag-name convention in one place. Chart state,
//! node state and hotspot state all persist as plain booleans in the same
//! map, so their names must never be derived anywhere else.

use crate::models::types::{HotspotState, RoomId};
use std::collections::BTreeMap;

pub type Flags = BTreeMap<String, bool>;

/// Missing flags read as false.
#[inline]
pub fn is_set(flags: &Flags, name: &str) -> bool {
    flags.get(name).copied().unwrap_or(false)
}

/// Overwrite-merge; applying the same update twice is a no-op.
pub fn merge(flags: &mut Flags, update: &Flags) {
    for (k, v) in update {
        flags.insert(k.clone(), *v);
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `${hotspotId}${Capitalized(state)}`, e.g. `doorOpen`.
pub fn hotspot_state_flag(hotspot_id: &str, state: HotspotState) -> String {
    format!("{}{}", hotspot_id, capitalize(state.as_str()))
}

/// Set once a pickup hotspot has been taken, e.g. `keyTaken`.
pub fn taken_flag(hotspot_id: &str) -> String {
    format!("{}Taken", hotspot_id)
}

/// Linear interaction chart state presence.
pub fn chart_state_flag(room_id: &RoomId, state_id: &str) -> String {
    format!("chartState:{}:{}", room_id, state_id)
}

/// Parallel chart node state presence.
pub fn chart_node_flag(room_id: &RoomId, node_id: &str, state_id: &str) -> String {
    format!("chartNode:{}:{}:{}", room_id, node_id, state_id)
}

/// Generic chart state presence.
pub fn generic_state_flag(room_id: &RoomId, chart_id: &str, state_id: &str) -> String {
    format!("genericChart:{}:{}:{}", room_id, chart_id, state_id)
}

/// Flag updates that leave exactly `active` true among `states`.
pub fn exclusive_update<'a, I, F>(states: I, active: &str, name: F) -> Flags
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> String,
{
    let mut out = Flags::new();
    for s in states {
        out.insert(name(s), s == active);
    }
    out.insert(name(active), true);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_conventions() {
        let room = RoomId::from("room1");
        assert_eq!(hotspot_state_flag("door", HotspotState::Broken), "doorBroken");
        assert_eq!(taken_flag("key"), "keyTaken");
        assert_eq!(chart_state_flag(&room, "idle"), "chartState:room1:idle");
        assert_eq!(chart_node_flag(&room, "lamp", "on"), "chartNode:room1:lamp:on");
        assert_eq!(generic_state_flag(&room, "c", "s"), "genericChart:room1:c:s");
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("open"), "Open");
        assert_eq!(capitalize("émigré"), "Émigré");
    }

    #[test]
    fn merge_is_idempotent() {
        let mut a: Flags = [("x".to_string(), true), ("y".to_string(), false)].into();
        let upd: Flags = [("y".to_string(), true), ("z".to_string(), false)].into();
        merge(&mut a, &upd);
        let once = a.clone();
        merge(&mut a, &upd);
        assert_eq!(a, once);
        assert!(is_set(&a, "y"));
        assert!(!is_set(&a, "missing"));
    }

    #[test]
    fn exclusive_update_sets_exactly_one() {
        let upd = exclusive_update(["a", "b", "c"], "b", |s| format!("s:{s}"));
        assert_eq!(upd.values().filter(|v| **v).count(), 1);
        assert_eq!(upd.get("s:b"), Some(&true));
        assert_eq!(upd.get("s:a"), Some(&false));
    }
}
