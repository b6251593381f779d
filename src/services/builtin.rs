//! Hardcoded per-verb behaviour for the demo content: one pickup hotspot,
//! one lockable door, a sign, and flavour text for everything else.

use crate::models::flags::{self, Flags};
use crate::models::inventory::InventoryItem;
use crate::models::room::Hotspot;
use crate::models::rules::ScriptResult;
use crate::models::types::{HotspotState, RoomId, Verb};
use crate::services::lines::{DialogueCatalog, fill_hotspot, fill_item, fill_item_and_hotspot, pick_random};

pub const PICKUP_HOTSPOT: &str = "key";
pub const PICKUP_ITEM_NAME: &str = "Key";
pub const DOOR_HOTSPOT: &str = "door";
pub const SIGN_HOTSPOT: &str = "sign";
pub const DEFAULT_NEXT_ROOM: &str = "room2";
pub const DEFAULT_WALK_PROMPT: &str = "You head that way.";

/// Selected item as seen by the built-in layer.
#[derive(Debug, Clone, Copy)]
pub struct HeldItem<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// Where the door leads.
pub fn next_room(door: &Hotspot) -> RoomId {
    door.target_room_id.clone().unwrap_or_else(|| RoomId::from(DEFAULT_NEXT_ROOM))
}

fn door_open(door: &Hotspot, f: &Flags) -> bool {
    flags::is_set(f, &door.state_flag(HotspotState::Open))
}

fn key_taken(f: &Flags) -> bool {
    flags::is_set(f, &flags::taken_flag(PICKUP_HOTSPOT))
}

/// Walking into a link hotspot with no verb selected changes room.
pub fn room_link(hotspot: &Hotspot) -> Option<ScriptResult> {
    let target = hotspot.target_room_id.clone()?;
    let line = hotspot.walk_prompt.clone().unwrap_or_else(|| DEFAULT_WALK_PROMPT.to_string());
    Some(ScriptResult::line(line).with_room_change(target))
}

pub fn generic(lines: &DialogueCatalog) -> ScriptResult {
    ScriptResult::line(pick_random(&lines.fallbacks.generic_default))
}

pub fn resolve(lines: &DialogueCatalog, hotspot: &Hotspot, verb: Verb, item: Option<HeldItem<'_>>, f: &Flags) -> ScriptResult {
    match verb {
        Verb::Look => look(lines, hotspot, f),
        Verb::Talk => talk(lines, hotspot, f),
        Verb::PickUp => pick_up(lines, hotspot, f),
        Verb::Use => use_(lines, hotspot, item, f),
        Verb::Open => open(lines, hotspot, f),
    }
}

fn look(lines: &DialogueCatalog, h: &Hotspot, f: &Flags) -> ScriptResult {
    let canned = &lines.interactions.look;
    let line = if let Some(s) = h.state_line(Verb::Look, f) {
        s.to_string()
    } else if let Some(d) = h.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        d.to_string()
    } else {
        match h.id.as_str() {
            DOOR_HOTSPOT if door_open(h, f) => canned.door_open.clone(),
            DOOR_HOTSPOT => canned.door_closed.clone(),
            SIGN_HOTSPOT => canned.sign.clone(),
            PICKUP_HOTSPOT if key_taken(f) => canned.key_taken.clone(),
            PICKUP_HOTSPOT => canned.key_present.clone(),
            _ => fill_hotspot(&pick_random(&lines.fallbacks.look_default), &h.name),
        }
    };
    ScriptResult::line(line).with_flag(h.state_flag(HotspotState::Inspected), true)
}

fn talk(lines: &DialogueCatalog, h: &Hotspot, f: &Flags) -> ScriptResult {
    if let Some(s) = h.state_line(Verb::Talk, f) {
        return ScriptResult::line(s);
    }
    let canned = &lines.interactions.talk;
    let line = match h.id.as_str() {
        DOOR_HOTSPOT => canned.door.clone(),
        SIGN_HOTSPOT => canned.sign.clone(),
        PICKUP_HOTSPOT => canned.key.clone(),
        _ => fill_hotspot(&pick_random(&lines.fallbacks.talk_default), &h.name),
    };
    ScriptResult::line(line)
}

fn pick_up(lines: &DialogueCatalog, h: &Hotspot, f: &Flags) -> ScriptResult {
    let canned = &lines.interactions.pick_up;
    if h.id == PICKUP_HOTSPOT {
        if key_taken(f) {
            return ScriptResult::line(canned.key_already_taken.clone());
        }
        return ScriptResult::line(canned.key_success.clone())
            .with_item(InventoryItem::new(PICKUP_HOTSPOT, PICKUP_ITEM_NAME))
            .with_flag(flags::taken_flag(PICKUP_HOTSPOT), true);
    }

    if let Some(s) = h.state_line(Verb::PickUp, f) {
        return ScriptResult::line(s);
    }
    let line = match h.id.as_str() {
        DOOR_HOTSPOT => canned.door_failure.clone(),
        SIGN_HOTSPOT => canned.sign_failure.clone(),
        _ => fill_hotspot(&pick_random(&lines.fallbacks.pick_up_default), &h.name),
    };
    ScriptResult::line(line)
}

fn use_(lines: &DialogueCatalog, h: &Hotspot, item: Option<HeldItem<'_>>, f: &Flags) -> ScriptResult {
    let canned = &lines.interactions.use_;
    let is_door = h.id == DOOR_HOTSPOT;

    let Some(item) = item else {
        if is_door && door_open(h, f) {
            return ScriptResult::line(canned.door_open_no_item_enter.clone()).with_room_change(next_room(h));
        }
        let line = match h.id.as_str() {
            DOOR_HOTSPOT => canned.door_without_item.clone(),
            SIGN_HOTSPOT => canned.sign_without_item.clone(),
            PICKUP_HOTSPOT => canned.key_without_item.clone(),
            _ => pick_random(&lines.fallbacks.use_without_item_default),
        };
        return ScriptResult::line(line);
    };

    if is_door && item.id == PICKUP_HOTSPOT {
        if !key_taken(f) {
            return ScriptResult::line(canned.door_need_key_first.clone());
        }
        if door_open(h, f) {
            return ScriptResult::line(canned.door_already_unlocked.clone());
        }
        return ScriptResult::line(canned.door_unlock_success.clone())
            .with_flag(h.state_flag(HotspotState::Open), true)
            .clearing_selection();
    }

    ScriptResult::line(use_failure_line(lines, h, item))
}

fn use_failure_line(lines: &DialogueCatalog, h: &Hotspot, item: HeldItem<'_>) -> String {
    let canned = &lines.interactions.use_;
    let item_is_key = item.id == PICKUP_HOTSPOT;
    match (item_is_key, h.id.as_str()) {
        (true, SIGN_HOTSPOT) => canned.sign_key.clone(),
        (true, PICKUP_HOTSPOT) => canned.key_on_key.clone(),
        (true, DOOR_HOTSPOT) => canned.door_key_misaligned.clone(),
        (_, DOOR_HOTSPOT) => fill_item(&canned.door_generic, item.name),
        (_, SIGN_HOTSPOT) => fill_item(&canned.sign_generic, item.name),
        (_, PICKUP_HOTSPOT) => fill_item(&canned.key_generic, item.name),
        (true, _) => fill_hotspot(&canned.generic_key_item, &h.name),
        _ => fill_item_and_hotspot(&pick_random(&lines.fallbacks.use_default), item.name, &h.name),
    }
}

fn open(lines: &DialogueCatalog, h: &Hotspot, f: &Flags) -> ScriptResult {
    let canned = &lines.interactions.open;
    if h.id == DOOR_HOTSPOT {
        if !door_open(h, f) {
            let line = h.state_line(Verb::Open, f).unwrap_or(canned.locked_door.as_str());
            return ScriptResult::line(line);
        }
        return ScriptResult::line(canned.enter_open_door.clone()).with_room_change(next_room(h));
    }

    if let Some(s) = h.state_line(Verb::Open, f) {
        return ScriptResult::line(s);
    }
    let line = match h.id.as_str() {
        SIGN_HOTSPOT => canned.sign_failure.clone(),
        PICKUP_HOTSPOT => canned.key_failure.clone(),
        _ => fill_hotspot(&pick_random(&lines.fallbacks.open_default), &h.name),
    };
    ScriptResult::line(line)
}
