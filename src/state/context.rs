use crate::models::flags::{self, Flags};
use crate::models::inventory::{Inventory, InventoryItem};
use crate::models::rules::ScriptResult;
use crate::models::types::{HotspotId, ItemId, Point, RoomId, Verb};
use serde::{Deserialize, Serialize};

/// Verb, item and target captured when a hotspot is clicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInteraction {
    pub hotspot_id: HotspotId,
    pub walk_target: Point,
    pub verb: Option<Verb>,
    pub inventory_item_id: Option<ItemId>,
}

/// The single source of mutable game truth. Only the machine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameContext {
    pub current_room_id: RoomId,
    pub selected_verb: Option<Verb>,
    pub selected_inventory_item_id: Option<ItemId>,
    pub flags: Flags,
    pub inventory: Inventory,
    pub pending_interaction: Option<PendingInteraction>,
    pub hovered_hotspot_id: Option<HotspotId>,
    pub dialogue_lines: Vec<String>,
    pub dialogue_index: usize,
}

impl GameContext {
    pub fn new(room: RoomId) -> Self {
        Self {
            current_room_id: room,
            selected_verb: None,
            selected_inventory_item_id: None,
            flags: initial_flags(),
            inventory: Inventory::new(),
            pending_interaction: None,
            hovered_hotspot_id: None,
            dialogue_lines: Vec::new(),
            dialogue_index: 0,
        }
    }

    /// Verb for resolution: the click-time snapshot if pending, else the live selection.
    pub fn effective_verb(&self) -> Option<Verb> {
        match &self.pending_interaction {
            Some(p) => p.verb,
            None => self.selected_verb,
        }
    }

    pub fn effective_item(&self) -> Option<&ItemId> {
        match &self.pending_interaction {
            Some(p) => p.inventory_item_id.as_ref(),
            None => self.selected_inventory_item_id.as_ref(),
        }
    }

    pub fn current_line(&self) -> Option<&str> {
        self.dialogue_lines.get(self.dialogue_index).map(String::as_str)
    }

    pub fn has_more_dialogue(&self) -> bool {
        self.dialogue_index + 1 < self.dialogue_lines.len()
    }

    pub fn clear_dialogue(&mut self) {
        self.dialogue_lines.clear();
        self.dialogue_index = 0;
    }

    pub fn show_dialogue(&mut self, lines: Vec<String>) {
        self.dialogue_lines = lines;
        self.dialogue_index = 0;
    }

    /// Mutations of a resolved interaction.
    pub fn apply_result(&mut self, result: &ScriptResult) {
        if let Some(update) = &result.set_flags {
            flags::merge(&mut self.flags, update);
        }
        if let Some(item) = &result.add_inventory_item {
            self.inventory.add(item.clone());
        }
        if let Some(id) = &result.remove_inventory_item_id {
            self.inventory.remove(id.as_str());
            if self.selected_inventory_item_id.as_ref() == Some(id) {
                self.selected_inventory_item_id = None;
            }
        }
        if let Some(room) = &result.room_change_to {
            self.current_room_id = room.clone();
            self.hovered_hotspot_id = None;
        }
        self.selected_verb = None;
        if result.clear_selected_inventory {
            self.selected_inventory_item_id = None;
        }
        self.show_dialogue(result.dialogue_lines.clone());
        self.pending_interaction = None;
    }

    pub fn give(&mut self, item: InventoryItem) -> bool {
        self.inventory.add(item)
    }
}

/// World flags at the start of a session.
pub fn initial_flags() -> Flags {
    [
        ("keyTaken", false),
        ("doorLocked", true),
        ("doorOpen", false),
        ("doorBroken", false),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
