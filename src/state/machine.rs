use crate::models::flags::capitalize;
use crate::models::rules::ScriptResult;
use crate::models::types::{HotspotId, ItemId, Point, RoomId, Verb};
use crate::state::context::{GameContext, PendingInteraction};
use crate::state::dialogue::dialogue_auto_advance;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const KEY_ITEM: &str = "key";
const KEY_INSPECT_LINE: &str = "A brass key. It probably opens that stubborn door.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MachineState {
    Boot,
    /// Passed through immediately
    RoomLoading,
    Exploring,
    WalkingToTarget,
    /// Waiting for the driver to resolve the pending interaction
    Interacting,
    Dialogue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum GameEvent {
    Booted,
    VerbSelected { verb: Option<Verb> },
    HotspotHovered { hotspot_id: Option<HotspotId> },
    HotspotClicked { hotspot_id: HotspotId, walk_target: Point },
    InventorySelected { item_id: Option<ItemId> },
    DialogueAdvance,
    /// Fired by the driver when the armed timer for `ticket` runs out.
    DialogueTimeout { ticket: u64 },
    Arrived,
    ScriptResolved { result: ScriptResult },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Booted => "BOOTED",
            GameEvent::VerbSelected { .. } => "VERB_SELECTED",
            GameEvent::HotspotHovered { .. } => "HOTSPOT_HOVERED",
            GameEvent::HotspotClicked { .. } => "HOTSPOT_CLICKED",
            GameEvent::InventorySelected { .. } => "INVENTORY_SELECTED",
            GameEvent::DialogueAdvance => "DIALOGUE_ADVANCE",
            GameEvent::DialogueTimeout { .. } => "DIALOGUE_TIMEOUT",
            GameEvent::Arrived => "ARRIVED",
            GameEvent::ScriptResolved { .. } => "SCRIPT_RESOLVED",
        }
    }
}

/// Outcome of one `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: MachineState,
    pub to: MachineState,
    /// False when the current state has no handler for the event.
    pub handled: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// An armed auto-advance timer. Only the newest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTimer {
    pub ticket: u64,
    pub delay_ms: u64,
}

/// What the renderer polls each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub state: MachineState,
    pub context: GameContext,
}

/// The top-level game flow. Owns the [`GameContext`]; every mutation goes
/// through `send`, and each event runs to completion.
#[derive(Debug, Clone)]
pub struct GameMachine {
    state: MachineState,
    context: GameContext,
    next_ticket: u64,
    timer: Option<DialogueTimer>,
}

impl GameMachine {
    pub fn new(start_room: RoomId) -> Self {
        Self::with_context(GameContext::new(start_room))
    }

    pub fn with_context(context: GameContext) -> Self {
        Self {
            state: MachineState::Boot,
            context,
            next_ticket: 0,
            timer: None,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn context(&self) -> &GameContext {
        &self.context
    }

    pub fn dialogue_timer(&self) -> Option<DialogueTimer> {
        self.timer
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state,
            context: self.context.clone(),
        }
    }

    pub fn send(&mut self, event: GameEvent) -> Transition {
        let from = self.state;
        let name = event.name();

        let handled = match self.state {
            MachineState::Boot => self.on_boot(event),
            MachineState::RoomLoading => false,
            MachineState::Exploring => self.on_exploring(event),
            MachineState::WalkingToTarget => self.on_walking(event),
            MachineState::Interacting => self.on_interacting(event),
            MachineState::Dialogue => self.on_dialogue(event),
        };

        // eventless
        if self.state == MachineState::RoomLoading {
            self.go(MachineState::Exploring);
        }

        if !handled {
            trace!(state = ?from, event = name, "event ignored");
        } else if from != self.state {
            debug!(from = ?from, to = ?self.state, event = name, "state changed");
        }
        Transition {
            from,
            to: self.state,
            handled,
        }
    }

    fn on_boot(&mut self, event: GameEvent) -> bool {
        match event {
            GameEvent::Booted => {
                self.go(MachineState::RoomLoading);
                true
            }
            _ => false,
        }
    }

    fn on_exploring(&mut self, event: GameEvent) -> bool {
        match event {
            GameEvent::VerbSelected { verb } => self.select_verb(verb),
            GameEvent::HotspotHovered { hotspot_id } => self.context.hovered_hotspot_id = hotspot_id,
            GameEvent::InventorySelected { item_id } => match (item_id, self.context.selected_verb) {
                (Some(id), Some(Verb::Look)) => {
                    let line = inventory_look_line(id.as_str(), self.context.inventory.display_name(id.as_str()));
                    self.context.selected_verb = None;
                    self.context.selected_inventory_item_id = None;
                    self.context.show_dialogue(vec![line]);
                    self.go(MachineState::Dialogue);
                }
                (Some(id), Some(verb @ (Verb::Talk | Verb::PickUp | Verb::Open))) => {
                    let line = inventory_verb_feedback_line(verb, self.context.inventory.display_name(id.as_str()));
                    self.context.selected_inventory_item_id = None;
                    self.context.show_dialogue(vec![line]);
                    self.go(MachineState::Dialogue);
                }
                (item_id, _) => self.context.selected_inventory_item_id = item_id,
            },
            GameEvent::HotspotClicked {
                hotspot_id,
                walk_target,
            } => {
                self.set_pending(hotspot_id, walk_target);
                self.go(MachineState::WalkingToTarget);
            }
            _ => return false,
        }
        true
    }

    fn on_walking(&mut self, event: GameEvent) -> bool {
        match event {
            GameEvent::Arrived => self.go(MachineState::Interacting),
            GameEvent::HotspotHovered { hotspot_id } => self.context.hovered_hotspot_id = hotspot_id,
            // Re-click retargets the walk; the snapshot is retaken.
            GameEvent::HotspotClicked {
                hotspot_id,
                walk_target,
            } => self.set_pending(hotspot_id, walk_target),
            GameEvent::VerbSelected { verb } => self.select_verb(verb),
            GameEvent::InventorySelected { item_id } => self.context.selected_inventory_item_id = item_id,
            _ => return false,
        }
        true
    }

    fn on_interacting(&mut self, event: GameEvent) -> bool {
        match event {
            GameEvent::ScriptResolved { result } => {
                let has_dialogue = !result.dialogue_lines.is_empty();
                self.context.apply_result(&result);
                if has_dialogue {
                    self.go(MachineState::Dialogue);
                } else {
                    self.go(MachineState::Exploring);
                }
                true
            }
            _ => false,
        }
    }

    fn on_dialogue(&mut self, event: GameEvent) -> bool {
        match event {
            GameEvent::HotspotClicked {
                hotspot_id,
                walk_target,
            } => {
                self.context.clear_dialogue();
                self.set_pending(hotspot_id, walk_target);
                self.go(MachineState::WalkingToTarget);
            }
            GameEvent::HotspotHovered { hotspot_id } => self.context.hovered_hotspot_id = hotspot_id,
            GameEvent::VerbSelected { verb } => self.select_verb(verb),
            GameEvent::InventorySelected { item_id } => self.context.selected_inventory_item_id = item_id,
            GameEvent::DialogueAdvance => self.advance_or_close(),
            GameEvent::DialogueTimeout { ticket } => {
                if self.timer.map(|t| t.ticket) != Some(ticket) {
                    trace!(ticket, "stale dialogue timer");
                    return false;
                }
                self.advance_or_close();
            }
            _ => return false,
        }
        true
    }

    /// Selecting the active verb again clears it. Only USE keeps the item.
    fn select_verb(&mut self, verb: Option<Verb>) {
        let next = if verb.is_some() && verb == self.context.selected_verb {
            None
        } else {
            verb
        };
        self.context.selected_verb = next;
        if next != Some(Verb::Use) {
            self.context.selected_inventory_item_id = None;
        }
    }

    fn set_pending(&mut self, hotspot_id: HotspotId, walk_target: Point) {
        self.context.pending_interaction = Some(PendingInteraction {
            hotspot_id,
            walk_target,
            verb: self.context.selected_verb,
            inventory_item_id: self.context.selected_inventory_item_id.clone(),
        });
    }

    fn advance_or_close(&mut self) {
        if self.context.has_more_dialogue() {
            self.context.dialogue_index = (self.context.dialogue_index + 1).min(self.context.dialogue_lines.len() - 1);
            self.arm_timer();
        } else {
            self.context.clear_dialogue();
            self.go(MachineState::Exploring);
        }
    }

    fn go(&mut self, to: MachineState) {
        if self.state == MachineState::Dialogue && to != MachineState::Dialogue {
            self.timer = None;
        }
        self.state = to;
        if to == MachineState::Dialogue {
            self.arm_timer();
        }
    }

    fn arm_timer(&mut self) {
        self.next_ticket += 1;
        let delay_ms = dialogue_auto_advance(self.context.current_line().unwrap_or(""));
        self.timer = Some(DialogueTimer {
            ticket: self.next_ticket,
            delay_ms,
        });
    }
}

fn inventory_look_line(item_id: &str, item_name: &str) -> String {
    if item_id == KEY_ITEM {
        return KEY_INSPECT_LINE.to_string();
    }
    format!("It is {}.", with_article(item_name))
}

fn inventory_verb_feedback_line(verb: Verb, item_name: &str) -> String {
    let item = with_article(item_name);
    match verb {
        Verb::Talk => format!("You attempt small talk with {}. It stays focused on being an object.", item),
        Verb::PickUp => format!("You already picked up {}. Congratulations on your continued success.", item),
        Verb::Open => format!("{} has no obvious hatch, lid, or dramatic reveal.", capitalize(&item)),
        _ => format!("That does not seem useful for {}.", item),
    }
}

fn with_article(name: &str) -> String {
    let trimmed = name.trim();
    let Some(first) = trimmed.chars().next() else {
        return "an item".to_string();
    };
    let article = if "aeiou".contains(first.to_ascii_lowercase()) {
        "an"
    } else {
        "a"
    };
    format!("{} {}", article, trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::InventoryItem;

    fn mk_machine() -> GameMachine {
        let mut m = GameMachine::new(RoomId::from("room1"));
        m.send(GameEvent::Booted);
        m
    }

    fn click(id: &str) -> GameEvent {
        GameEvent::HotspotClicked {
            hotspot_id: id.into(),
            walk_target: Point::new(10.0, 20.0),
        }
    }

    #[test]
    fn boot_lands_in_exploring() {
        let mut m = GameMachine::new(RoomId::from("room1"));
        assert_eq!(m.state(), MachineState::Boot);
        assert!(!m.send(GameEvent::Arrived).handled);
        let t = m.send(GameEvent::Booted);
        assert_eq!(t.from, MachineState::Boot);
        assert_eq!(t.to, MachineState::Exploring);
    }

    #[test]
    fn verb_toggles_and_use_keeps_item() {
        let mut m = mk_machine();
        m.send(GameEvent::InventorySelected { item_id: Some("rope".into()) });
        m.send(GameEvent::VerbSelected { verb: Some(Verb::Use) });
        assert_eq!(m.context().selected_inventory_item_id, Some(ItemId::from("rope")));

        m.send(GameEvent::VerbSelected { verb: Some(Verb::Use) });
        assert_eq!(m.context().selected_verb, None);
        assert_eq!(m.context().selected_inventory_item_id, None);

        m.send(GameEvent::InventorySelected { item_id: Some("rope".into()) });
        m.send(GameEvent::VerbSelected { verb: Some(Verb::Look) });
        assert_eq!(m.context().selected_verb, Some(Verb::Look));
        assert_eq!(m.context().selected_inventory_item_id, None);
    }

    #[test]
    fn click_snapshots_verb_and_item() {
        let mut m = mk_machine();
        m.send(GameEvent::VerbSelected { verb: Some(Verb::Use) });
        m.send(GameEvent::InventorySelected { item_id: Some("key".into()) });
        let t = m.send(click("door"));
        assert_eq!(t.to, MachineState::WalkingToTarget);
        let p = m.context().pending_interaction.clone().unwrap();
        assert_eq!(p.verb, Some(Verb::Use));
        assert_eq!(p.inventory_item_id, Some(ItemId::from("key")));

        // changing selection mid-walk leaves the snapshot alone
        m.send(GameEvent::VerbSelected { verb: Some(Verb::Look) });
        assert_eq!(m.context().effective_verb(), Some(Verb::Use));
    }

    #[test]
    fn empty_result_skips_dialogue() {
        let mut m = mk_machine();
        m.send(click("door"));
        assert_eq!(m.send(GameEvent::Arrived).to, MachineState::Interacting);
        let t = m.send(GameEvent::ScriptResolved {
            result: ScriptResult::empty().with_flag("x", true),
        });
        assert_eq!(t.to, MachineState::Exploring);
        assert!(m.context().flags["x"]);
        assert!(m.context().pending_interaction.is_none());
        assert!(m.dialogue_timer().is_none());
    }

    #[test]
    fn dialogue_advances_then_closes() {
        let mut m = mk_machine();
        m.send(click("sign"));
        m.send(GameEvent::Arrived);
        let mut r = ScriptResult::line("One.");
        r.dialogue_lines.push("Two.".into());
        assert_eq!(m.send(GameEvent::ScriptResolved { result: r }).to, MachineState::Dialogue);
        let first = m.dialogue_timer().unwrap();
        assert_eq!(first.delay_ms, 1800);

        m.send(GameEvent::DialogueAdvance);
        assert_eq!(m.context().current_line(), Some("Two."));
        let second = m.dialogue_timer().unwrap();
        assert!(second.ticket > first.ticket);

        // the first timer was cancelled by the manual advance
        let t = m.send(GameEvent::DialogueTimeout { ticket: first.ticket });
        assert!(!t.handled);
        assert_eq!(m.state(), MachineState::Dialogue);

        let t = m.send(GameEvent::DialogueTimeout { ticket: second.ticket });
        assert_eq!(t.to, MachineState::Exploring);
        assert!(m.context().dialogue_lines.is_empty());
        assert!(m.dialogue_timer().is_none());
    }

    #[test]
    fn click_interrupts_dialogue() {
        let mut m = mk_machine();
        m.send(click("sign"));
        m.send(GameEvent::Arrived);
        m.send(GameEvent::ScriptResolved {
            result: ScriptResult::line("Hello."),
        });
        let t = m.send(click("door"));
        assert_eq!(t.to, MachineState::WalkingToTarget);
        assert!(m.context().dialogue_lines.is_empty());
        assert!(m.dialogue_timer().is_none());
        assert_eq!(m.context().pending_interaction.as_ref().unwrap().hotspot_id, "door");
    }

    #[test]
    fn inspecting_inventory_with_look() {
        let mut ctx = GameContext::new(RoomId::from("room1"));
        ctx.give(InventoryItem::new("key", "Key"));
        ctx.give(InventoryItem::new("apple", "Apple"));
        let mut m = GameMachine::with_context(ctx);
        m.send(GameEvent::Booted);

        m.send(GameEvent::VerbSelected { verb: Some(Verb::Look) });
        let t = m.send(GameEvent::InventorySelected { item_id: Some("key".into()) });
        assert_eq!(t.to, MachineState::Dialogue);
        assert_eq!(m.context().current_line(), Some(KEY_INSPECT_LINE));
        assert_eq!(m.context().selected_verb, None);
        assert_eq!(m.context().selected_inventory_item_id, None);

        m.send(GameEvent::DialogueAdvance);
        m.send(GameEvent::VerbSelected { verb: Some(Verb::Look) });
        m.send(GameEvent::InventorySelected { item_id: Some("apple".into()) });
        assert_eq!(m.context().current_line(), Some("It is an apple."));
    }

    #[test]
    fn inapplicable_verbs_give_feedback() {
        let mut ctx = GameContext::new(RoomId::from("room1"));
        ctx.give(InventoryItem::new("rope", "Rope"));
        let mut m = GameMachine::with_context(ctx);
        m.send(GameEvent::Booted);
        m.send(GameEvent::VerbSelected { verb: Some(Verb::Open) });
        m.send(GameEvent::InventorySelected { item_id: Some("rope".into()) });
        assert_eq!(m.state(), MachineState::Dialogue);
        assert_eq!(
            m.context().current_line(),
            Some("A rope has no obvious hatch, lid, or dramatic reveal.")
        );
        assert_eq!(m.context().selected_verb, Some(Verb::Open));
        assert_eq!(m.context().selected_inventory_item_id, None);
    }

    #[test]
    fn plain_inventory_selection_is_recorded() {
        let mut m = mk_machine();
        let t = m.send(GameEvent::InventorySelected { item_id: Some("key".into()) });
        assert!(!t.changed());
        assert_eq!(m.context().selected_inventory_item_id, Some(ItemId::from("key")));
    }

    #[test]
    fn articles() {
        assert_eq!(with_article("Apple"), "an apple");
        assert_eq!(with_article(" Rope "), "a rope");
        assert_eq!(with_article(""), "an item");
    }

    #[test]
    fn events_use_wire_names() {
        let e: GameEvent =
            serde_json::from_str(r#"{"type":"HOTSPOT_CLICKED","hotspotId":"door","walkTarget":{"x":1,"y":2}}"#).unwrap();
        assert_eq!(e, click_at("door", 1.0, 2.0));
        let v = serde_json::to_value(GameEvent::DialogueTimeout { ticket: 3 }).unwrap();
        assert_eq!(v["type"], "DIALOGUE_TIMEOUT");
    }

    fn click_at(id: &str, x: f64, y: f64) -> GameEvent {
        GameEvent::HotspotClicked {
            hotspot_id: id.into(),
            walk_target: Point::new(x, y),
        }
    }
}
