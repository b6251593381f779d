//! Front-end loop glue: walks the actor, resolves interactions when the
//! machine asks for one, and runs the dialogue clock.

use crate::models::rules::ScriptResult;
use crate::models::room::{Hotspot, RoomDefinition};
use crate::models::types::{Point, RoomId, Verb};
use crate::services::InteractionResolver;
use crate::state::context::GameContext;
use crate::state::machine::{GameEvent, GameMachine, GameSnapshot, MachineState, Transition};
use crate::state::registry::RoomRegistry;
use std::sync::Arc;
use tracing::{debug, info};

/// px per second
pub const WALK_SPEED: f64 = 80.0;
pub const STOP_DISTANCE: f64 = 2.0;
/// Longest simulated step; long stalls must not teleport the actor.
pub const MAX_STEP_SECS: f64 = 0.05;

pub const NOTHING_TO_INTERACT: &str = "There is nothing to interact with.";

const DEFAULT_SPAWN: Point = Point::new(96.0, 150.0);

pub fn spawn_point(room_id: &str) -> Point {
    match room_id {
        "room2" => Point::new(46.0, 150.0),
        _ => DEFAULT_SPAWN,
    }
}

pub struct GameDriver {
    machine: GameMachine,
    rooms: Arc<RoomRegistry>,
    resolver: Arc<InteractionResolver>,
    actor: Point,
    /// Ticket being timed and ms elapsed on it
    clock: Option<(u64, f64)>,
}

impl GameDriver {
    pub fn new(rooms: Arc<RoomRegistry>, resolver: Arc<InteractionResolver>) -> Self {
        let start = rooms.default_room().clone();
        Self::with_machine(GameMachine::new(start), rooms, resolver)
    }

    pub fn with_machine(machine: GameMachine, rooms: Arc<RoomRegistry>, resolver: Arc<InteractionResolver>) -> Self {
        let actor = spawn_point(machine.context().current_room_id.as_str());
        Self {
            machine,
            rooms,
            resolver,
            actor,
            clock: None,
        }
    }

    pub fn state(&self) -> MachineState {
        self.machine.state()
    }

    pub fn context(&self) -> &GameContext {
        self.machine.context()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.machine.snapshot()
    }

    pub fn actor(&self) -> Point {
        self.actor
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    pub fn current_room(&self) -> Option<Arc<RoomDefinition>> {
        self.rooms.get(self.context().current_room_id.as_str())
    }

    pub fn visible_hotspots(&self) -> Vec<Hotspot> {
        let ctx = self.context();
        self.rooms.visible_hotspots(ctx.current_room_id.as_str(), &ctx.flags)
    }

    /// A visible hotspot in the current room by id or (case-insensitive) name.
    pub fn find_hotspot(&self, needle: &str) -> Option<Hotspot> {
        let needle = needle.trim();
        self.visible_hotspots()
            .into_iter()
            .find(|h| h.id == needle || h.name.eq_ignore_ascii_case(needle))
    }

    /// Topmost visible hotspot under `p`; later hotspots draw on top.
    pub fn hotspot_at(&self, p: Point) -> Option<Hotspot> {
        self.visible_hotspots().into_iter().rev().find(|h| h.bounds.contains(p))
    }

    pub fn boot(&mut self) -> Transition {
        self.send(GameEvent::Booted)
    }

    /// Click a hotspot by id, walking to its walk target.
    pub fn click(&mut self, hotspot: &Hotspot) -> Transition {
        self.send(GameEvent::HotspotClicked {
            hotspot_id: hotspot.id.clone(),
            walk_target: hotspot.walk_target,
        })
    }

    /// Forward an event. When the machine lands in `interacting` the pending
    /// interaction is resolved right away, so callers never observe it.
    pub fn send(&mut self, event: GameEvent) -> Transition {
        let first = self.machine.send(event);
        let mut last = first;

        if self.machine.state() == MachineState::Interacting {
            let room_before = self.context().current_room_id.clone();
            let (result, link) = self.resolve_pending();
            last = self.machine.send(GameEvent::ScriptResolved { result });
            self.on_room_change(&room_before, link.as_ref());
        }

        self.sync_clock();
        Transition {
            from: first.from,
            to: last.to,
            handled: first.handled,
        }
    }

    /// Advance the world by `dt` seconds of wall time.
    pub fn frame(&mut self, dt: f64) {
        if self.machine.state() == MachineState::WalkingToTarget {
            self.step_walking(dt.clamp(0.0, MAX_STEP_SECS));
        }

        if let (Some(timer), Some((ticket, elapsed))) = (self.machine.dialogue_timer(), self.clock.as_mut()) {
            if timer.ticket == *ticket {
                *elapsed += dt.max(0.0) * 1000.0;
                if *elapsed >= timer.delay_ms as f64 {
                    self.send(GameEvent::DialogueTimeout { ticket: timer.ticket });
                }
            }
        }
    }

    /// Status text under the verb bar, e.g. `Use Key with Door`.
    pub fn sentence_line(&self) -> String {
        let ctx = self.context();
        let hotspot_name = ctx
            .hovered_hotspot_id
            .as_ref()
            .and_then(|id| self.current_room().and_then(|r| r.hotspot(id.as_str()).map(|h| h.name.clone())))
            .unwrap_or_default();
        let item_name = ctx
            .selected_inventory_item_id
            .as_ref()
            .map(|id| ctx.inventory.display_name(id.as_str()).to_string());

        match (ctx.selected_verb, item_name, hotspot_name.is_empty()) {
            (Some(Verb::Use), Some(item), false) => format!("Use {} with {}", item, hotspot_name),
            (Some(verb), _, false) => format!("{} {}", verb.label(), hotspot_name),
            (Some(Verb::Use), None, _) => "Use ... with ...".to_string(),
            _ => "Look around.".to_string(),
        }
    }

    fn resolve_pending(&self) -> (ScriptResult, Option<Hotspot>) {
        let ctx = self.context();
        let Some(pending) = &ctx.pending_interaction else {
            return (ScriptResult::empty(), None);
        };
        let room = self.current_room();
        let hotspot = room
            .as_ref()
            .and_then(|r| r.hotspot(pending.hotspot_id.as_str()))
            .filter(|h| self.rooms.is_hotspot_visible(ctx.current_room_id.as_str(), h.id.as_str(), &ctx.flags));
        match (room.as_ref(), hotspot) {
            (Some(room), Some(hotspot)) => (self.resolver.resolve(ctx, room, hotspot), Some(hotspot.clone())),
            _ => {
                debug!(room_id = %ctx.current_room_id, hotspot = %pending.hotspot_id, "pending target gone or hidden");
                (ScriptResult::line(NOTHING_TO_INTERACT), None)
            }
        }
    }

    fn on_room_change(&mut self, before: &RoomId, link: Option<&Hotspot>) {
        let now = &self.machine.context().current_room_id;
        if now == before {
            return;
        }
        self.actor = link
            .and_then(|h| h.target_room_entry_point)
            .unwrap_or_else(|| spawn_point(now.as_str()));
        info!(from = %before, to = %now, x = self.actor.x, y = self.actor.y, "entered room");
    }

    fn step_walking(&mut self, dt: f64) {
        let Some(target) = self.context().pending_interaction.as_ref().map(|p| p.walk_target) else {
            self.send(GameEvent::Arrived);
            return;
        };
        let distance = self.actor.distance_to(target);
        if distance <= STOP_DISTANCE {
            self.actor = target;
            self.send(GameEvent::Arrived);
            return;
        }

        let step = WALK_SPEED * dt;
        if step >= distance {
            self.actor = target;
            self.send(GameEvent::Arrived);
        } else {
            let ratio = step / distance;
            self.actor = Point::new(
                self.actor.x + (target.x - self.actor.x) * ratio,
                self.actor.y + (target.y - self.actor.y) * ratio,
            );
        }
    }

    /// Restart the elapsed count whenever a new ticket is armed.
    fn sync_clock(&mut self) {
        match self.machine.dialogue_timer() {
            Some(timer) if self.clock.map(|(t, _)| t) != Some(timer.ticket) => {
                self.clock = Some((timer.ticket, 0.0));
            }
            Some(_) => {}
            None => self.clock = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::room::test_support::{mk_hotspot, mk_room};
    use crate::models::types::Rect;

    fn mk_rooms() -> Arc<RoomRegistry> {
        let mut door = mk_hotspot("door", "Door");
        door.target_room_id = Some("room2".into());
        door.walk_target = Point::new(96.0, 150.0);
        let mut sign = mk_hotspot("sign", "Sign");
        sign.bounds = Rect::new(100.0, 100.0, 20.0, 20.0);
        sign.walk_target = Point::new(136.0, 150.0);
        let mut key = mk_hotspot("key", "Key");
        key.bounds = Rect::new(200.0, 100.0, 20.0, 20.0);
        key.walk_target = Point::new(96.0, 150.0);
        let rooms = RoomRegistry::from_rooms(vec![mk_room("room1", vec![door, sign, key]), mk_room("room2", vec![])]).unwrap();
        Arc::new(rooms)
    }

    fn mk_driver() -> GameDriver {
        let mut d = GameDriver::new(mk_rooms(), Arc::new(InteractionResolver::default()));
        d.boot();
        d
    }

    fn key_taken() -> GameMachine {
        let mut ctx = GameContext::new(RoomId::from("room1"));
        ctx.flags.insert("keyTaken".into(), true);
        GameMachine::with_context(ctx)
    }

    fn run(d: &mut GameDriver, frames: usize) {
        for _ in 0..frames {
            d.frame(0.05);
        }
    }

    #[test]
    fn starts_at_spawn_point() {
        let d = mk_driver();
        assert_eq!(d.state(), MachineState::Exploring);
        assert_eq!(d.actor(), Point::new(96.0, 150.0));
        assert_eq!(spawn_point("room2"), Point::new(46.0, 150.0));
    }

    #[test]
    fn walks_then_resolves_into_dialogue() {
        let mut d = mk_driver();
        d.send(GameEvent::VerbSelected { verb: Some(Verb::Talk) });
        let sign = d.find_hotspot("SIGN").unwrap();
        assert_eq!(d.click(&sign).to, MachineState::WalkingToTarget);

        // 40px at 4px per capped frame
        run(&mut d, 5);
        assert_eq!(d.state(), MachineState::WalkingToTarget);
        assert!((d.actor().x - 116.0).abs() < 1e-6);

        // an oversized dt is capped
        d.frame(10.0);
        assert!((d.actor().x - 120.0).abs() < 1e-6);

        run(&mut d, 10);
        assert_eq!(d.state(), MachineState::Dialogue);
        assert_eq!(d.actor(), Point::new(136.0, 150.0));
        assert_eq!(
            d.context().current_line(),
            Some(d.resolver.lines().interactions.talk.sign.as_str())
        );
    }

    #[test]
    fn dialogue_times_out_back_to_exploring() {
        let mut d = mk_driver();
        d.send(GameEvent::VerbSelected { verb: Some(Verb::Look) });
        let sign = d.find_hotspot("sign").unwrap();
        d.click(&sign);
        run(&mut d, 15);
        assert_eq!(d.state(), MachineState::Dialogue);

        // never longer than 6s
        run(&mut d, 121);
        assert_eq!(d.state(), MachineState::Exploring);
        assert!(d.context().dialogue_lines.is_empty());
    }

    #[test]
    fn room_link_moves_actor_to_spawn() {
        let mut d = mk_driver();
        let door = d.find_hotspot("door").unwrap();
        // already standing on the walk target
        d.click(&door);
        d.frame(0.0);
        assert_eq!(d.context().current_room_id, "room2");
        assert_eq!(d.state(), MachineState::Dialogue);
        assert_eq!(d.actor(), spawn_point("room2"));
    }

    #[test]
    fn entry_point_wins_over_spawn() {
        let mut d = mk_driver();
        d.rooms()
            .update_hotspot("room1", "door", |h| h.target_room_entry_point = Some(Point::new(10.0, 20.0)))
            .unwrap();
        let door = d.find_hotspot("door").unwrap();
        d.click(&door);
        d.frame(0.0);
        assert_eq!(d.actor(), Point::new(10.0, 20.0));
    }

    #[test]
    fn vanished_target_says_nothing_to_interact_with() {
        let mut d = mk_driver();
        d.send(GameEvent::HotspotClicked {
            hotspot_id: "ghost".into(),
            walk_target: d.actor(),
        });
        d.frame(0.0);
        assert_eq!(d.state(), MachineState::Dialogue);
        assert_eq!(d.context().current_line(), Some(NOTHING_TO_INTERACT));
    }

    #[test]
    fn taken_target_says_nothing_to_interact_with() {
        let mut d = GameDriver::with_machine(key_taken(), mk_rooms(), Arc::new(InteractionResolver::default()));
        d.boot();
        d.send(GameEvent::VerbSelected { verb: Some(Verb::Look) });
        // click recorded before the key was hidden
        d.send(GameEvent::HotspotClicked {
            hotspot_id: "key".into(),
            walk_target: d.actor(),
        });
        d.frame(0.0);
        assert_eq!(d.state(), MachineState::Dialogue);
        assert_eq!(d.context().dialogue_lines, vec![NOTHING_TO_INTERACT.to_string()]);
        assert!(d.context().inventory.is_empty());
    }

    #[test]
    fn hit_testing_uses_visible_hotspots() {
        let d = mk_driver();
        assert_eq!(d.hotspot_at(Point::new(105.0, 105.0)).map(|h| h.name), Some("Sign".to_string()));
        assert_eq!(d.hotspot_at(Point::new(205.0, 105.0)).map(|h| h.name), Some("Key".to_string()));
        assert!(d.hotspot_at(Point::new(300.0, 5.0)).is_none());

        let d = GameDriver::with_machine(key_taken(), mk_rooms(), Arc::new(InteractionResolver::default()));
        assert!(d.hotspot_at(Point::new(205.0, 105.0)).is_none());
        assert!(d.find_hotspot("key").is_none());
        assert!(d.hotspot_at(Point::new(105.0, 105.0)).is_some());
    }

    #[test]
    fn sentence_line_variants() {
        let mut d = mk_driver();
        assert_eq!(d.sentence_line(), "Look around.");
        d.send(GameEvent::VerbSelected { verb: Some(Verb::Use) });
        assert_eq!(d.sentence_line(), "Use ... with ...");
        d.send(GameEvent::HotspotHovered { hotspot_id: Some("door".into()) });
        assert_eq!(d.sentence_line(), "Use Door");
        d.send(GameEvent::InventorySelected { item_id: Some("key".into()) });
        assert_eq!(d.sentence_line(), "Use key with Door");
        d.send(GameEvent::VerbSelected { verb: Some(Verb::PickUp) });
        assert_eq!(d.sentence_line(), "Pick up Door");
    }
}
