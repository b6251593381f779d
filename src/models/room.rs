use crate::models::flags::{self, Flags};
use crate::models::rules::{GenericChart, RoomInteractionChart, RoomParallelStateChart, RoomScriptRule};
use crate::models::types::{HotspotId, HotspotState, Point, Rect, RoomId, Verb};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Flag-driven sprite override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteFlagVariant {
    pub flag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_true_image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_false_image_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flag_variants: Vec<SpriteFlagVariant>,
}

/// Explicit flag names for the abstract hotspot states. Unmapped states use
/// the derived `${id}${State}` name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFlagMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspected: Option<String>,
}

impl StateFlagMap {
    pub fn get(&self, state: HotspotState) -> Option<&str> {
        match state {
            HotspotState::Locked => self.locked.as_deref(),
            HotspotState::Open => self.open.as_deref(),
            HotspotState::Broken => self.broken.as_deref(),
            HotspotState::Inspected => self.inspected.as_deref(),
        }
    }
}

/// Per-state dialogue lines, keyed by verb with a `DEFAULT` catch-all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDialogue {
    #[serde(rename = "LOOK", default, skip_serializing_if = "Option::is_none")]
    pub look: Option<String>,
    #[serde(rename = "TALK", default, skip_serializing_if = "Option::is_none")]
    pub talk: Option<String>,
    #[serde(rename = "PICK_UP", default, skip_serializing_if = "Option::is_none")]
    pub pick_up: Option<String>,
    #[serde(rename = "USE", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(rename = "OPEN", default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(rename = "DEFAULT", default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl StateDialogue {
    pub fn for_verb(&self, verb: Verb) -> Option<&str> {
        let v = match verb {
            Verb::Look => &self.look,
            Verb::Talk => &self.talk,
            Verb::PickUp => &self.pick_up,
            Verb::Use => &self.use_,
            Verb::Open => &self.open,
        };
        v.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Verb-specific line first, then `DEFAULT`.
    pub fn line(&self, verb: Verb) -> Option<&str> {
        self.for_verb(verb)
            .or_else(|| self.default.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite_image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<StateDialogue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<StateVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<StateVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broken: Option<StateVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspected: Option<StateVariant>,
}

impl StatesConfig {
    pub fn get(&self, state: HotspotState) -> Option<&StateVariant> {
        match state {
            HotspotState::Locked => self.locked.as_ref(),
            HotspotState::Open => self.open.as_ref(),
            HotspotState::Broken => self.broken.as_ref(),
            HotspotState::Inspected => self.inspected.as_ref(),
        }
    }
}

/// An interactive region of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Unique within the room
    pub id: HotspotId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hit-test box
    pub bounds: Rect,
    /// Render box, independent of the hit box
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite_bounds: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<SpriteConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_flags: Option<StateFlagMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<StatesConfig>,
    /// Where the actor stands to interact
    pub walk_target: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_room_entry_point: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_prompt: Option<String>,
}

impl Hotspot {
    /// Flag name backing `state` for this hotspot.
    pub fn state_flag(&self, state: HotspotState) -> String {
        self.state_flags
            .as_ref()
            .and_then(|m| m.get(state))
            .map(str::to_string)
            .unwrap_or_else(|| flags::hotspot_state_flag(self.id.as_str(), state))
    }

    /// First state in precedence order whose flag is set.
    pub fn active_state(&self, flags: &Flags) -> Option<HotspotState> {
        HotspotState::PRECEDENCE
            .into_iter()
            .find(|s| flags::is_set(flags, &self.state_flag(*s)))
    }

    /// Dialogue override for the active state, if the state carries one.
    pub fn state_line(&self, verb: Verb, flags: &Flags) -> Option<&str> {
        let states = self.states.as_ref()?;
        // Only states with a set flag participate, in precedence order.
        HotspotState::PRECEDENCE
            .into_iter()
            .filter(|s| flags::is_set(flags, &self.state_flag(*s)))
            .find_map(|s| states.get(s)?.dialogue.as_ref()?.line(verb))
    }

    pub fn image_id(&self, flags: &Flags) -> Option<&str> {
        if let Some(state) = self.active_state(flags) {
            let img = self
                .states
                .as_ref()
                .and_then(|s| s.get(state))
                .and_then(|v| v.sprite_image_id.as_deref());
            if img.is_some() {
                return img;
            }
        }

        let sprite = self.sprite.as_ref()?;
        for variant in &sprite.flag_variants {
            let img = if flags::is_set(flags, &variant.flag) {
                variant.when_true_image_id.as_deref()
            } else {
                variant.when_false_image_id.as_deref()
            };
            if img.is_some() {
                return img;
            }
        }
        sprite.default_image_id.as_deref()
    }

    pub fn render_bounds(&self) -> Rect {
        self.sprite_bounds.unwrap_or(self.bounds)
    }

    pub fn is_room_link(&self) -> bool {
        self.target_room_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Perspective {
    pub far_y: f64,
    pub near_y: f64,
    pub far_scale: f64,
    pub near_scale: f64,
}

impl Perspective {
    /// Actor scale at screen row `y`, clamped to the far/near band.
    pub fn scale_at(&self, y: f64) -> f64 {
        let span = self.near_y - self.far_y;
        if span.abs() < f64::EPSILON {
            return self.near_scale;
        }
        let t = ((y - self.far_y) / span).clamp(0.0, 1.0);
        self.far_scale + (self.near_scale - self.far_scale) * t
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDefinition {
    pub id: RoomId,
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub background_color: String,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<RoomScriptRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_chart: Option<RoomInteractionChart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_state_chart: Option<RoomParallelStateChart>,
    /// Shared so the chart runtime can detect a swapped definition by identity.
    #[serde(default, alias = "xstateChart", skip_serializing_if = "Option::is_none")]
    pub generic_chart: Option<Arc<GenericChart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walkable_polygon: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective: Option<Perspective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_text: Option<String>,
}

impl RoomDefinition {
    pub fn hotspot(&self, id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == id)
    }

    pub fn hotspot_mut(&mut self, id: &str) -> Option<&mut Hotspot> {
        self.hotspots.iter_mut().find(|h| h.id == id)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn mk_hotspot(id: &str, name: &str) -> Hotspot {
        Hotspot {
            id: HotspotId::from(id),
            name: name.to_string(),
            description: None,
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            sprite_bounds: None,
            sprite: None,
            state_flags: None,
            states: None,
            walk_target: Point::new(5.0, 12.0),
            target_room_id: None,
            target_room_entry_point: None,
            walk_prompt: None,
        }
    }

    pub fn mk_room(id: &str, hotspots: Vec<Hotspot>) -> RoomDefinition {
        RoomDefinition {
            id: RoomId::from(id),
            name: id.to_string(),
            width: 320.0,
            height: 180.0,
            background_color: "#000000".to_string(),
            hotspots,
            scripts: vec![],
            interaction_chart: None,
            parallel_state_chart: None,
            generic_chart: None,
            walkable_polygon: None,
            perspective: None,
            overlay_text: None,
        }
    }
}
