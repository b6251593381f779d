use crate::error::{AppResult, DomainError};
use crate::models::room::{Hotspot, RoomDefinition};
use crate::models::types::{HotspotId, Rect, RoomId};
use crate::services::RoomService;
use crate::state::registry::RoomRegistry;
use std::sync::Arc;
use tracing::{info, warn};

const MIN_SIZE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditTarget {
    #[default]
    Bounds,
    SpriteBounds,
    WalkTarget,
}

impl EditTarget {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bounds" | "1" => Some(EditTarget::Bounds),
            "spritebounds" | "sprite" | "2" => Some(EditTarget::SpriteBounds),
            "walktarget" | "walk" | "3" => Some(EditTarget::WalkTarget),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditTarget::Bounds => "bounds",
            EditTarget::SpriteBounds => "spriteBounds",
            EditTarget::WalkTarget => "walkTarget",
        }
    }
}

/// Geometry editing for the room on screen. Edits land in the registry
/// immediately; `save` persists the whole room.
pub struct DevEditor {
    rooms: Arc<RoomRegistry>,
    service: Arc<RoomService>,
    room_id: RoomId,
    selected: Option<HotspotId>,
    target: EditTarget,
}

impl DevEditor {
    pub fn new(rooms: Arc<RoomRegistry>, service: Arc<RoomService>, room_id: RoomId) -> Self {
        Self {
            rooms,
            service,
            room_id,
            selected: None,
            target: EditTarget::default(),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn selected(&self) -> Option<&HotspotId> {
        self.selected.as_ref()
    }

    pub fn target(&self) -> EditTarget {
        self.target
    }

    /// Follow the player into another room; selection does not carry over.
    pub fn set_room(&mut self, room_id: RoomId) {
        if room_id != self.room_id {
            self.room_id = room_id;
            self.selected = None;
        }
    }

    pub fn select(&mut self, hotspot_id: &str) -> AppResult<()> {
        let room = self.room()?;
        if room.hotspot(hotspot_id).is_none() {
            return Err(DomainError::HotspotNotFound(hotspot_id.into()));
        }
        self.selected = Some(hotspot_id.into());
        Ok(())
    }

    pub fn set_target(&mut self, target: EditTarget) {
        self.target = target;
    }

    pub fn nudge(&mut self, dx: f64, dy: f64) -> AppResult<Hotspot> {
        self.adjust(dx, dy, 0.0, 0.0)
    }

    pub fn resize(&mut self, dw: f64, dh: f64) -> AppResult<Hotspot> {
        if self.target == EditTarget::WalkTarget {
            return Err(DomainError::validation("walkTarget", "a walk target has no size"));
        }
        self.adjust(0.0, 0.0, dw, dh)
    }

    /// The room's hotspots as pretty JSON, ready to paste into a room file.
    pub fn copy_json(&self) -> AppResult<String> {
        let room = self.room()?;
        Ok(serde_json::to_string_pretty(&room.hotspots)?)
    }

    /// Persist the current room. Returns status text; failures leave the
    /// in-memory room untouched.
    pub async fn save(&self) -> String {
        let Ok(room) = self.room() else {
            return format!("Save failed: unknown room {}", self.room_id);
        };
        match self.service.save_room(&room).await {
            Ok(path) => {
                info!(room_id = %self.room_id, file = %path.display(), "dev editor saved room");
                format!("Saved {} to {}", self.room_id, path.display())
            }
            Err(e) => {
                warn!(room_id = %self.room_id, error = %e, "dev editor save failed");
                format!("Save failed: {}", e)
            }
        }
    }

    fn room(&self) -> AppResult<Arc<RoomDefinition>> {
        self.rooms
            .get(self.room_id.as_str())
            .ok_or_else(|| DomainError::RoomNotFound(self.room_id.clone()))
    }

    fn adjust(&mut self, dx: f64, dy: f64, dw: f64, dh: f64) -> AppResult<Hotspot> {
        let Some(hotspot_id) = self.selected.clone() else {
            return Err(DomainError::validation("hotspot", "no hotspot selected"));
        };
        let target = self.target;
        let room = self.rooms.update_hotspot(self.room_id.as_str(), hotspot_id.as_str(), |h| match target {
            EditTarget::WalkTarget => {
                h.walk_target.x += dx;
                h.walk_target.y += dy;
            }
            EditTarget::Bounds => adjust_rect(&mut h.bounds, dx, dy, dw, dh),
            EditTarget::SpriteBounds => {
                let bounds = h.bounds;
                adjust_rect(h.sprite_bounds.get_or_insert(bounds), dx, dy, dw, dh);
            }
        })?;
        room.hotspot(hotspot_id.as_str())
            .cloned()
            .ok_or(DomainError::HotspotNotFound(hotspot_id))
    }
}

fn adjust_rect(rect: &mut Rect, dx: f64, dy: f64, dw: f64, dh: f64) {
    rect.x += dx;
    rect.y += dy;
    rect.w = (rect.w + dw).max(MIN_SIZE);
    rect.h = (rect.h + dh).max(MIN_SIZE);
}
