use crate::error::{AppResult, DomainError};
use crate::models::rules::{GenericChart, ScriptResult, WILDCARD_EVENT};
use crate::models::room::{Hotspot, RoomDefinition};
use crate::models::types::{Point, Rect, RoomId, Verb};
use crate::util::list_room_files_guarded;
use anyhow::Context;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Json,
    Yaml,
}

impl DocFormat {
    pub fn from_path(p: &Path) -> Self {
        match p.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(e) if e == "yml" || e == "yaml" => DocFormat::Yaml,
            _ => DocFormat::Json,
        }
    }
}

/// Every room from a directory, keyed by id, plus the file each came from.
#[derive(Debug, Clone)]
pub struct RoomSet {
    pub rooms: BTreeMap<RoomId, RoomDefinition>,
    pub sources: BTreeMap<RoomId, PathBuf>,
    pub default_room: RoomId,
}

/// Parse, normalise and validate one room document.
pub fn parse_room_str(text: &str, format: DocFormat) -> AppResult<RoomDefinition> {
    let mut room: RoomDefinition = match format {
        DocFormat::Json => serde_json::from_str(text)?,
        DocFormat::Yaml => serde_yaml::from_str(text)?,
    };
    normalise_room(&mut room);
    validate_room(&room)?;
    Ok(room)
}

pub fn parse_room_value(value: serde_json::Value) -> AppResult<RoomDefinition> {
    let mut room: RoomDefinition = serde_json::from_value(value)?;
    normalise_room(&mut room);
    validate_room(&room)?;
    Ok(room)
}

pub fn parse_room_file(path: &Path) -> anyhow::Result<RoomDefinition> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let room = parse_room_str(&text, DocFormat::from_path(path))
        .with_context(|| format!("invalid room config in {}", path.display()))?;
    Ok(room)
}

/// Load all room documents in `dir`. Any invalid file aborts the load.
pub fn load_rooms_dir(dir: &Path, configured_default: Option<&str>) -> anyhow::Result<RoomSet> {
    let files = list_room_files_guarded(dir)?;
    let mut rooms = BTreeMap::new();
    let mut sources = BTreeMap::new();

    for path in files {
        let room = parse_room_file(&path)?;
        if rooms.contains_key(&room.id) {
            return Err(DomainError::DuplicateRoom {
                room_id: room.id.clone(),
                source_name: path.display().to_string(),
            }
            .into());
        }
        debug!(room_id = %room.id, file = %path.display(), hotspots = room.hotspots.len(), "room parsed");
        sources.insert(room.id.clone(), path);
        rooms.insert(room.id.clone(), room);
    }

    let default_room = pick_default_room(rooms.keys(), configured_default)?;
    info!(count = rooms.len(), dir = %dir.display(), default_room = %default_room, "rooms loaded");

    Ok(RoomSet {
        rooms,
        sources,
        default_room,
    })
}

/// Configured id if given (it must exist), else `room1`, else the first id.
pub fn pick_default_room<'a, I>(ids: I, configured: Option<&str>) -> AppResult<RoomId>
where
    I: IntoIterator<Item = &'a RoomId>,
{
    let mut ids: Vec<&RoomId> = ids.into_iter().collect();
    ids.sort();
    if ids.is_empty() {
        return Err(DomainError::NoRooms);
    }
    if let Some(c) = configured {
        return ids
            .iter()
            .find(|id| **id == c)
            .map(|id| (*id).clone())
            .ok_or_else(|| DomainError::RoomNotFound(RoomId::from(c)));
    }
    if let Some(r1) = ids.iter().find(|id| **id == "room1") {
        return Ok((*r1).clone());
    }
    Ok(ids[0].clone())
}

fn clean_opt<K: AsRef<str> + From<String>>(v: &mut Option<K>) {
    if let Some(k) = v.take() {
        let t = k.as_ref().trim();
        if !t.is_empty() {
            *v = Some(K::from(t.to_string()));
        }
    }
}

fn normalise_result(r: &mut ScriptResult) {
    r.dialogue_lines = r
        .dialogue_lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    clean_opt(&mut r.remove_inventory_item_id);
    clean_opt(&mut r.room_change_to);

    if let Some(item) = r.add_inventory_item.take() {
        let (id, name) = (item.id.as_str().trim(), item.name.trim());
        if !id.is_empty() && !name.is_empty() {
            r.add_inventory_item = Some(crate::models::inventory::InventoryItem::new(id, name));
        }
    }
    if let Some(flags) = r.set_flags.as_mut() {
        flags.retain(|k, _| !k.trim().is_empty());
        if flags.is_empty() {
            r.set_flags = None;
        }
    }
}

fn normalise_generic(chart: &mut GenericChart) {
    let tables = chart.states.values_mut().map(|s| &mut s.on).chain(std::iter::once(&mut chart.on));
    for table in tables {
        for t in table.values_mut().flatten() {
            clean_opt(&mut t.target);
            if let Some(r) = t.result.as_mut() {
                normalise_result(r);
            }
            if let Some(g) = t.guard.as_mut() {
                clean_opt(&mut g.hotspot_id);
                clean_opt(&mut g.item_id);
            }
        }
    }
}

/// Trim authored strings; empty optional ids count as absent.
pub fn normalise_room(room: &mut RoomDefinition) {
    for h in &mut room.hotspots {
        clean_opt(&mut h.target_room_id);
        clean_opt(&mut h.walk_prompt);
    }
    for rule in &mut room.scripts {
        clean_opt(&mut rule.inventory_item_id);
        normalise_result(&mut rule.result);
    }
    if let Some(chart) = room.interaction_chart.as_mut() {
        for t in chart.states.iter_mut().flat_map(|s| s.transitions.iter_mut()) {
            clean_opt(&mut t.inventory_item_id);
            clean_opt(&mut t.to_state);
            normalise_result(&mut t.result);
        }
    }
    if let Some(chart) = room.parallel_state_chart.as_mut() {
        for t in &mut chart.transitions {
            clean_opt(&mut t.inventory_item_id);
            t.set_node_states = std::mem::take(&mut t.set_node_states)
                .into_iter()
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                .collect();
            normalise_result(&mut t.result);
        }
    }
    if let Some(chart) = room.generic_chart.as_mut() {
        normalise_generic(std::sync::Arc::make_mut(chart));
    }
}

fn check_rect(field: &str, r: &Rect) -> AppResult<()> {
    if !r.is_finite() {
        return Err(DomainError::validation(field, "expected finite x/y/w/h"));
    }
    Ok(())
}

fn check_point(field: &str, p: &Point) -> AppResult<()> {
    if !p.is_finite() {
        return Err(DomainError::validation(field, "expected finite x/y"));
    }
    Ok(())
}

fn validate_hotspot(room_id: &RoomId, h: &Hotspot) -> AppResult<()> {
    if h.id.is_blank() {
        return Err(DomainError::validation(format!("{}.hotspots", room_id), "hotspot id empty"));
    }
    let field = |f: &str| format!("{}.{}.{}", room_id, h.id, f);
    check_rect(&field("bounds"), &h.bounds)?;
    if let Some(sb) = &h.sprite_bounds {
        check_rect(&field("spriteBounds"), sb)?;
    }
    check_point(&field("walkTarget"), &h.walk_target)?;
    if let Some(ep) = &h.target_room_entry_point {
        check_point(&field("targetRoomEntryPoint"), ep)?;
    }
    if let Some(sprite) = &h.sprite {
        if sprite.flag_variants.iter().any(|v| v.flag.trim().is_empty()) {
            return Err(DomainError::validation(field("sprite.flagVariants"), "expected non-empty \"flag\""));
        }
    }
    Ok(())
}

fn validate_generic_chart(room_id: &RoomId, chart: &GenericChart) -> AppResult<()> {
    if !chart.states.contains_key(&chart.initial) {
        return Err(DomainError::UnknownInitialState {
            room_id: room_id.clone(),
            chart: "genericChart",
            state: chart.initial.clone(),
        });
    }
    for (event, t) in chart.all_transitions() {
        if event != WILDCARD_EVENT && Verb::parse(event).is_none() {
            return Err(DomainError::validation(
                format!("{}.genericChart.on", room_id),
                format!("unknown event \"{}\"", event),
            ));
        }
        if let Some(target) = &t.target {
            if !chart.states.contains_key(target) {
                return Err(DomainError::validation(
                    format!("{}.genericChart", room_id),
                    format!("transition targets unknown state \"{}\"", target),
                ));
            }
        }
    }
    Ok(())
}

pub fn validate_room(room: &RoomDefinition) -> AppResult<()> {
    if room.id.is_blank() {
        return Err(DomainError::validation("room", "room id empty"));
    }
    if !room.width.is_finite() || !room.height.is_finite() {
        return Err(DomainError::validation(
            format!("{}.size", room.id),
            "width/height must be numbers",
        ));
    }

    // hotspot ids unique
    let mut ids = HashSet::new();
    for h in &room.hotspots {
        validate_hotspot(&room.id, h)?;
        if !ids.insert(h.id.as_str()) {
            return Err(DomainError::DuplicateHotspot {
                room_id: room.id.clone(),
                hotspot_id: h.id.clone(),
            });
        }
    }

    if let Some(poly) = &room.walkable_polygon {
        for p in poly {
            check_point(&format!("{}.walkablePolygon", room.id), p)?;
        }
    }
    if let Some(p) = &room.perspective {
        if ![p.far_y, p.near_y, p.far_scale, p.near_scale].iter().all(|v| v.is_finite()) {
            return Err(DomainError::validation(format!("{}.perspective", room.id), "expected numbers"));
        }
    }

    if let Some(chart) = &room.interaction_chart {
        let mut state_ids = HashSet::new();
        for s in &chart.states {
            if s.id.trim().is_empty() || !state_ids.insert(s.id.as_str()) {
                return Err(DomainError::validation(
                    format!("{}.interactionChart.states", room.id),
                    format!("state id \"{}\" empty or duplicated", s.id),
                ));
            }
        }
        if !state_ids.contains(chart.initial_state.as_str()) {
            return Err(DomainError::UnknownInitialState {
                room_id: room.id.clone(),
                chart: "interactionChart",
                state: chart.initial_state.clone(),
            });
        }
        for t in chart.states.iter().flat_map(|s| s.transitions.iter()) {
            if let Some(to) = &t.to_state {
                if !state_ids.contains(to.as_str()) {
                    return Err(DomainError::validation(
                        format!("{}.interactionChart", room.id),
                        format!("toState \"{}\" is not a declared state", to),
                    ));
                }
            }
        }
    }

    if let Some(chart) = &room.parallel_state_chart {
        for (node, state) in &chart.initial_states {
            if node.trim().is_empty() || state.trim().is_empty() {
                return Err(DomainError::validation(
                    format!("{}.parallelStateChart.initialStates", room.id),
                    "invalid initialStates entry",
                ));
            }
        }
    }

    if let Some(chart) = &room.generic_chart {
        validate_generic_chart(&room.id, chart)?;
    }

    Ok(())
}
