use crate::models::room::{Hotspot, RoomDefinition};
use crate::models::rules::ScriptResult;
use crate::scripting::{self, ChartRuntime, Query};
use crate::services::builtin::{self, HeldItem};
use crate::services::lines::DialogueCatalog;
use crate::state::context::GameContext;
use std::sync::Arc;
use tracing::debug;

/// Which layer produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    GenericChart,
    ParallelChart,
    LinearChart,
    Rules,
    RoomLink,
    BuiltIn,
    Fallback,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::GenericChart => "genericChart",
            Layer::ParallelChart => "parallelStateChart",
            Layer::LinearChart => "interactionChart",
            Layer::Rules => "scripts",
            Layer::RoomLink => "roomLink",
            Layer::BuiltIn => "builtIn",
            Layer::Fallback => "fallback",
        }
    }
}

/// Turns (context, room, hotspot) into a [`ScriptResult`]. Never fails.
pub struct InteractionResolver {
    lines: Arc<DialogueCatalog>,
    charts: ChartRuntime,
}

impl Default for InteractionResolver {
    fn default() -> Self {
        Self::new(Arc::new(DialogueCatalog::default()))
    }
}

impl InteractionResolver {
    pub fn new(lines: Arc<DialogueCatalog>) -> Self {
        Self {
            lines,
            charts: ChartRuntime::new(),
        }
    }

    pub fn lines(&self) -> &DialogueCatalog {
        &self.lines
    }

    pub fn charts(&self) -> &ChartRuntime {
        &self.charts
    }

    pub fn resolve(&self, ctx: &GameContext, room: &RoomDefinition, hotspot: &Hotspot) -> ScriptResult {
        self.resolve_with_layer(ctx, room, hotspot).0
    }

    pub fn resolve_with_layer(&self, ctx: &GameContext, room: &RoomDefinition, hotspot: &Hotspot) -> (ScriptResult, Layer) {
        let verb = ctx.effective_verb();
        let item_id = ctx.effective_item().map(|i| i.as_str());
        let query = Query {
            room_id: &room.id,
            hotspot_id: hotspot.id.as_str(),
            verb,
            item: item_id,
            flags: &ctx.flags,
        };

        let (result, layer) = self.layered(&query, room, hotspot).unwrap_or_else(|| {
            let held = item_id.map(|id| HeldItem {
                id,
                name: ctx.inventory.display_name(id),
            });
            match verb {
                Some(v) => (builtin::resolve(&self.lines, hotspot, v, held, &ctx.flags), Layer::BuiltIn),
                None => (builtin::generic(&self.lines), Layer::Fallback),
            }
        });

        debug!(
            room_id = %room.id,
            hotspot = %hotspot.id,
            verb = ?verb,
            item = ?item_id,
            layer = layer.as_str(),
            lines = result.dialogue_lines.len(),
            "interaction resolved"
        );
        (result, layer)
    }

    /// Room-authored layers in fixed precedence.
    fn layered(&self, query: &Query<'_>, room: &RoomDefinition, hotspot: &Hotspot) -> Option<(ScriptResult, Layer)> {
        if let Some(chart) = &room.generic_chart {
            if let Some(r) = self.charts.resolve(chart, query) {
                return Some((r, Layer::GenericChart));
            }
        }
        if let Some(chart) = &room.parallel_state_chart {
            if let Some(r) = scripting::parallel::resolve(chart, query) {
                return Some((r, Layer::ParallelChart));
            }
        }
        if let Some(chart) = &room.interaction_chart {
            if let Some(r) = scripting::linear::resolve(chart, query) {
                return Some((r, Layer::LinearChart));
            }
        }
        if let Some(r) = scripting::rules::resolve(&room.scripts, query) {
            return Some((r, Layer::Rules));
        }
        if query.verb.is_none() {
            if let Some(r) = builtin::room_link(hotspot) {
                return Some((r, Layer::RoomLink));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::room::test_support::{mk_hotspot, mk_room};
    use crate::models::types::{RoomId, Verb};
    use crate::state::context::GameContext;

    fn ctx_with(verb: Option<Verb>) -> GameContext {
        let mut ctx = GameContext::new(RoomId::from("room1"));
        ctx.selected_verb = verb;
        ctx
    }

    #[test]
    fn no_rules_falls_to_builtin() {
        let res = InteractionResolver::default();
        let room = mk_room("room1", vec![mk_hotspot("sign", "Sign")]);
        let (r, layer) = res.resolve_with_layer(&ctx_with(Some(Verb::Talk)), &room, &room.hotspots[0]);
        assert_eq!(layer, Layer::BuiltIn);
        assert_eq!(r.dialogue_lines, vec![res.lines().interactions.talk.sign.clone()]);
    }

    #[test]
    fn no_verb_is_fallback_unless_room_link() {
        let res = InteractionResolver::default();
        let mut arch = mk_hotspot("arch", "Arch");
        let room = mk_room("room1", vec![arch.clone()]);
        let (r, layer) = res.resolve_with_layer(&ctx_with(None), &room, &arch);
        assert_eq!(layer, Layer::Fallback);
        assert!(res.lines().fallbacks.generic_default.contains(&r.dialogue_lines[0]));

        arch.target_room_id = Some("garden".into());
        let (r, layer) = res.resolve_with_layer(&ctx_with(None), &room, &arch);
        assert_eq!(layer, Layer::RoomLink);
        assert_eq!(r.room_change_to, Some(RoomId::from("garden")));
    }

    #[test]
    fn always_at_least_one_line_from_fallbacks() {
        let res = InteractionResolver::default();
        let room = mk_room("room1", vec![mk_hotspot("rock", "Rock")]);
        for verb in Verb::ALL.into_iter().map(Some).chain([None]) {
            let r = res.resolve(&ctx_with(verb), &room, &room.hotspots[0]);
            assert!(!r.dialogue_lines.is_empty(), "{verb:?}");
        }
    }
}
