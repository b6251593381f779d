use crate::models::flags::{self, Flags};
use crate::models::rules::{RoomInteractionChart, ScriptResult};
use crate::models::types::RoomId;
use crate::scripting::Query;
use crate::scripting::conditions::{opt_flags_match, trigger_matches};

/// First declared state whose presence flag is set, else the initial state.
pub fn active_state<'c>(chart: &'c RoomInteractionChart, room_id: &RoomId, flags: &Flags) -> &'c str {
    chart
        .state_ids()
        .find(|s| flags::is_set(flags, &flags::chart_state_flag(room_id, s)))
        .unwrap_or(chart.initial_state.as_str())
}

/// Presence flags for every state, with only `to` set.
pub fn state_overwrite(chart: &RoomInteractionChart, room_id: &RoomId, to: &str) -> Flags {
    flags::exclusive_update(chart.state_ids(), to, |s| flags::chart_state_flag(room_id, s))
}

pub fn resolve(chart: &RoomInteractionChart, query: &Query<'_>) -> Option<ScriptResult> {
    let current = active_state(chart, query.room_id, query.flags);
    let state = chart.state(current)?;

    let t = state.transitions.iter().find(|t| {
        trigger_matches(
            &t.hotspot_id,
            t.verb,
            t.inventory_item_id.as_ref(),
            t.require_no_inventory_item,
            query,
        ) && opt_flags_match(t.conditions.as_ref(), query.flags)
    })?;

    let mut result = t.result.clone();
    if let Some(to) = t.to_state.as_deref() {
        result.merge_flags(state_overwrite(chart, query.room_id, to));
    }
    Some(result)
}
