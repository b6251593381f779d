use crate::models::flags::{self, Flags};
use crate::models::rules::{ParallelTransition, RoomParallelStateChart, ScriptResult};
use crate::models::types::RoomId;
use crate::scripting::Query;
use crate::scripting::conditions::{flags_match, trigger_matches};

/// Active state of `node`: first known state whose presence flag is set,
/// else the node's initial state.
pub fn node_state<'c>(chart: &'c RoomParallelStateChart, room_id: &RoomId, node: &str, flags: &Flags) -> Option<&'c str> {
    let states = chart.node_states(node);
    states
        .iter()
        .copied()
        .find(|s| flags::is_set(flags, &flags::chart_node_flag(room_id, node, s)))
        .or_else(|| chart.initial_states.get(node).map(String::as_str))
}

fn transition_matches(chart: &RoomParallelStateChart, t: &ParallelTransition, query: &Query<'_>) -> bool {
    if !trigger_matches(
        &t.hotspot_id,
        t.verb,
        t.inventory_item_id.as_ref(),
        t.require_no_inventory_item,
        query,
    ) {
        return false;
    }
    let Some(when) = t.when.as_ref() else {
        return true;
    };
    when.node_states_all
        .iter()
        .all(|(node, want)| node_state(chart, query.room_id, node, query.flags) == Some(want.as_str()))
        && flags_match(&when.flags, query.flags)
}

/// Full set of presence flag updates so each affected node ends with
/// exactly one state flag true.
pub fn node_updates(chart: &RoomParallelStateChart, room_id: &RoomId, set: &std::collections::BTreeMap<String, String>) -> Flags {
    let mut out = Flags::new();
    for (node, to) in set {
        let update = flags::exclusive_update(chart.node_states(node), to, |s| {
            flags::chart_node_flag(room_id, node, s)
        });
        out.extend(update);
    }
    out
}

pub fn resolve(chart: &RoomParallelStateChart, query: &Query<'_>) -> Option<ScriptResult> {
    let t = chart.transitions.iter().find(|t| transition_matches(chart, t, query))?;
    let mut result = t.result.clone();
    result.merge_flags(node_updates(chart, query.room_id, &t.set_node_states));
    Some(result)
}
