use crate::models::flags::Flags;
use crate::models::inventory::InventoryItem;
use crate::models::types::{HotspotId, ItemId, RoomId, Verb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The atomic effect of resolving one interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptResult {
    /// Shown one at a time, in order
    pub dialogue_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_flags: Option<Flags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_inventory_item: Option<InventoryItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_inventory_item_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_change_to: Option<RoomId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clear_selected_inventory: bool,
}

impl ScriptResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn line(line: impl Into<String>) -> Self {
        Self {
            dialogue_lines: vec![line.into()],
            ..Self::default()
        }
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.set_flags.get_or_insert_with(Flags::new).insert(name.into(), value);
        self
    }

    pub fn with_room_change(mut self, room: impl Into<RoomId>) -> Self {
        self.room_change_to = Some(room.into());
        self
    }

    pub fn with_item(mut self, item: InventoryItem) -> Self {
        self.add_inventory_item = Some(item);
        self
    }

    pub fn clearing_selection(mut self) -> Self {
        self.clear_selected_inventory = true;
        self
    }

    /// Merge chart bookkeeping flags; they win over the result's own values.
    pub fn merge_flags(&mut self, update: Flags) {
        if update.is_empty() {
            return;
        }
        let flags = self.set_flags.get_or_insert_with(Flags::new);
        flags.extend(update);
    }
}

/// Flag predicates. An empty list always passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagConditions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags_all: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags_any: Vec<String>,
    #[serde(default, alias = "flagsNone", skip_serializing_if = "Vec::is_empty")]
    pub flags_not: Vec<String>,
}

/// Flat rule: first match in declaration order wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomScriptRule {
    pub hotspot_id: HotspotId,
    pub verb: Verb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_item_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub require_no_inventory_item: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<FlagConditions>,
    pub result: ScriptResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartTransition {
    pub hotspot_id: HotspotId,
    pub verb: Verb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_item_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub require_no_inventory_item: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<FlagConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_state: Option<String>,
    pub result: ScriptResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartState {
    pub id: String,
    #[serde(default)]
    pub transitions: Vec<ChartTransition>,
}

/// Single linear state machine whose current state lives in
/// `chartState:{room}:{state}` flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInteractionChart {
    pub initial_state: String,
    pub states: Vec<ChartState>,
}

impl RoomInteractionChart {
    pub fn state(&self, id: &str) -> Option<&ChartState> {
        self.states.iter().find(|s| s.id == id)
    }

    pub fn state_ids(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelWhen {
    /// node id → required state id, all must hold
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_states_all: BTreeMap<String, String>,
    #[serde(flatten)]
    pub flags: FlagConditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelTransition {
    pub hotspot_id: HotspotId,
    pub verb: Verb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_item_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub require_no_inventory_item: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<ParallelWhen>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_node_states: BTreeMap<String, String>,
    pub result: ScriptResult,
}

/// Independently tracked nodes, each in one state, persisted as
/// `chartNode:{room}:{node}:{state}` flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomParallelStateChart {
    pub initial_states: BTreeMap<String, String>,
    #[serde(default)]
    pub transitions: Vec<ParallelTransition>,
}

impl RoomParallelStateChart {
    /// Every state id mentioned for `node`, initial state first.
    pub fn node_states(&self, node: &str) -> Vec<&str> {
        let mentioned = self.initial_states.get(node).into_iter().chain(self.transitions.iter().flat_map(|t| {
            let when = t.when.as_ref().and_then(|w| w.node_states_all.get(node));
            when.into_iter().chain(t.set_node_states.get(node))
        }));

        let mut out: Vec<&str> = Vec::new();
        for s in mentioned {
            if !out.contains(&s.as_str()) {
                out.push(s.as_str());
            }
        }
        out
    }

    pub fn nodes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.initial_states.keys().map(String::as_str).collect();
        for t in &self.transitions {
            let when_nodes = t.when.iter().flat_map(|w| w.node_states_all.keys());
            for n in when_nodes.chain(t.set_node_states.keys()) {
                if !out.contains(&n.as_str()) {
                    out.push(n.as_str());
                }
            }
        }
        out
    }
}

/// Guard of a generic chart transition; every present predicate must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericGuard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot_id: Option<HotspotId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub require_no_item: bool,
    #[serde(flatten)]
    pub flags: FlagConditions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericTransition {
    #[serde(default, alias = "cond", skip_serializing_if = "Option::is_none")]
    pub guard: Option<GenericGuard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, alias = "actions", skip_serializing_if = "Option::is_none")]
    pub result: Option<ScriptResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericState {
    /// Event key (verb name or `*`) → candidate transitions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, Vec<GenericTransition>>,
}

/// Room-authored event-condition-action chart. Events are verbs applied to
/// hotspots; the first transition whose guard holds fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericChart {
    #[serde(default = "default_chart_id")]
    pub id: String,
    pub initial: String,
    #[serde(default)]
    pub states: BTreeMap<String, GenericState>,
    /// Evaluated after the current state's own transitions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, Vec<GenericTransition>>,
}

pub const WILDCARD_EVENT: &str = "*";

fn default_chart_id() -> String {
    "chart".to_string()
}

impl GenericChart {
    pub fn state_ids(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    /// All transitions with their event keys, state-local first.
    pub fn all_transitions(&self) -> impl Iterator<Item = (&str, &GenericTransition)> {
        self.states
            .values()
            .flat_map(|s| s.on.iter())
            .chain(self.on.iter())
            .flat_map(|(k, ts)| ts.iter().map(move |t| (k.as_str(), t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_result_wire_format_is_camel_case_and_sparse() {
        let r = ScriptResult::line("Hi").with_flag("doorOpen", true).clearing_selection();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["dialogueLines"][0], "Hi");
        assert_eq!(v["setFlags"]["doorOpen"], true);
        assert_eq!(v["clearSelectedInventory"], true);
        assert!(v.get("roomChangeTo").is_none());
        assert!(v.get("addInventoryItem").is_none());
    }

    #[test]
    fn merge_flags_overrides_existing() {
        let mut r = ScriptResult::line("x").with_flag("a", false);
        r.merge_flags([("a".to_string(), true), ("b".to_string(), false)].into());
        let f = r.set_flags.unwrap();
        assert_eq!(f.get("a"), Some(&true));
        assert_eq!(f.get("b"), Some(&false));
    }

    #[test]
    fn parallel_node_states_collects_in_order() {
        let json = r#"{
            "initialStates": {"lamp": "off"},
            "transitions": [
                {"hotspotId": "lamp", "verb": "USE", "when": {"nodeStatesAll": {"lamp": "off"}},
                 "setNodeStates": {"lamp": "on", "fan": "spinning"}, "result": {"dialogueLines": []}},
                {"hotspotId": "lamp", "verb": "USE", "when": {"nodeStatesAll": {"lamp": "broken"}, "flagsAll": ["x"]},
                 "result": {"dialogueLines": []}}
            ]
        }"#;
        let chart: RoomParallelStateChart = serde_json::from_str(json).unwrap();
        assert_eq!(chart.node_states("lamp"), vec!["off", "on", "broken"]);
        assert_eq!(chart.node_states("fan"), vec!["spinning"]);
        assert_eq!(chart.nodes(), vec!["lamp", "fan"]);
        assert_eq!(chart.transitions[1].when.as_ref().unwrap().flags.flags_all, vec!["x".to_string()]);
    }

    #[test]
    fn generic_chart_accepts_aliases() {
        let json = r#"{
            "initial": "idle",
            "states": {"idle": {"on": {"LOOK": [{"cond": {"hotspotId": "door", "flagsNone": ["a"]},
                                                 "target": "seen",
                                                 "actions": {"dialogueLines": ["Seen."]}}]}},
                       "seen": {}}
        }"#;
        let chart: GenericChart = serde_json::from_str(json).unwrap();
        assert_eq!(chart.id, "chart");
        let (key, t) = chart.all_transitions().next().unwrap();
        assert_eq!(key, "LOOK");
        assert_eq!(t.guard.as_ref().unwrap().flags.flags_not, vec!["a".to_string()]);
        assert_eq!(t.target.as_deref(), Some("seen"));
    }
}
