//! Event-condition-action interpreter for room-authored generic charts.
//!
//! A chart is compiled once into per-state tables of `(matcher, action)`
//! pairs. The compiled instance is cached per room id and rebuilt whenever
//! the room carries a different chart definition (by `Arc` identity). The
//! current state itself is never cached; it is re-derived from flags on
//! every call, so identical inputs always give identical outputs.

use crate::models::flags::{self, Flags};
use crate::models::rules::{GenericChart, GenericGuard, GenericTransition, ScriptResult, WILDCARD_EVENT};
use crate::models::types::{RoomId, Verb};
use crate::scripting::Query;
use crate::scripting::conditions::{flags_match, item_matches};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct CompiledTransition {
    event: Option<Verb>, // None = wildcard
    guard: GenericGuard,
    target: Option<String>,
    result: ScriptResult,
}

impl CompiledTransition {
    fn matches(&self, query: &Query<'_>) -> bool {
        let Some(verb) = query.verb else {
            return false;
        };
        if self.event.is_some_and(|e| e != verb) {
            return false;
        }
        let g = &self.guard;
        g.hotspot_id.as_ref().is_none_or(|h| *h == query.hotspot_id)
            && item_matches(g.item_id.as_ref(), g.require_no_item, query.item)
            && flags_match(&g.flags, query.flags)
    }
}

/// A chart definition compiled for one room.
#[derive(Debug)]
pub struct ChartInstance {
    definition: Arc<GenericChart>,
    state_ids: Vec<String>,
    /// state id → candidate transitions in evaluation order
    tables: BTreeMap<String, Vec<CompiledTransition>>,
}

fn compile_event_table(on: &BTreeMap<String, Vec<GenericTransition>>) -> Vec<CompiledTransition> {
    // Verb-keyed entries first, then the wildcard, each in authored order.
    let specific = on.iter().filter_map(|(k, ts)| Verb::parse(k).map(|v| (Some(v), ts)));
    let wildcard = on.iter().filter(|(k, _)| k.as_str() == WILDCARD_EVENT).map(|(_, ts)| (None, ts));

    specific
        .chain(wildcard)
        .flat_map(|(event, ts)| {
            ts.iter().map(move |t| CompiledTransition {
                event,
                guard: t.guard.clone().unwrap_or_default(),
                target: t.target.clone(),
                result: t.result.clone().unwrap_or_default(),
            })
        })
        .collect()
}

impl ChartInstance {
    pub fn compile(definition: Arc<GenericChart>) -> Self {
        let global = compile_event_table(&definition.on);
        let tables = definition
            .states
            .iter()
            .map(|(id, state)| {
                let mut table = compile_event_table(&state.on);
                table.extend(global.iter().cloned());
                (id.clone(), table)
            })
            .collect();
        let state_ids = definition.states.keys().cloned().collect();
        Self {
            definition,
            state_ids,
            tables,
        }
    }

    pub fn is_for(&self, definition: &Arc<GenericChart>) -> bool {
        Arc::ptr_eq(&self.definition, definition)
    }

    /// First state whose presence flag is set, else the initial state.
    pub fn current_state(&self, room_id: &RoomId, flags: &Flags) -> &str {
        let chart_id = &self.definition.id;
        self.state_ids
            .iter()
            .find(|s| flags::is_set(flags, &flags::generic_state_flag(room_id, chart_id, s)))
            .map(String::as_str)
            .unwrap_or(self.definition.initial.as_str())
    }

    /// Evaluate without side effects; `None` when no transition fires.
    pub fn evaluate(&self, query: &Query<'_>) -> Option<ScriptResult> {
        let current = self.current_state(query.room_id, query.flags);
        let t = self.tables.get(current)?.iter().find(|t| t.matches(query))?;

        let mut result = t.result.clone();
        if let Some(target) = t.target.as_deref() {
            let chart_id = &self.definition.id;
            let update = flags::exclusive_update(self.state_ids.iter().map(String::as_str), target, |s| {
                flags::generic_state_flag(query.room_id, chart_id, s)
            });
            result.merge_flags(update);
        }
        Some(result)
    }
}

/// At most one live chart instance per room id.
#[derive(Debug, Default)]
pub struct ChartRuntime {
    instances: DashMap<RoomId, Arc<ChartInstance>>,
}

impl ChartRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached instance for the room, rebuilt when the definition changed.
    pub fn instance(&self, room_id: &RoomId, definition: &Arc<GenericChart>) -> Arc<ChartInstance> {
        if let Some(existing) = self.instances.get(room_id) {
            if existing.is_for(definition) {
                return existing.clone();
            }
        }
        debug!(%room_id, chart = %definition.id, "compiling generic chart");
        let fresh = Arc::new(ChartInstance::compile(definition.clone()));
        self.instances.insert(room_id.clone(), fresh.clone());
        fresh
    }

    pub fn resolve(&self, definition: &Arc<GenericChart>, query: &Query<'_>) -> Option<ScriptResult> {
        self.instance(query.room_id, definition).evaluate(query)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn forget(&self, room_id: &RoomId) {
        self.instances.remove(room_id);
    }
}
