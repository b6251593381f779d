use crate::models::flags::{Flags, is_set};
use crate::models::rules::FlagConditions;
use crate::models::types::{HotspotId, ItemId, Verb};
use crate::scripting::Query;

pub fn flags_match(cond: &FlagConditions, flags: &Flags) -> bool {
    cond.flags_all.iter().all(|f| is_set(flags, f))
        && (cond.flags_any.is_empty() || cond.flags_any.iter().any(|f| is_set(flags, f)))
        && !cond.flags_not.iter().any(|f| is_set(flags, f))
}

pub fn opt_flags_match(cond: Option<&FlagConditions>, flags: &Flags) -> bool {
    cond.map(|c| flags_match(c, flags)).unwrap_or(true)
}

/// `required` must equal the selected item; `require_none` demands no selection.
pub fn item_matches(required: Option<&ItemId>, require_none: bool, item: Option<&str>) -> bool {
    if require_none && item.is_some() {
        return false;
    }
    match required {
        Some(req) => item == Some(req.as_str()),
        None => true,
    }
}

/// Hotspot + verb + item predicate shared by rules and chart transitions.
pub fn trigger_matches(
    hotspot_id: &HotspotId,
    verb: Verb,
    required_item: Option<&ItemId>,
    require_no_item: bool,
    query: &Query<'_>,
) -> bool {
    query.verb == Some(verb)
        && *hotspot_id == query.hotspot_id
        && item_matches(required_item, require_no_item, query.item)
}
