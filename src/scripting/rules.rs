use crate::models::rules::{RoomScriptRule, ScriptResult};
use crate::scripting::Query;
use crate::scripting::conditions::{opt_flags_match, trigger_matches};

/// First rule in declaration order whose predicates all hold.
pub fn resolve(rules: &[RoomScriptRule], query: &Query<'_>) -> Option<ScriptResult> {
    rules
        .iter()
        .find(|r| {
            trigger_matches(
                &r.hotspot_id,
                r.verb,
                r.inventory_item_id.as_ref(),
                r.require_no_inventory_item,
                query,
            ) && opt_flags_match(r.conditions.as_ref(), query.flags)
        })
        .map(|r| r.result.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::flags::Flags;
    use crate::models::rules::FlagConditions;
    use crate::models::types::{RoomId, Verb};

    fn mk_rule(hotspot: &str, verb: Verb, line: &str) -> RoomScriptRule {
        RoomScriptRule {
            hotspot_id: hotspot.into(),
            verb,
            inventory_item_id: None,
            require_no_inventory_item: false,
            conditions: None,
            result: ScriptResult::line(line),
        }
    }

    fn query<'a>(room: &'a RoomId, flags: &'a Flags, hotspot: &'a str, verb: Verb, item: Option<&'a str>) -> Query<'a> {
        Query {
            room_id: room,
            hotspot_id: hotspot,
            verb: Some(verb),
            item,
            flags,
        }
    }

    #[test]
    fn first_match_wins() {
        let room = RoomId::from("room1");
        let flags = Flags::new();
        let rules = vec![
            mk_rule("sign", Verb::Talk, "no"),
            mk_rule("sign", Verb::Look, "first"),
            mk_rule("sign", Verb::Look, "second"),
        ];
        let r = resolve(&rules, &query(&room, &flags, "sign", Verb::Look, None)).unwrap();
        assert_eq!(r.dialogue_lines, vec!["first".to_string()]);
    }

    #[test]
    fn conditions_and_items_gate_rules() {
        let room = RoomId::from("room1");
        let mut gated = mk_rule("door", Verb::Use, "with key");
        gated.inventory_item_id = Some("key".into());
        gated.conditions = Some(FlagConditions {
            flags_not: vec!["doorOpen".into()],
            ..Default::default()
        });
        let mut bare = mk_rule("door", Verb::Use, "bare hands");
        bare.require_no_inventory_item = true;
        let rules = vec![gated, bare];

        let closed = Flags::new();
        let r = resolve(&rules, &query(&room, &closed, "door", Verb::Use, Some("key"))).unwrap();
        assert_eq!(r.dialogue_lines[0], "with key");

        let r = resolve(&rules, &query(&room, &closed, "door", Verb::Use, None)).unwrap();
        assert_eq!(r.dialogue_lines[0], "bare hands");

        let open: Flags = [("doorOpen".to_string(), true)].into();
        assert!(resolve(&rules, &query(&room, &open, "door", Verb::Use, Some("key"))).is_none());
        assert!(resolve(&rules, &query(&room, &closed, "door", Verb::Use, Some("rope"))).is_none());
    }

    #[test]
    fn no_verb_never_matches() {
        let room = RoomId::from("room1");
        let flags = Flags::new();
        let rules = vec![mk_rule("sign", Verb::Look, "x")];
        let mut p = query(&room, &flags, "sign", Verb::Look, None);
        p.verb = None;
        assert!(resolve(&rules, &p).is_none());
    }
}
