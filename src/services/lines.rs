use rand::Rng;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

/// Randomised pools used when nothing more specific applies.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackLines {
    pub look_default: Vec<String>,
    pub talk_default: Vec<String>,
    pub pick_up_default: Vec<String>,
    pub open_default: Vec<String>,
    pub use_without_item_default: Vec<String>,
    pub use_default: Vec<String>,
    pub generic_default: Vec<String>,
}

impl Default for FallbackLines {
    fn default() -> Self {
        Self {
            look_default: owned(&[
                "You study it intensely. It studies right back by doing absolutely nothing.",
                "It looks important, in the way rocks sometimes look important.",
                "You squint. It remains committed to being mysterious.",
            ]),
            talk_default: owned(&[
                "You deliver a heartfelt speech. The audience remains imaginary.",
                "You try small talk. It chooses smaller silence.",
                "You ask a thoughtful question. Silence gives an equally thoughtful answer.",
            ]),
            pick_up_default: owned(&[
                "You can't pick up the {hotspot}. Physics has filed an objection.",
                "You give the {hotspot} a tug. It gives your shoulder a warning.",
                "The {hotspot} appears to be permanently employed by gravity.",
            ]),
            open_default: owned(&[
                "You can't open the {hotspot}. It has no obvious \"open\" setting.",
                "You hunt for hinges on the {hotspot}. The hinges remain mythical.",
                "You attempt the dramatic reveal. The {hotspot} declines to participate.",
            ]),
            use_without_item_default: owned(&[
                "Use what? Your winning personality is not in inventory.",
                "You are currently equipped with confidence and empty pockets.",
                "Great plan. Missing tool.",
            ]),
            use_default: owned(&[
                "Using {item} on {hotspot} mostly builds character.",
                "{item} and {hotspot} meet briefly, then agree to stay strangers.",
                "You combine {item} with {hotspot}. The universe remains unconvinced.",
            ]),
            generic_default: owned(&[
                "Bold strategy. Absolutely no effect.",
                "That felt important. It was not.",
                "You try it. Reality refuses the patch.",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookLines {
    pub door_closed: String,
    pub door_open: String,
    pub sign: String,
    pub key_present: String,
    pub key_taken: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TalkLines {
    pub door: String,
    pub sign: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickUpLines {
    pub key_success: String,
    pub key_already_taken: String,
    pub door_failure: String,
    pub sign_failure: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseLines {
    pub door_open_no_item_enter: String,
    pub door_need_key_first: String,
    pub door_already_unlocked: String,
    pub door_unlock_success: String,
    pub door_key_misaligned: String,
    pub door_generic: String,
    pub sign_key: String,
    pub sign_generic: String,
    pub key_generic: String,
    pub key_on_key: String,
    pub generic_key_item: String,
    pub door_without_item: String,
    pub sign_without_item: String,
    pub key_without_item: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenLines {
    pub locked_door: String,
    pub enter_open_door: String,
    pub sign_failure: String,
    pub key_failure: String,
}

/// Canned per-hotspot lines for the demo content.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionLines {
    pub look: LookLines,
    pub talk: TalkLines,
    pub pick_up: PickUpLines,
    pub use_: UseLines,
    pub open: OpenLines,
}

impl Default for InteractionLines {
    fn default() -> Self {
        Self {
            look: LookLines {
                door_closed: "A sturdy door with an old lock.".into(),
                door_open: "An open door. Adventure awaits.".into(),
                sign: "The sign reads: \"No random behavior beyond this point.\"".into(),
                key_present: "A brass key lies on the ground.".into(),
                key_taken: "It was here a second ago.".into(),
            },
            talk: TalkLines {
                door: "The door remains politely silent.".into(),
                sign: "You greet the sign. It ignores you with confidence.".into(),
                key: "You ask the key for life advice. It gives you the silent treatment.".into(),
            },
            pick_up: PickUpLines {
                key_success: "You pick up the brass key.".into(),
                key_already_taken: "You already picked up the key.".into(),
                door_failure: "You'd need a crane, a permit, and probably a better idea.".into(),
                sign_failure: "The sign is deeply rooted in its career.".into(),
            },
            use_: UseLines {
                door_open_no_item_enter: "You step through the open door.".into(),
                door_need_key_first: "You need to pick up the key first.".into(),
                door_already_unlocked: "The door is already unlocked.".into(),
                door_unlock_success: "The key turns with a click. The door swings open.".into(),
                door_key_misaligned: "You wave the key near the door dramatically. The lock requests actual alignment."
                    .into(),
                door_generic: "You try {item} on the door. The door remains unconvinced.".into(),
                sign_key: "You scratch the sign with the key. The sign files a complaint.".into(),
                sign_generic: "You try {item} on the sign. It still refuses to become useful.".into(),
                key_generic: "You try {item} on the key. They do not form a meaningful friendship.".into(),
                key_on_key: "You tap the key with itself. A breakthrough in advanced key technology.".into(),
                generic_key_item: "You poke the {hotspot} with the key. No secret mechanism reveals itself.".into(),
                door_without_item: "Use what on the door? Your optimism jiggles the handle, but not the lock.".into(),
                sign_without_item: "Use what on the sign? Stern eye contact is not a tool.".into(),
                key_without_item: "Use what on the key? You are currently holding exactly zero useful things.".into(),
            },
            open: OpenLines {
                locked_door: "It's locked.".into(),
                enter_open_door: "You step through the open door.".into(),
                sign_failure: "You try to open the sign. It remains a sign.".into(),
                key_failure: "You open your hand dramatically. The key is unimpressed.".into(),
            },
        }
    }
}

// Overlay helpers: a value replaces the default only when it is usable.

fn overlay_str(target: &mut String, section: Option<&Value>, key: &str) {
    if let Some(s) = section.and_then(|v| v.get(key)).and_then(Value::as_str) {
        if !s.trim().is_empty() {
            *target = s.to_string();
        }
    }
}

fn overlay_pool(target: &mut Vec<String>, raw: &Value, key: &str) {
    let Some(arr) = raw.get(key).and_then(Value::as_array) else {
        return;
    };
    let next: Vec<String> = arr
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .collect();
    if !next.is_empty() {
        *target = next;
    }
}

impl FallbackLines {
    pub fn overlay(&mut self, raw: &Value) {
        overlay_pool(&mut self.look_default, raw, "lookDefault");
        overlay_pool(&mut self.talk_default, raw, "talkDefault");
        overlay_pool(&mut self.pick_up_default, raw, "pickUpDefault");
        overlay_pool(&mut self.open_default, raw, "openDefault");
        overlay_pool(&mut self.use_without_item_default, raw, "useWithoutItemDefault");
        overlay_pool(&mut self.use_default, raw, "useDefault");
        overlay_pool(&mut self.generic_default, raw, "genericDefault");
    }
}

impl InteractionLines {
    pub fn overlay(&mut self, raw: &Value) {
        let look = raw.get("look");
        overlay_str(&mut self.look.door_closed, look, "doorClosed");
        overlay_str(&mut self.look.door_open, look, "doorOpen");
        overlay_str(&mut self.look.sign, look, "sign");
        overlay_str(&mut self.look.key_present, look, "keyPresent");
        overlay_str(&mut self.look.key_taken, look, "keyTaken");

        let talk = raw.get("talk");
        overlay_str(&mut self.talk.door, talk, "door");
        overlay_str(&mut self.talk.sign, talk, "sign");
        overlay_str(&mut self.talk.key, talk, "key");

        let pick = raw.get("pickUp");
        overlay_str(&mut self.pick_up.key_success, pick, "keySuccess");
        overlay_str(&mut self.pick_up.key_already_taken, pick, "keyAlreadyTaken");
        overlay_str(&mut self.pick_up.door_failure, pick, "doorFailure");
        overlay_str(&mut self.pick_up.sign_failure, pick, "signFailure");

        let u = raw.get("use");
        let lines = &mut self.use_;
        overlay_str(&mut lines.door_open_no_item_enter, u, "doorOpenNoItemEnter");
        overlay_str(&mut lines.door_need_key_first, u, "doorNeedKeyFirst");
        overlay_str(&mut lines.door_already_unlocked, u, "doorAlreadyUnlocked");
        overlay_str(&mut lines.door_unlock_success, u, "doorUnlockSuccess");
        overlay_str(&mut lines.door_key_misaligned, u, "doorKeyMisaligned");
        overlay_str(&mut lines.door_generic, u, "doorGeneric");
        overlay_str(&mut lines.sign_key, u, "signKey");
        overlay_str(&mut lines.sign_generic, u, "signGeneric");
        overlay_str(&mut lines.key_generic, u, "keyGeneric");
        overlay_str(&mut lines.key_on_key, u, "keyOnKey");
        overlay_str(&mut lines.generic_key_item, u, "genericKeyItem");
        overlay_str(&mut lines.door_without_item, u, "doorWithoutItem");
        overlay_str(&mut lines.sign_without_item, u, "signWithoutItem");
        overlay_str(&mut lines.key_without_item, u, "keyWithoutItem");

        let open = raw.get("open");
        overlay_str(&mut self.open.locked_door, open, "lockedDoor");
        overlay_str(&mut self.open.enter_open_door, open, "enterOpenDoor");
        overlay_str(&mut self.open.sign_failure, open, "signFailure");
        overlay_str(&mut self.open.key_failure, open, "keyFailure");
    }
}

/// All dialogue text the built-in layer can produce.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueCatalog {
    pub fallbacks: FallbackLines,
    pub interactions: InteractionLines,
}

pub const INTERACTIONS_FILE: &str = "interactions.json";
pub const FALLBACKS_FILE: &str = "fallbacks.json";

fn read_json_object(path: &Path) -> Option<Value> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "cannot read dialogue file; using defaults");
            return None;
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(v) if v.is_object() => Some(v),
        Ok(_) => {
            warn!(file = %path.display(), "dialogue file is not a JSON object; using defaults");
            None
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "malformed dialogue file; using defaults");
            None
        }
    }
}

impl DialogueCatalog {
    pub fn from_values(interactions: Option<&Value>, fallbacks: Option<&Value>) -> Self {
        let mut cat = Self::default();
        if let Some(v) = interactions {
            cat.interactions.overlay(v);
        }
        if let Some(v) = fallbacks {
            cat.fallbacks.overlay(v);
        }
        cat
    }

    /// Built-in lines overridden field by field from `dir`. Never fails.
    pub fn load_dir(dir: &Path) -> Self {
        let interactions = read_json_object(&dir.join(INTERACTIONS_FILE));
        let fallbacks = read_json_object(&dir.join(FALLBACKS_FILE));
        debug!(
            dir = %dir.display(),
            interactions = interactions.is_some(),
            fallbacks = fallbacks.is_some(),
            "dialogue catalog loaded"
        );
        Self::from_values(interactions.as_ref(), fallbacks.as_ref())
    }
}

/// Uniform pick; an empty pool yields `...`.
pub fn pick_random(lines: &[String]) -> String {
    if lines.is_empty() {
        return "...".to_string();
    }
    lines[rand::rng().random_range(0..lines.len())].clone()
}

/// Replace the first `{hotspot}` placeholder.
pub fn fill_hotspot(template: &str, hotspot: &str) -> String {
    template.replacen("{hotspot}", hotspot, 1)
}

pub fn fill_item(template: &str, item: &str) -> String {
    template.replacen("{item}", item, 1)
}

pub fn fill_item_and_hotspot(template: &str, item: &str, hotspot: &str) -> String {
    fill_hotspot(&fill_item(template, item), hotspot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use serde_json::json;

    #[test]
    fn overlay_replaces_only_usable_values() {
        let raw = json!({
            "look": {"sign": "A new sign text.", "doorOpen": "   ", "keyTaken": 5},
            "use": {"keyOnKey": "Clink."},
            "open": "not an object"
        });
        let cat = DialogueCatalog::from_values(Some(&raw), None);
        let def = InteractionLines::default();
        assert_eq!(cat.interactions.look.sign, "A new sign text.");
        assert_eq!(cat.interactions.look.door_open, def.look.door_open);
        assert_eq!(cat.interactions.look.key_taken, def.look.key_taken);
        assert_eq!(cat.interactions.use_.key_on_key, "Clink.");
        assert_eq!(cat.interactions.open, def.open);
    }

    #[test]
    fn pools_fall_back_when_empty() {
        let raw = json!({"lookDefault": ["", "  ", 3], "talkDefault": ["Hm."]});
        let cat = DialogueCatalog::from_values(None, Some(&raw));
        assert_eq!(cat.fallbacks.look_default, FallbackLines::default().look_default);
        assert_eq!(cat.fallbacks.talk_default, vec!["Hm.".to_string()]);
    }

    #[test]
    fn load_dir_tolerates_missing_and_malformed_files() {
        let dir = TempDir::new().unwrap();
        assert_eq!(DialogueCatalog::load_dir(dir.path()), DialogueCatalog::default());

        std::fs::write(dir.path().join(FALLBACKS_FILE), "[1, 2").unwrap();
        std::fs::write(dir.path().join(INTERACTIONS_FILE), r#"{"talk": {"door": "Knock knock."}}"#).unwrap();
        let cat = DialogueCatalog::load_dir(dir.path());
        assert_eq!(cat.fallbacks, FallbackLines::default());
        assert_eq!(cat.interactions.talk.door, "Knock knock.");
    }

    #[test]
    fn templates_fill_placeholders() {
        assert_eq!(fill_hotspot("The {hotspot}.", "Sign"), "The Sign.");
        assert_eq!(fill_item_and_hotspot("{item} on {hotspot}", "Key", "Door"), "Key on Door");
        assert_eq!(pick_random(&[]), "...");
        let pool = FallbackLines::default().generic_default;
        assert!(pool.contains(&pick_random(&pool)));
    }
}
