//! Text commands for the terminal playtest.
//!
//! Examples:
//!   "look at the sign"        -> Command::Act { verb: Look, target: "sign" }
//!   "pick up key"             -> Command::Act { verb: PickUp, target: "key" }
//!   "use key on door"         -> Command::UseOn { item: "key", target: "door" }
//!   "walk to door"            -> Command::Walk { target: "door" }
//!   "verb none"               -> Command::SelectVerb(None)
//!   "edit nudge 1 -2"         -> Command::Edit(EditCommand::Nudge(1.0, -2.0))
//!
//! Targets are returned lowercased with articles removed; callers match
//! them against hotspot/item ids and names.

use crate::models::types::Verb;
use crate::state::editor::EditTarget;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Blank line
    Empty,
    Act { verb: Verb, target: String },
    /// "look" on its own
    LookAround,
    UseOn { item: String, target: String },
    Walk { target: String },
    Inventory,
    Select { item: String },
    SelectVerb(Option<Verb>),
    Next,
    Help,
    Quit,
    Edit(EditCommand),
    /// Unparseable input, with a hint
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    Select(String),
    Target(EditTarget),
    Nudge(f64, f64),
    Resize(f64, f64),
    Copy,
    Save,
}

#[derive(Debug, Clone)]
struct Token {
    text: String,
    quoted: bool,
}

pub fn parse_command(input: &str) -> Command {
    let tokens = tokenize(&normalize(input));
    let Some(first) = tokens.first() else {
        return Command::Empty;
    };

    let (head, consumed) = detect_head(&tokens);
    let rest = &tokens[consumed..];

    match head {
        Head::Verb(Verb::Use) => parse_use(rest),
        Head::Verb(Verb::Look) if strip_determiners(rest).is_empty() => Command::LookAround,
        Head::Verb(verb) => match noun(rest) {
            Some(target) => Command::Act { verb, target },
            None => Command::Invalid(format!("{} what?", verb.label())),
        },
        Head::Walk => match noun(rest) {
            Some(target) => Command::Walk { target },
            None => Command::Invalid("Walk where?".into()),
        },
        Head::Select => match noun(rest) {
            Some(item) => Command::Select { item },
            None => Command::Invalid("Select what?".into()),
        },
        Head::SelectVerb => parse_verb_choice(rest),
        Head::Inventory => Command::Inventory,
        Head::Next => Command::Next,
        Head::Help => Command::Help,
        Head::Quit => Command::Quit,
        Head::Edit => parse_edit(rest),
        Head::Unknown => Command::Invalid(format!("I don't know how to '{}'.", first.text)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Head {
    Verb(Verb),
    Walk,
    Select,
    SelectVerb,
    Inventory,
    Next,
    Help,
    Quit,
    Edit,
    Unknown,
}

fn detect_head(tokens: &[Token]) -> (Head, usize) {
    // Phrasal first
    if tokens.len() >= 2 {
        match (tokens[0].text.as_str(), tokens[1].text.as_str()) {
            ("pick", "up") => return (Head::Verb(Verb::PickUp), 2),
            ("look", "at") => return (Head::Verb(Verb::Look), 2),
            ("talk", "to") | ("talk", "with") | ("speak", "to") => return (Head::Verb(Verb::Talk), 2),
            ("walk", "to") | ("go", "to") => return (Head::Walk, 2),
            _ => {}
        }
    }

    let head = match tokens[0].text.as_str() {
        "look" | "l" | "examine" | "x" => Head::Verb(Verb::Look),
        "talk" | "speak" => Head::Verb(Verb::Talk),
        "take" | "get" | "grab" | "pickup" => Head::Verb(Verb::PickUp),
        "use" => Head::Verb(Verb::Use),
        "open" => Head::Verb(Verb::Open),
        "walk" | "go" | "enter" => Head::Walk,
        "select" | "hold" => Head::Select,
        "verb" => Head::SelectVerb,
        "inventory" | "inv" | "i" => Head::Inventory,
        "next" | "n" | "." => Head::Next,
        "help" | "?" => Head::Help,
        "quit" | "exit" | "q" => Head::Quit,
        "edit" | "@edit" => Head::Edit,
        _ => Head::Unknown,
    };
    (head, 1)
}

fn parse_use(rest: &[Token]) -> Command {
    let (pre, post) = split_on(rest, &["on", "with", "onto"]);
    match (noun(&pre), post.map(|p| noun(&p))) {
        (Some(item), Some(Some(target))) => Command::UseOn { item, target },
        (Some(_), Some(None)) => Command::Invalid("Use it with what?".into()),
        (Some(target), None) => Command::Act {
            verb: Verb::Use,
            target,
        },
        (None, _) => Command::Invalid("Use what?".into()),
    }
}

fn parse_verb_choice(rest: &[Token]) -> Command {
    let joined = join(rest);
    match joined.as_str() {
        "" => Command::Invalid("Which verb? look, talk, pick up, use, open or none".into()),
        "none" | "clear" | "walk" => Command::SelectVerb(None),
        other => match Verb::parse(other) {
            Some(v) => Command::SelectVerb(Some(v)),
            None => Command::Invalid(format!("Unknown verb '{}'.", other)),
        },
    }
}

fn parse_edit(rest: &[Token]) -> Command {
    let Some((sub, args)) = rest.split_first() else {
        return Command::Invalid("edit select|target|nudge|resize|copy|save".into());
    };
    let cmd = match sub.text.as_str() {
        "select" => noun(args).map(EditCommand::Select),
        "target" => args.first().and_then(|t| EditTarget::parse(&t.text)).map(EditCommand::Target),
        "nudge" | "move" => numbers(args).map(|(a, b)| EditCommand::Nudge(a, b)),
        "resize" | "size" => numbers(args).map(|(a, b)| EditCommand::Resize(a, b)),
        "copy" => Some(EditCommand::Copy),
        "save" => Some(EditCommand::Save),
        _ => None,
    };
    cmd.map(Command::Edit)
        .unwrap_or_else(|| Command::Invalid(format!("Bad edit command: {}", join(rest))))
}

fn numbers(args: &[Token]) -> Option<(f64, f64)> {
    match args {
        [a, b] => Some((a.text.parse().ok()?, b.text.parse().ok()?)),
        _ => None,
    }
}

//
// ---- Normalization & tokenization ----
//

fn normalize(s: &str) -> String {
    // lowercase, trim, collapse spaces
    let mut out = String::with_capacity(s.len());
    let mut last_space = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            last_space = false;
        }
    }
    out
}

fn tokenize(s: &str) -> Vec<Token> {
    let mut toks = Vec::new();
    let mut buf = String::new();
    let mut in_quote: Option<char> = None;

    let push_tok = |quoted: bool, buf: &mut String, toks: &mut Vec<Token>| {
        if !buf.is_empty() {
            toks.push(Token {
                text: std::mem::take(buf),
                quoted,
            });
        }
    };

    for ch in s.chars() {
        match in_quote {
            Some(q) if ch == q => {
                push_tok(true, &mut buf, &mut toks);
                in_quote = None;
            }
            Some(_) => buf.push(ch),
            None => match ch {
                '"' => {
                    push_tok(false, &mut buf, &mut toks);
                    in_quote = Some(ch);
                }
                ' ' => push_tok(false, &mut buf, &mut toks),
                _ => buf.push(ch),
            },
        }
    }
    push_tok(in_quote.is_some(), &mut buf, &mut toks);
    toks
}

/// Split at the first unquoted preposition from `preps`.
fn split_on(tokens: &[Token], preps: &[&str]) -> (Vec<Token>, Option<Vec<Token>>) {
    match tokens.iter().position(|t| !t.quoted && preps.contains(&t.text.as_str())) {
        Some(i) => (tokens[..i].to_vec(), Some(tokens[i + 1..].to_vec())),
        None => (tokens.to_vec(), None),
    }
}

fn strip_determiners(tokens: &[Token]) -> Vec<Token> {
    const DETS: [&str; 6] = ["a", "an", "the", "my", "this", "that"];
    tokens
        .iter()
        .filter(|t| t.quoted || !DETS.contains(&t.text.as_str()))
        .cloned()
        .collect()
}

fn noun(tokens: &[Token]) -> Option<String> {
    let cleaned = strip_determiners(tokens);
    if cleaned.is_empty() { None } else { Some(join(&cleaned)) }
}

fn join(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ")
}
