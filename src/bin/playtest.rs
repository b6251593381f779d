use anyhow::Context;
use brasskey::input::parser::{Command, EditCommand, parse_command};
use brasskey::models::types::{ItemId, RoomId, Verb};
use brasskey::models::room::Hotspot;
use brasskey::state::editor::{DevEditor, EditTarget};
use brasskey::{GameDriver, GameEvent, GameMachine, MachineState, Registry, config, init_tracing};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};

// cargo run --bin playtest -- --rooms-dir rooms --room room1

#[derive(Debug, Parser)]
#[command(name = "playtest", version, about = "Play the rooms from a terminal")]
struct Args {
    /// Directory with room documents (overrides ROOMS_DIR)
    #[arg(long)]
    rooms_dir: Option<PathBuf>,

    /// Directory with dialogue overrides (overrides DIALOGUE_DIR)
    #[arg(long)]
    dialogue_dir: Option<PathBuf>,

    /// Room to start in instead of the default room
    #[arg(long)]
    room: Option<String>,

    /// Frame interval in milliseconds
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
}

const HELP: &str = "\
Commands:
  look [at] X | talk [to] X | pick up X | open X | use X [on|with] Y
  walk [to] X | look | inv | select ITEM | verb VERB|none | next | quit
  edit select X | edit target bounds|spriteBounds|walkTarget
  edit nudge DX DY | edit resize DW DH | edit copy | edit save";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("warn");

    let mut cfg = config::Config::from_env()?;
    if let Some(dir) = args.rooms_dir {
        cfg.rooms_dir = dir;
    }
    if let Some(dir) = args.dialogue_dir {
        cfg.dialogue_dir = dir;
    }
    let registry = Registry::load(Arc::new(cfg)).context("loading rooms")?;

    let start = match args.room {
        Some(id) if registry.rooms.contains(&id) => RoomId::from(id),
        Some(id) => anyhow::bail!("unknown room '{}'", id),
        None => registry.rooms.default_room().clone(),
    };

    let mut driver = GameDriver::with_machine(
        GameMachine::new(start.clone()),
        registry.rooms.clone(),
        registry.services.resolver.clone(),
    );
    let mut editor = DevEditor::new(registry.rooms.clone(), registry.services.room.clone(), start);
    let mut screen = Screen::default();

    driver.boot();
    println!("{}", HELP);
    screen.render(&driver);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms.max(1)));
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                driver.frame(now.duration_since(last).as_secs_f64());
                last = now;
                screen.render(&driver);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle(&mut driver, &mut editor, parse_command(&line)).await {
                    break;
                }
                screen.render(&driver);
            }
        }
    }

    Ok(())
}

/// Returns false to quit.
async fn handle(driver: &mut GameDriver, editor: &mut DevEditor, cmd: Command) -> bool {
    match cmd {
        Command::Empty => {}
        Command::Quit => return false,
        Command::Help => println!("{}", HELP),
        Command::Invalid(msg) => println!("{}", msg),
        Command::LookAround => describe_room(driver),
        Command::Inventory => {
            let inv = &driver.context().inventory;
            if inv.is_empty() {
                println!("You carry nothing.");
            }
            for item in inv.items() {
                let mark = if driver.context().selected_inventory_item_id.as_ref() == Some(&item.id) { "*" } else { " " };
                println!(" {} {} ({})", mark, item.name, item.id);
            }
        }
        Command::Select { item } => match find_item(driver, &item) {
            Some(id) => {
                driver.send(GameEvent::InventorySelected { item_id: Some(id) });
            }
            None => println!("You don't have {}.", item),
        },
        Command::SelectVerb(verb) => {
            driver.send(GameEvent::VerbSelected { verb });
        }
        Command::Next => {
            driver.send(GameEvent::DialogueAdvance);
        }
        Command::Walk { target } => match driver.find_hotspot(&target) {
            Some(h) => {
                ensure_verb(driver, None);
                click(driver, &h);
            }
            None => println!("You don't see {} here.", target),
        },
        Command::Act { verb, target } => {
            if let Some(h) = driver.find_hotspot(&target) {
                ensure_verb(driver, Some(verb));
                click(driver, &h);
            } else if verb != Verb::Use
                && let Some(id) = find_item(driver, &target)
            {
                ensure_verb(driver, Some(verb));
                driver.send(GameEvent::InventorySelected { item_id: Some(id) });
            } else {
                println!("You don't see {} here.", target);
            }
        }
        Command::UseOn { item, target } => {
            let Some(id) = find_item(driver, &item) else {
                println!("You don't have {}.", item);
                return true;
            };
            let Some(h) = driver.find_hotspot(&target) else {
                println!("You don't see {} here.", target);
                return true;
            };
            ensure_verb(driver, Some(Verb::Use));
            if driver.context().selected_inventory_item_id.as_ref() != Some(&id) {
                driver.send(GameEvent::InventorySelected { item_id: Some(id) });
            }
            click(driver, &h);
        }
        Command::Edit(edit) => {
            editor.set_room(driver.context().current_room_id.clone());
            run_edit(editor, edit).await;
        }
    }
    true
}

async fn run_edit(editor: &mut DevEditor, edit: EditCommand) {
    let target = editor.target();
    let outcome = match edit {
        EditCommand::Select(id) => editor.select(&id).map(|_| format!("Selected {}", id)),
        EditCommand::Target(t) => {
            editor.set_target(t);
            Ok(format!("Target: {}", t.as_str()))
        }
        EditCommand::Nudge(dx, dy) => editor.nudge(dx, dy).map(|h| describe_edit(&h, target)),
        EditCommand::Resize(dw, dh) => editor.resize(dw, dh).map(|h| describe_edit(&h, target)),
        EditCommand::Copy => editor.copy_json(),
        EditCommand::Save => Ok(editor.save().await),
    };
    match outcome {
        Ok(text) => println!("{}", text),
        Err(e) => println!("edit: {}", e),
    }
}

fn describe_edit(h: &Hotspot, target: EditTarget) -> String {
    let b = h.bounds;
    let s = h.render_bounds();
    format!(
        "{} [{}] bounds=({}, {}, {}x{}) sprite=({}, {}, {}x{}) walk=({}, {})",
        h.id,
        target.as_str(),
        b.x,
        b.y,
        b.w,
        b.h,
        s.x,
        s.y,
        s.w,
        s.h,
        h.walk_target.x,
        h.walk_target.y
    )
}

/// Hover first so the sentence line names the target, like a pointer would.
fn click(driver: &mut GameDriver, h: &Hotspot) {
    driver.send(GameEvent::HotspotHovered {
        hotspot_id: Some(h.id.clone()),
    });
    driver.click(h);
}

/// Select a verb without toggling it off when it is already active.
fn ensure_verb(driver: &mut GameDriver, verb: Option<Verb>) {
    if driver.context().selected_verb != verb {
        driver.send(GameEvent::VerbSelected { verb });
    }
}

fn find_item(driver: &GameDriver, needle: &str) -> Option<ItemId> {
    driver
        .context()
        .inventory
        .items()
        .iter()
        .find(|i| i.id == needle || i.name.eq_ignore_ascii_case(needle))
        .map(|i| i.id.clone())
}

fn describe_room(driver: &GameDriver) {
    let Some(room) = driver.current_room() else {
        println!("You are nowhere.");
        return;
    };
    println!("== {} ==", room.name);
    if let Some(text) = &room.overlay_text {
        println!("{}", text);
    }
    let names: Vec<String> = driver.visible_hotspots().into_iter().map(|h| h.name).collect();
    if !names.is_empty() {
        println!("You see: {}", names.join(", "));
    }
}

/// Prints only what changed since the last frame.
#[derive(Default)]
struct Screen {
    room: Option<RoomId>,
    line: Option<(usize, String)>,
    state: Option<MachineState>,
}

impl Screen {
    fn render(&mut self, driver: &GameDriver) {
        let ctx = driver.context();
        if self.room.as_ref() != Some(&ctx.current_room_id) {
            self.room = Some(ctx.current_room_id.clone());
            describe_room(driver);
        }

        let line = ctx.current_line().map(|l| (ctx.dialogue_index, l.to_string()));
        if driver.state() == MachineState::Dialogue && line.is_some() && line != self.line {
            if let Some((_, text)) = &line {
                println!("  \"{}\"", text);
            }
        }
        self.line = line;

        let state = driver.state();
        if self.state != Some(state) {
            if state == MachineState::WalkingToTarget {
                println!("({})", driver.sentence_line());
            }
            self.state = Some(state);
        }
    }
}
