//! Browser shell for the Simon game.
//!
//! Builds the 2x2 tile board and HUD overlays in the DOM, wires click
//! listeners for the tiles and the Start / Restart buttons, and drives the
//! timed playback / penalty / next-round steps through `setTimeout` chains.
//! The game logic itself lives in [`session`]; this module only supplies the
//! DOM-backed [`Display`], the localStorage-backed [`ScoreStore`] and the
//! entropy-backed [`ColorSource`], and relays outcomes into scheduled
//! follow-up steps.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, window};

pub mod session;

use session::{
    ClickOutcome, Color, ColorSource, Display, FLASH_MS, GAP_MS, LEAD_IN_MS, NEXT_ROUND_MS,
    PlaybackStep, RETRY_MS, ScoreStore, Session,
};

// --- Shell State -------------------------------------------------------------

struct GameShell {
    session: Session,
    display: DomDisplay,
    store: LocalStore,
    colors: EntropyColors,
}

thread_local! {
    static GAME: RefCell<Option<GameShell>> = RefCell::new(None);
}

fn with_game<R>(f: impl FnOnce(&mut GameShell) -> R) -> Option<R> {
    GAME.with(|cell| cell.borrow_mut().as_mut().map(f))
}

// --- Mounting ----------------------------------------------------------------

/// Builds the board and HUD (reusing elements if already present), attaches
/// listeners and initializes the session from the persisted high score.
pub fn mount() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    build_board(&doc)?;
    build_hud(&doc)?;

    let mut shell = GameShell {
        session: Session::new(),
        display: DomDisplay,
        store: LocalStore,
        colors: EntropyColors,
    };
    shell
        .session
        .load_high_score(&shell.store, &mut shell.display);
    shell.display.set_level(0);
    shell.display.set_status("Press Start to Play");
    GAME.with(|cell| cell.replace(Some(shell)));

    for color in Color::ALL {
        attach_click(&doc, &tile_id(color), move || on_tile_click(color))?;
    }
    attach_click(&doc, "st-start", on_start)?;
    attach_click(&doc, "st-restart", on_restart)?;
    Ok(())
}

fn build_board(doc: &Document) -> Result<(), JsValue> {
    if doc.get_element_by_id("st-board").is_some() {
        return Ok(());
    }
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let board = doc.create_element("div")?;
    board.set_id("st-board");
    board.set_attribute(
        "style",
        "position:fixed; left:50%; top:46%; transform:translate(-50%,-50%); \
         display:grid; grid-template-columns:repeat(2, 150px); gap:14px; z-index:20;",
    )?;
    for color in Color::ALL {
        let tile = doc.create_element("div")?;
        tile.set_id(&tile_id(color));
        tile.set_attribute("style", &tile_style(color, false))?;
        board.append_child(&tile)?;
    }
    body.append_child(&board)?;
    Ok(())
}

fn build_hud(doc: &Document) -> Result<(), JsValue> {
    ensure_overlay(
        doc,
        "st-level",
        "Level: 0",
        "position:fixed; top:10px; left:12px; font-family:'Fira Code', monospace; \
         font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; \
         border-radius:6px; color:#ffd166; z-index:45; letter-spacing:0.5px;",
    )?;
    ensure_overlay(
        doc,
        "st-highscore",
        "Best: 0",
        "position:fixed; top:10px; left:120px; font-family:'Fira Code', monospace; \
         font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; \
         border-radius:6px; color:#ffd166; z-index:45; letter-spacing:0.5px;",
    )?;
    ensure_overlay(
        doc,
        "st-status",
        "",
        "position:fixed; bottom:60px; left:50%; transform:translateX(-50%); \
         font-family:'Fira Code', monospace; font-size:18px; padding:4px 10px; \
         background:rgba(0,0,0,0.35); border:1px solid #333; border-radius:6px; \
         color:#ffd166; z-index:30;",
    )?;
    ensure_overlay(
        doc,
        "st-start",
        "Start",
        "position:fixed; top:10px; right:110px; font-family:'Fira Code', monospace; \
         font-size:15px; padding:4px 12px; background:#1f6b2a; border:1px solid #333; \
         border-radius:6px; color:#fff; cursor:pointer; z-index:45;",
    )?;
    ensure_overlay(
        doc,
        "st-restart",
        "Restart",
        "position:fixed; top:10px; right:12px; font-family:'Fira Code', monospace; \
         font-size:15px; padding:4px 12px; background:#7a1f1f; border:1px solid #333; \
         border-radius:6px; color:#fff; cursor:pointer; z-index:45;",
    )?;
    Ok(())
}

fn ensure_overlay(doc: &Document, id: &str, text: &str, style: &str) -> Result<(), JsValue> {
    if doc.get_element_by_id(id).is_some() {
        return Ok(());
    }
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let div = doc.create_element("div")?;
    div.set_id(id);
    div.set_text_content(Some(text));
    div.set_attribute("style", style)?;
    body.append_child(&div)?;
    Ok(())
}

fn attach_click(
    doc: &Document,
    id: &str,
    handler: impl FnMut() + 'static,
) -> Result<(), JsValue> {
    let el = doc
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str("missing element"))?;
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// --- Control Handlers --------------------------------------------------------

fn on_start() {
    let started = with_game(|g| {
        if !g.session.start(&mut g.display) {
            return None;
        }
        let epoch = g.session.epoch();
        // First round begins immediately; only the playback itself is delayed.
        g.session
            .advance_round(epoch, &mut g.colors, &mut g.display, &mut g.store);
        Some(epoch)
    })
    .flatten();
    if let Some(epoch) = started {
        schedule(LEAD_IN_MS, move || run_playback_step(0, epoch));
    }
}

fn on_restart() {
    with_game(|g| g.session.restart(&mut g.display));
}

fn on_tile_click(color: Color) {
    let outcome = with_game(|g| (g.session.handle_click(color, &mut g.display), g.session.epoch()));
    let Some((outcome, epoch)) = outcome else {
        return;
    };
    match outcome {
        ClickOutcome::Ignored => {}
        ClickOutcome::Progress => flash_tile(color),
        ClickOutcome::RoundComplete => {
            flash_tile(color);
            schedule(NEXT_ROUND_MS, move || {
                let advanced = with_game(|g| {
                    g.session
                        .advance_round(epoch, &mut g.colors, &mut g.display, &mut g.store)
                })
                .unwrap_or(false);
                if advanced {
                    schedule(LEAD_IN_MS, move || run_playback_step(0, epoch));
                }
            });
        }
        ClickOutcome::Mismatch => {
            flash_tile(color);
            schedule(RETRY_MS, move || {
                let replaying =
                    with_game(|g| g.session.replay(epoch, &mut g.display)).unwrap_or(false);
                if replaying {
                    schedule(LEAD_IN_MS, move || run_playback_step(0, epoch));
                }
            });
        }
    }
}

// --- Timed Steps -------------------------------------------------------------

/// One link of the playback chain: flash the current colour and schedule the
/// next step, or hand control to the player after the last one. Steps
/// scheduled before a restart observe a stale epoch and fall through.
fn run_playback_step(index: usize, epoch: u64) {
    let step = with_game(|g| g.session.playback_step(index, epoch, &mut g.display));
    if let Some(PlaybackStep::Flash(color)) = step {
        flash_tile(color);
        schedule(GAP_MS, move || run_playback_step(index + 1, epoch));
    }
}

/// Highlight a tile now and un-highlight it after [`FLASH_MS`].
fn flash_tile(color: Color) {
    with_game(|g| g.display.set_tile_active(color, true));
    schedule(FLASH_MS, move || {
        with_game(|g| g.display.set_tile_active(color, false));
    });
}

fn schedule(delay_ms: i32, f: impl FnOnce() + 'static) {
    let cb = Closure::once_into_js(f);
    if let Some(win) = window() {
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.unchecked_ref(),
            delay_ms,
        );
    }
}

// --- Display / Store / Rng Bindings ------------------------------------------

fn tile_id(color: Color) -> String {
    format!("st-tile-{}", color.name())
}

fn tile_style(color: Color, active: bool) -> String {
    let (dim, lit) = match color {
        Color::Red => ("#7a1f1f", "#ff5252"),
        Color::Green => ("#1f6b2a", "#5dff6e"),
        Color::Blue => ("#1f3f7a", "#529bff"),
        Color::Yellow => ("#7a6a1f", "#ffe14d"),
    };
    let fill = if active { lit } else { dim };
    let glow = if active {
        "box-shadow:0 0 28px 6px rgba(255,255,255,0.45);"
    } else {
        "box-shadow:0 0 12px 0 rgba(0,0,0,0.35);"
    };
    format!(
        "width:150px; height:150px; border-radius:16px; border:2px solid #222; \
         cursor:pointer; background:{fill}; {glow}"
    )
}

/// Display backed by the DOM overlays; elements are looked up by id on each
/// update so the shell never holds stale references.
struct DomDisplay;

impl DomDisplay {
    fn with_element(id: &str, f: impl FnOnce(&web_sys::Element)) {
        if let Some(doc) = window().and_then(|w| w.document()) {
            if let Some(el) = doc.get_element_by_id(id) {
                f(&el);
            }
        }
    }
}

impl Display for DomDisplay {
    fn set_tile_active(&mut self, color: Color, active: bool) {
        Self::with_element(&tile_id(color), |el| {
            el.set_attribute("style", &tile_style(color, active)).ok();
        });
    }

    fn set_level(&mut self, level: u32) {
        Self::with_element("st-level", |el| {
            el.set_text_content(Some(&format!("Level: {level}")));
        });
    }

    fn set_high_score(&mut self, value: u32) {
        Self::with_element("st-highscore", |el| {
            el.set_text_content(Some(&format!("Best: {value}")));
        });
    }

    fn set_status(&mut self, message: &str) {
        Self::with_element("st-status", |el| {
            el.set_text_content(Some(message));
        });
    }
}

/// High-score persistence over `window.localStorage`. Storage being
/// unavailable or failing is treated as an absent value.
struct LocalStore;

impl LocalStore {
    fn storage() -> Option<web_sys::Storage> {
        window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl ScoreStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(s) = Self::storage() {
            let _ = s.set_item(key, value);
        }
    }
}

/// Uniform colour source over browser entropy. A single byte modulo 4 is
/// unbiased; a failed entropy read degrades to a constant colour.
struct EntropyColors;

impl ColorSource for EntropyColors {
    fn next_color(&mut self) -> Color {
        let mut byte = [0u8; 1];
        getrandom::getrandom(&mut byte).ok();
        Color::from_index(byte[0] as usize % Color::ALL.len())
    }
}
