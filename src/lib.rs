//! Simon Tiles core crate.
//!
//! A browser "Simon" memory game: the board flashes a growing colour
//! sequence and the player repeats it by clicking the matching tiles. The
//! pure state machine (sequence, phases, scoring) lives in
//! [`game::session`] and is re-exported here so native tests can drive it
//! headlessly; DOM binding, timer chains and localStorage persistence live
//! in [`game`].

use wasm_bindgen::prelude::*;

mod game;

pub use game::session::{
    ClickOutcome, Color, ColorSource, Display, FLASH_MS, GAP_MS, HIGH_SCORE_KEY, LEAD_IN_MS,
    NEXT_ROUND_MS, Phase, PlaybackStep, RETRY_MS, ScoreStore, Session,
};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Mounts the board and HUD into the page and wires up input. The game then
/// runs entirely on the Start / Restart buttons and tile clicks.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    game::mount()
}
