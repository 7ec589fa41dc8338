use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::errors::LayoutError;
use crate::log::init_logger;
use crate::puzzle::PuzzleSpec;
use crate::session::Session;

thread_local! {
    // One session per WASM instance. The module is single-threaded, so a
    // thread-local RefCell is all the synchronization needed.
    static SESSION: RefCell<Session> = RefCell::new(Session::new());
}

/// Structured error information for JavaScript consumers
#[derive(serde::Serialize)]
struct WasmError {
    /// Error code (e.g., "L001", "WASM001")
    code: String,
    /// Display message
    message: String,
    /// Optional helpful suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

impl From<LayoutError> for WasmError {
    fn from(e: LayoutError) -> Self {
        WasmError {
            code: e.code().to_string(),
            message: e.to_string(),
            help: e.help().map(|s| s.to_string()),
        }
    }
}

impl From<WasmError> for JsValue {
    fn from(e: WasmError) -> Self {
        // Format a comprehensive error message
        let mut msg = format!("Error {}: {}", e.code, e.message);

        if let Some(help) = e.help {
            msg.push_str(&format!("\n\nSuggestion: {help}"));
        }

        // Create a JavaScript Error object with the formatted message
        js_sys::Error::new(&msg).into()
    }
}

fn serialize_error(e: serde_wasm_bindgen::Error) -> JsValue {
    WasmError {
        code: "WASM002".to_string(),
        message: format!("serialization failed: {e}"),
        help: Some("This is an internal error. Please report this issue.".to_string()),
    }
    .into()
}

/// Set up panic reporting and logging.
///
/// # Arguments
/// * `debug_enabled` - If true, use Debug log level; if false, use Info log level
///
/// This function must be called from JavaScript after the WASM module loads.
#[wasm_bindgen]
pub fn init(debug_enabled: bool) {
    // 1. Set up panic hook
    console_error_panic_hook::set_once();

    // 2. Initialize logging with the provided debug setting
    init_logger(debug_enabled);

    log::info!("WASM module initialized");
}

/// JS entry: load a puzzle from its JSON description.
///
/// Returns `{ grid, across_clues, down_clues }` for rendering the empty
/// board, or throws a JavaScript `Error` carrying the validation message.
#[wasm_bindgen]
pub fn initialize_puzzle(puzzle_json: &str) -> Result<JsValue, JsValue> {
    let spec = PuzzleSpec::parse_from_str(puzzle_json).map_err(|e| {
        JsValue::from(WasmError {
            code: "WASM001".to_string(),
            message: format!("puzzle must be valid JSON: {e}"),
            help: Some(
                "Expected an object with 'rows' (array of strings) and 'clues'.".to_string(),
            ),
        })
    })?;

    let snapshot = SESSION
        .with(|s| s.borrow_mut().initialize(spec))
        .map_err(WasmError::from)?;

    serde_wasm_bindgen::to_value(&snapshot).map_err(serialize_error)
}

/// JS entry: perform a single solver step on the loaded puzzle.
///
/// Returns `{ grid, assigned_clues, progress, message, solved }`.
#[wasm_bindgen]
pub fn solve_step() -> Result<JsValue, JsValue> {
    let outcome = SESSION.with(|s| s.borrow_mut().step()).map_err(|e| {
        JsValue::from(WasmError {
            code: "WASM003".to_string(),
            message: e.to_string(),
            help: Some("Call initialize_puzzle before solve_step.".to_string()),
        })
    })?;

    serde_wasm_bindgen::to_value(&outcome).map_err(serialize_error)
}

/// JS entry: run the loaded puzzle to completion (or to `max_steps`).
///
/// Pass `undefined`/`null` for `max_steps` to use the built-in cap.
#[wasm_bindgen]
pub fn solve_all(max_steps: Option<usize>) -> Result<JsValue, JsValue> {
    let outcome = SESSION
        .with(|s| s.borrow_mut().run_to_completion(max_steps))
        .map_err(|e| {
            JsValue::from(WasmError {
                code: "WASM003".to_string(),
                message: e.to_string(),
                help: Some("Call initialize_puzzle before solve_all.".to_string()),
            })
        })?;

    serde_wasm_bindgen::to_value(&outcome).map_err(serialize_error)
}
