// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! WASM bindings for memverse: runs the verse scheduler in the browser, with
//! localStorage persistence shared across tabs.

use std::cell::RefCell;
use std::rc::Rc;

use log::Level;
use log::LevelFilter;
use log::Log;
use log::Metadata;
use log::Record;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::Event;
use web_sys::StorageEvent;
use web_sys::VisibilityState;
use web_sys::console;

use memverse_core::ErrorReport;
use memverse_core::Quality;
use memverse_core::Timestamp;
use memverse_core::VerseCollection;
use memverse_core::VerseId;
use memverse_core::collection::REVIEWS_KEY;
use memverse_core::collection::VERSES_KEY;
use memverse_core::store::Store;

mod storage;

use storage::LocalStorage;

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line: JsValue = format!("[{}] {}", record.target(), record.args()).into();
        match record.level() {
            Level::Error => console::error_1(&line),
            Level::Warn => console::warn_1(&line),
            _ => console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
    console::log_1(&"memverse WASM initialized".into());
}

fn to_js(e: ErrorReport) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {}", e)))
}

fn parse_now(now_str: &str) -> Result<Timestamp, JsValue> {
    Timestamp::try_from(now_str.to_string()).map_err(to_js)
}

type Shared = Rc<RefCell<VerseCollection<LocalStorage>>>;

/// The application state managed from JavaScript.
#[wasm_bindgen]
pub struct MemverseApp {
    collection: Shared,
    /// Event listeners registered by `install_lifecycle_hooks`, kept alive for
    /// as long as the app is.
    hooks: Vec<(String, bool, Closure<dyn FnMut(Event)>)>,
}

#[wasm_bindgen]
impl MemverseApp {
    /// Opens the collection stored in this browser's localStorage.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<MemverseApp, JsValue> {
        let store = Store::new(LocalStorage::new());
        let collection = VerseCollection::open(store).map_err(to_js)?;
        Ok(Self {
            collection: Rc::new(RefCell::new(collection)),
            hooks: Vec::new(),
        })
    }

    /// Saves a new verse. Returns the new record as JSON.
    #[wasm_bindgen]
    pub fn add_verse(&mut self, reference: &str, text: &str, now_str: &str) -> Result<String, JsValue> {
        let now = parse_now(now_str)?;
        let verse = self
            .collection
            .borrow_mut()
            .add(reference, text, now)
            .map_err(to_js)?;
        to_json(&verse)
    }

    #[wasm_bindgen]
    pub fn remove_verse(&mut self, id: &str) -> Result<(), JsValue> {
        let id = VerseId::parse(id).map_err(to_js)?;
        self.collection.borrow_mut().remove(&id).map_err(to_js)?;
        Ok(())
    }

    /// All verses, in the order they were added, as a JSON array.
    #[wasm_bindgen]
    pub fn verses_json(&self) -> Result<String, JsValue> {
        to_json(self.collection.borrow().verses())
    }

    /// All verses in practice order, as a JSON array.
    #[wasm_bindgen]
    pub fn review_queue_json(&self) -> Result<String, JsValue> {
        to_json(&self.collection.borrow().review_queue())
    }

    /// The verse to practice next, as JSON, or `undefined` if there are none.
    #[wasm_bindgen]
    pub fn next_verse_json(&self) -> Result<Option<String>, JsValue> {
        match self.collection.borrow().next() {
            Some(verse) => to_json(verse).map(Some),
            None => Ok(None),
        }
    }

    /// Verses whose interval has elapsed, in practice order, as JSON.
    #[wasm_bindgen]
    pub fn due_json(&self, now_str: &str) -> Result<String, JsValue> {
        let now = parse_now(now_str)?;
        to_json(&self.collection.borrow().due(now))
    }

    /// Records a "got it" / "needs practice" outcome. Returns the updated
    /// record as JSON.
    #[wasm_bindgen]
    pub fn practice(&mut self, id: &str, success: bool, now_str: &str) -> Result<String, JsValue> {
        self.record(id, Quality::from_success(success), now_str)
    }

    /// Records a graded outcome, 0 to 5. Returns the updated record as JSON.
    #[wasm_bindgen]
    pub fn review(&mut self, id: &str, quality: u8, now_str: &str) -> Result<String, JsValue> {
        let quality = Quality::new(quality).map_err(to_js)?;
        self.record(id, quality, now_str)
    }

    #[wasm_bindgen]
    pub fn stats_json(&self, now_str: &str) -> Result<String, JsValue> {
        let now = parse_now(now_str)?;
        to_json(&self.collection.borrow().stats(now))
    }

    /// Whether some write has not reached localStorage yet.
    #[wasm_bindgen]
    pub fn has_pending_writes(&self) -> bool {
        self.collection.borrow().store().has_pending()
    }

    /// Retries pending writes. Returns how many keys were written.
    #[wasm_bindgen]
    pub fn flush(&mut self) -> Result<usize, JsValue> {
        self.collection.borrow_mut().flush().map_err(to_js)
    }

    /// Listens for writes from other tabs and flushes when the page is hidden
    /// or unloaded. `on_change` is called with no arguments whenever another
    /// tab changed the collection.
    #[wasm_bindgen]
    pub fn install_lifecycle_hooks(&mut self, on_change: Option<js_sys::Function>) -> Result<(), JsValue> {
        if !self.hooks.is_empty() {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let collection = Rc::clone(&self.collection);
        let on_storage = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(event) = event.dyn_ref::<StorageEvent>() else {
                return;
            };
            let Ok(mut collection) = collection.try_borrow_mut() else {
                log::warn!("storage event arrived while busy, ignoring");
                return;
            };
            let area = event.storage_area();
            if !collection.store().backend().is_area(area.as_ref()) {
                return;
            }
            let changes: Vec<(&str, Option<String>)> = match event.key() {
                Some(key) if key == VERSES_KEY => vec![(VERSES_KEY, event.new_value())],
                Some(key) if key == REVIEWS_KEY => vec![(REVIEWS_KEY, event.new_value())],
                Some(_) => Vec::new(),
                // `localStorage.clear()` in another tab.
                None => vec![(VERSES_KEY, None), (REVIEWS_KEY, None)],
            };
            let mut changed = false;
            for (key, value) in changes {
                match collection.reload_external(key, value) {
                    Ok(c) => changed |= c,
                    Err(e) => log::warn!("could not apply change to '{key}': {e}"),
                }
            }
            drop(collection);
            if changed && let Some(callback) = &on_change {
                let _ = callback.call0(&JsValue::NULL);
            }
        });
        window.add_event_listener_with_callback("storage", on_storage.as_ref().unchecked_ref())?;
        self.hooks.push(("storage".to_string(), true, on_storage));

        let collection = Rc::clone(&self.collection);
        let doc = document.clone();
        let on_visibility = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            if doc.visibility_state() == VisibilityState::Hidden {
                flush_shared(&collection);
            }
        });
        document.add_event_listener_with_callback(
            "visibilitychange",
            on_visibility.as_ref().unchecked_ref(),
        )?;
        self.hooks
            .push(("visibilitychange".to_string(), false, on_visibility));

        let collection = Rc::clone(&self.collection);
        let on_pagehide = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            flush_shared(&collection);
        });
        window.add_event_listener_with_callback("pagehide", on_pagehide.as_ref().unchecked_ref())?;
        self.hooks.push(("pagehide".to_string(), true, on_pagehide));

        Ok(())
    }

    /// Removes the listeners added by `install_lifecycle_hooks`.
    #[wasm_bindgen]
    pub fn uninstall_lifecycle_hooks(&mut self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        for (event, on_window, closure) in self.hooks.drain(..) {
            let callback = closure.as_ref().unchecked_ref();
            if on_window {
                window.remove_event_listener_with_callback(&event, callback)?;
            } else {
                document.remove_event_listener_with_callback(&event, callback)?;
            }
        }
        Ok(())
    }

    // Private helper methods

    fn record(&mut self, id: &str, quality: Quality, now_str: &str) -> Result<String, JsValue> {
        let id = VerseId::parse(id).map_err(to_js)?;
        let now = parse_now(now_str)?;
        let verse = self
            .collection
            .borrow_mut()
            .practice(&id, quality, now)
            .map_err(to_js)?;
        to_json(&verse)
    }
}

fn flush_shared(collection: &Shared) {
    let Ok(mut collection) = collection.try_borrow_mut() else {
        return;
    };
    if let Err(e) = collection.flush() {
        log::error!("could not save pending changes: {e}");
    }
}

/// Get the current timestamp as a string in the format the app expects.
#[wasm_bindgen]
pub fn now_timestamp() -> String {
    let date = js_sys::Date::new_0();
    let year = date.get_full_year();
    let month = date.get_month() + 1;
    let day = date.get_date();
    let hours = date.get_hours();
    let minutes = date.get_minutes();
    let seconds = date.get_seconds();
    let millis = date.get_milliseconds();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}",
        year, month, day, hours, minutes, seconds, millis
    )
}

/// Get today's date as a string (YYYY-MM-DD).
#[wasm_bindgen]
pub fn today_date() -> String {
    let date = js_sys::Date::new_0();
    let year = date.get_full_year();
    let month = date.get_month() + 1;
    let day = date.get_date();
    format!("{:04}-{:02}-{:02}", year, month, day)
}
