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

//! Browser localStorage as a [`StorageBackend`].

use memverse_core::ErrorReport;
use memverse_core::Fallible;
use memverse_core::StorageBackend;
use wasm_bindgen::JsValue;
use web_sys::Storage as WebStorage;

/// Wraps `window.localStorage`. When storage is unavailable (private mode,
/// disabled by policy) reads come back empty and writes fail, so the store
/// keeps them pending in memory.
pub struct LocalStorage {
    inner: Option<WebStorage>,
}

fn js_error(action: &str, key: &str, e: JsValue) -> ErrorReport {
    ErrorReport::new(format!("localStorage {action} of '{key}' failed: {e:?}"))
}

impl LocalStorage {
    pub fn new() -> Self {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if inner.is_none() {
            log::warn!("localStorage is unavailable, changes will not survive a reload");
        }
        Self { inner }
    }

    /// Whether storage events for `area` concern this backend.
    pub fn is_area(&self, area: Option<&WebStorage>) -> bool {
        match (&self.inner, area) {
            (Some(mine), Some(theirs)) => mine == theirs,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for LocalStorage {
    fn read(&self, key: &str) -> Fallible<Option<String>> {
        match &self.inner {
            Some(storage) => storage.get_item(key).map_err(|e| js_error("read", key, e)),
            None => Ok(None),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Fallible<()> {
        match &self.inner {
            Some(storage) => storage
                .set_item(key, value)
                .map_err(|e| js_error("write", key, e)),
            None => Err(ErrorReport::new("localStorage is unavailable")),
        }
    }

    fn remove(&mut self, key: &str) -> Fallible<()> {
        match &self.inner {
            Some(storage) => storage
                .remove_item(key)
                .map_err(|e| js_error("remove", key, e)),
            None => Err(ErrorReport::new("localStorage is unavailable")),
        }
    }
}
