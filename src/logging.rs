// BgpSim: BGP Network Simulator written in Rust
// Copyright 2022-2024 Tibor Schneider <sctibor@ethz.ch>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Structured logging: ordinary `log`-crate messages for human consumption, plus a narrow
//! JSON-lines *data log* for offline analysis. The data log is unrelated to `log::Record` — it
//! writes one JSON object per call, tagged with whatever `log_context` keys are currently pushed,
//! so records from nested sections (e.g. "explore" > "bgp") can be grouped after the fact.

use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

thread_local! {
    static CONTEXT: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static SINK: RefCell<Option<File>> = const { RefCell::new(None) };
}

/// Open the data-log sink at `path`, truncating any existing file. Subsequent [`data`] calls
/// append one JSON object per line until the process exits.
pub fn init_data_log(path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    SINK.with(|s| *s.borrow_mut() = Some(file));
    Ok(())
}

/// Push a context key; pair with [`pop_context`] around a named section (e.g. "explore").
pub fn push_context(key: impl Into<String>) {
    CONTEXT.with(|c| c.borrow_mut().push(key.into()));
}

/// Pop the most recently pushed context key.
pub fn pop_context() {
    CONTEXT.with(|c| {
        c.borrow_mut().pop();
    });
}

/// Run `f` with `key` pushed onto the context stack, popping it again on return (even on panic
/// unwind, via `Drop`).
pub fn with_context<T>(key: impl Into<String>, f: impl FnOnce() -> T) -> T {
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            pop_context();
        }
    }
    push_context(key);
    let _guard = Guard;
    f()
}

/// Append one record to the data log: `{"context": [...], "key": key, "value": value}`. A no-op
/// if [`init_data_log`] was never called.
pub fn data(key: &str, value: impl Serialize) {
    let record = CONTEXT.with(|c| -> Value {
        serde_json::json!({
            "context": c.borrow().clone(),
            "key": key,
            "value": serde_json::to_value(value).unwrap_or(Value::Null),
        })
    });
    SINK.with(|s| {
        if let Some(file) = s.borrow_mut().as_mut() {
            if let Ok(line) = serde_json::to_string(&record) {
                let _ = writeln!(file, "{line}");
            }
        }
    });
}

/// Initialize the human-readable `log` sink at the given verbosity. `quiet` suppresses
/// everything but warnings/errors; `debug` enables debug-level output; otherwise info level.
pub fn init_term_log(quiet: bool, debug: bool) {
    let level = if quiet {
        "warn"
    } else if debug {
        "debug"
    } else {
        "info"
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();
}
