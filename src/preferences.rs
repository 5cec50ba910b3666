use crate::storage::{get_or, put, KeyValueStore};

pub const DARK_MODE_KEY: &str = "darkMode";

/// Persisted UI preferences
#[derive(Debug)]
pub struct Preferences<S: KeyValueStore> {
    store: S,
    dark_mode: bool,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn load(store: S) -> Self {
        let dark_mode = get_or(&store, DARK_MODE_KEY, false);
        Self { store, dark_mode }
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn set_dark_mode(&mut self, on: bool) {
        self.dark_mode = on;
        if let Err(e) = put(&self.store, DARK_MODE_KEY, &on) {
            tracing::warn!(error = %e, "failed to persist dark mode preference");
        }
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.set_dark_mode(!self.dark_mode);
        self.dark_mode
    }
}
