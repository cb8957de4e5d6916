//! Per-session state: one overwritable result slot.
//!
//! Mirrors the interactive model of the UI: a single user, a single "last
//! recipe" that every generation action overwrites and the PDF export reads.
//! Detected ingredients from the vision probe are kept as the default input
//! for the text generation tab. Nothing survives a restart.

#[derive(Debug, Default)]
pub struct SessionState {
    last_recipe: Option<String>,
    detected_ingredients: Option<String>,
}

impl SessionState {
    pub fn record_recipe(&mut self, text: String) {
        self.last_recipe = Some(text);
    }

    pub fn last_recipe(&self) -> Option<&str> {
        self.last_recipe.as_deref()
    }

    pub fn record_ingredients(&mut self, text: String) {
        self.detected_ingredients = Some(text);
    }

    pub fn detected_ingredients(&self) -> Option<&str> {
        self.detected_ingredients.as_deref()
    }
}
