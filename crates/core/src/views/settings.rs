use crate::i18n::t;
use crate::models::preferences::{Language, Preference};
use crate::state::store::AppStore;

use super::{Action, Binding};

#[derive(Debug, Clone, PartialEq)]
pub struct SettingRow {
    pub id: &'static str,
    pub label: String,
    pub description: String,
    /// Toggle state, or the current text value
    pub value: SettingValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Toggle(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsView {
    pub title: String,
    pub rows: Vec<SettingRow>,
    pub bindings: Vec<Binding>,
}

/// Preferences screen. `user_id` is the id requests are currently made for.
pub fn render_settings(store: &AppStore, user_id: &str) -> SettingsView {
    let prefs = store.preferences();
    let lang = prefs.language;
    let row = |id, label_key, value| SettingRow {
        id,
        label: t(lang, label_key).to_string(),
        description: t(lang, &format!("{label_key}Desc")).to_string(),
        value,
    };

    let rows = vec![
        row("dark-mode", "darkMode", SettingValue::Toggle(prefs.dark_mode)),
        row(
            "show-brl",
            "brlConversion",
            SettingValue::Toggle(prefs.show_alternate_currency),
        ),
        row(
            "language",
            "language",
            SettingValue::Toggle(lang == Language::English),
        ),
        row("user-id", "userId", SettingValue::Text(user_id.to_string())),
    ];

    let other_language = match lang {
        Language::Portuguese => Language::English,
        Language::English => Language::Portuguese,
    };

    SettingsView {
        title: t(lang, "settings").to_string(),
        rows,
        bindings: vec![
            Binding::new(
                "dark-mode",
                Action::SetPreference(Preference::DarkMode(!prefs.dark_mode)),
            ),
            Binding::new(
                "show-brl",
                Action::SetPreference(Preference::ShowAlternateCurrency(
                    !prefs.show_alternate_currency,
                )),
            ),
            Binding::new(
                "language",
                Action::SetPreference(Preference::Language(other_language)),
            ),
            Binding::new("clear-cache", Action::ClearCache),
        ],
    }
}
