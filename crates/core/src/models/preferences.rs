use serde::{Deserialize, Serialize};

/// Interface language. Portuguese is the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Portuguese => "pt",
            Language::English => "en",
        }
    }
}

/// Currency values are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayCurrency {
    /// Primary: US dollar, the backend's unit
    Usd,
    /// Alternate: Brazilian real, converted at a fixed rate
    Brl,
}

fn default_true() -> bool {
    true
}

/// Cross-cutting UI preferences, persisted between runs.
///
/// Field names on disk follow the keys the desktop app always used,
/// so existing preference files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPreferences {
    #[serde(rename = "showBRL", default)]
    pub show_alternate_currency: bool,

    #[serde(default)]
    pub language: Language,

    #[serde(default = "default_true")]
    pub dark_mode: bool,

    #[serde(default = "default_true")]
    pub hide_zero_balances: bool,

    /// Overrides the configured backend user id when set
    #[serde(default)]
    pub user_id: Option<String>,

    /// Automation strategies owned by another screen, stored untouched
    #[serde(default)]
    pub robot_strategies: Vec<serde_json::Value>,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            show_alternate_currency: false,
            language: Language::Portuguese,
            dark_mode: true,
            hide_zero_balances: true,
            user_id: None,
            robot_strategies: Vec::new(),
        }
    }
}

/// A single preference change.
#[derive(Debug, Clone, PartialEq)]
pub enum Preference {
    ShowAlternateCurrency(bool),
    Language(Language),
    DarkMode(bool),
    HideZeroBalances(bool),
    UserId(Option<String>),
}

impl Preference {
    /// Changes that alter how amounts or labels are rendered in every view.
    pub fn affects_rendering(&self) -> bool {
        matches!(
            self,
            Preference::ShowAlternateCurrency(_) | Preference::Language(_)
        )
    }
}

impl UiPreferences {
    pub fn display_currency(&self) -> DisplayCurrency {
        if self.show_alternate_currency {
            DisplayCurrency::Brl
        } else {
            DisplayCurrency::Usd
        }
    }

    /// Apply a change and return the value now in effect.
    pub fn apply(&mut self, preference: Preference) -> Preference {
        match preference {
            Preference::ShowAlternateCurrency(v) => {
                self.show_alternate_currency = v;
                Preference::ShowAlternateCurrency(self.show_alternate_currency)
            }
            Preference::Language(v) => {
                self.language = v;
                Preference::Language(self.language)
            }
            Preference::DarkMode(v) => {
                self.dark_mode = v;
                Preference::DarkMode(self.dark_mode)
            }
            Preference::HideZeroBalances(v) => {
                self.hide_zero_balances = v;
                Preference::HideZeroBalances(self.hide_zero_balances)
            }
            Preference::UserId(v) => {
                self.user_id = v
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty());
                Preference::UserId(self.user_id.clone())
            }
        }
    }
}
