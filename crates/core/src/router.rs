//! View router: switches the visible screen and runs the loads behind
//! bound interactions. Failures are logged and shown inline by the view
//! that failed; they never escape to the caller.

use crate::views::{Action, ViewKind};
use crate::ExchangeDashboard;

/// What the host has to do after an action was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Done,
    /// Linking needs API credentials the host must collect first
    NeedsCredentials { exchange_id: String },
    /// The action failed; the message is ready to show as a notification
    Failed(String),
}

impl ExchangeDashboard {
    /// Make `view` the current screen and load its data.
    pub async fn switch_view(&self, view: ViewKind) {
        self.store().update(|s| s.set_current_view(view));
        if let Err(e) = self.load_view(view, false).await {
            log::error!("Loading {view:?} failed: {e}");
        }
    }

    /// Run the action behind a [`Binding`](crate::views::Binding).
    pub async fn dispatch(&self, action: Action) -> Dispatch {
        let result = match action {
            Action::Navigate(view) => {
                self.switch_view(view).await;
                Ok(())
            }
            Action::Refresh => self.refresh().await.map(|_| ()),
            Action::ToggleExchange(exchange_id) => {
                self.toggle_exchange(&exchange_id);
                Ok(())
            }
            Action::OpenToken {
                exchange_id,
                symbol,
            } => {
                self.show_token_modal(&exchange_id, &symbol).await;
                Ok(())
            }
            Action::CloseModal => {
                self.close_token_modal();
                Ok(())
            }
            Action::SelectPeriod(period) => self.load_history(period).await,
            Action::LinkExchange(exchange_id) => {
                return Dispatch::NeedsCredentials { exchange_id };
            }
            Action::UnlinkExchange(exchange_id) => {
                self.unlink_exchange(&exchange_id).await.map(|_| ())
            }
            Action::ClearCache => self.clear_cache().await.map(|_| ()),
            Action::SetPreference(preference) => {
                self.update_preference(preference).await.map(|_| ())
            }
            Action::Retry(view) => self.load_view(view, false).await,
        };

        match result {
            Ok(()) => Dispatch::Done,
            Err(e) => {
                log::error!("Action failed: {e}");
                Dispatch::Failed(e.to_string())
            }
        }
    }
}
