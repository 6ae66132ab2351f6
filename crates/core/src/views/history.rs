use crate::format::{self, ALTERNATE_CURRENCY_RATE};
use crate::i18n::t;
use crate::models::history::{EvolutionSeries, Period};
use crate::models::preferences::{DisplayCurrency, UiPreferences};
use crate::state::store::AppStore;

use super::{inline_error, Action, Binding, Trend, ViewKind};

/// Plain `{labels, values}` handed to the charting widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartProjection {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPointView {
    pub time: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummaryView {
    pub start_value: String,
    pub end_value: String,
    /// Signed `end - start`
    pub change: String,
    pub change_percent: String,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodOption {
    pub period: Period,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub title: String,
    pub periods: Vec<PeriodOption>,
    pub summary: Option<HistorySummaryView>,
    pub points: Vec<HistoryPointView>,
    pub chart: ChartProjection,
    pub empty_message: Option<String>,
    pub error: Option<String>,
    pub bindings: Vec<Binding>,
}

/// Chart data in the display currency. Labels follow the period granularity:
/// hours for 1d, days for 7d/30d/90d, months for 1y.
pub fn chart_projection(series: &EvolutionSeries, preferences: &UiPreferences) -> ChartProjection {
    let granularity = series.period.granularity();
    let currency = preferences.display_currency();

    let labels = series
        .points
        .iter()
        .map(|p| {
            p.timestamp
                .as_ref()
                .map(|ts| format::format_chart_label(ts, granularity, preferences.language))
                .unwrap_or_default()
        })
        .collect();

    let values = series
        .points
        .iter()
        .map(|p| {
            let value = match currency {
                DisplayCurrency::Usd => p.total_usd,
                DisplayCurrency::Brl => p.total_brl.unwrap_or(p.total_usd * ALTERNATE_CURRENCY_RATE),
            };
            if value.is_finite() {
                value
            } else {
                0.0
            }
        })
        .collect();

    ChartProjection { labels, values }
}

fn summary_view(series: &EvolutionSeries, preferences: &UiPreferences) -> HistorySummaryView {
    let currency = preferences.display_currency();
    let summary = &series.summary;
    let delta = summary.delta();
    let trend = if delta > 0.0 {
        Trend::Up
    } else if delta < 0.0 {
        Trend::Down
    } else {
        Trend::Flat
    };
    let sign = if summary.change_percent >= 0.0 { "+" } else { "" };

    HistorySummaryView {
        start_value: format::format_currency(summary.start_value, currency),
        end_value: format::format_currency(summary.end_value, currency),
        change: format::format_signed_currency(delta, currency),
        change_percent: format!("{sign}{:.2}%", summary.change_percent),
        trend,
    }
}

pub fn render_history(store: &AppStore) -> HistoryView {
    let prefs = store.preferences();
    let lang = prefs.language;
    let currency = prefs.display_currency();
    let selected = store.selected_period();

    let mut bindings: Vec<Binding> = Period::ALL
        .iter()
        .map(|p| Binding::new(format!("period-{p}"), Action::SelectPeriod(*p)))
        .collect();

    // A series for another period is stale while the new one loads
    let series = store.evolution().filter(|s| s.period == selected);

    let points: Vec<HistoryPointView> = series
        .map(|s| {
            s.points
                .iter()
                .map(|p| HistoryPointView {
                    time: p
                        .timestamp
                        .as_ref()
                        .map(|ts| format::format_datetime(ts, lang))
                        .unwrap_or_else(|| "N/A".to_string()),
                    value: format::format_currency(p.total_usd, currency),
                })
                .collect()
        })
        .unwrap_or_default();

    let error = inline_error(store, ViewKind::History);
    if error.is_some() {
        bindings.push(Binding::new("retry", Action::Retry(ViewKind::History)));
    }

    HistoryView {
        title: t(lang, "historyChartTitle").to_string(),
        periods: Period::ALL
            .iter()
            .map(|p| PeriodOption {
                period: *p,
                selected: *p == selected,
            })
            .collect(),
        summary: series.map(|s| summary_view(s, prefs)),
        chart: series
            .map(|s| chart_projection(s, prefs))
            .unwrap_or_default(),
        empty_message: points.is_empty().then(|| t(lang, "noData").to_string()),
        points,
        error,
        bindings,
    }
}
