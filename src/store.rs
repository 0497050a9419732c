//! The filter collection of one dashboard
//!
//! [`FilterStore`] owns the compiled filters and keeps the in-memory state,
//! the `FILTERS` URL parameter and the persisted settings in step:
//!
//! 1. `init` compiles the raw definitions
//! 2. persisted selections are merged in
//! 3. the URL parameter is merged in last, so it wins over settings
//! 4. every `apply_filter` notifies widgets, re-persists and, when embedded,
//!    re-encodes the URL and notifies the host

use crate::broadcast::{Broadcaster, Channel, ChannelRegistry};
use crate::codec::{UrlParameter, apply_url_parameter, serialize_filters, share_url};
use crate::filter::{
    ALL_WIDGETS, CompileIssue, FilterDefinition, Interval, RawFilter, compile_filters,
    strip_exclude_suffix,
};
use crate::host::{
    Environment, HostMessage, HostNotifier, Localizer, NoHost, StaticLocalizer, Widget,
    WidgetRegistry,
};
use crate::persistence::{PersistedFilter, SettingsStore};
use crate::resolver::{
    WidgetModelFilter, click_target, filters_affecting_widget, filters_displayed_on_widget,
    filters_used_by_widget,
};

type ApplyListener = Box<dyn FnMut(&FilterDefinition)>;

pub struct FilterStore {
    dashboard: String,
    items: Vec<FilterDefinition>,
    filters_changed: bool,
    toolbar_filters_exist: bool,
    issues: Vec<CompileIssue>,
    environment: Environment,
    settings: Box<dyn SettingsStore>,
    broadcaster: Box<dyn Broadcaster>,
    host: Box<dyn HostNotifier>,
    widgets: Box<dyn WidgetRegistry>,
    localizer: Box<dyn Localizer>,
    apply_listeners: Vec<ApplyListener>,
}

impl FilterStore {
    pub fn new(settings: impl SettingsStore + 'static) -> Self {
        Self {
            dashboard: String::new(),
            items: Vec::new(),
            filters_changed: false,
            toolbar_filters_exist: false,
            issues: Vec::new(),
            environment: Environment::standalone(),
            settings: Box::new(settings),
            broadcaster: Box::new(ChannelRegistry::new()),
            host: Box::new(NoHost),
            widgets: Box::new(Vec::<Widget>::new()),
            localizer: Box::new(StaticLocalizer::new()),
            apply_listeners: Vec::new(),
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: impl Broadcaster + 'static) -> Self {
        self.broadcaster = Box::new(broadcaster);
        self
    }

    pub fn with_host(mut self, host: impl HostNotifier + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn with_widgets(mut self, widgets: impl WidgetRegistry + 'static) -> Self {
        self.widgets = Box::new(widgets);
        self
    }

    pub fn with_localizer(mut self, localizer: impl Localizer + 'static) -> Self {
        self.localizer = Box::new(localizer);
        self
    }

    /// Register a listener called at the start of every `apply_filter`.
    pub fn on_apply(&mut self, listener: impl FnMut(&FilterDefinition) + 'static) {
        self.apply_listeners.push(Box::new(listener));
    }

    /// Load the filters of a dashboard, replacing any previous collection.
    pub fn init(&mut self, raw: &[RawFilter], dashboard: &str) {
        let compiled = compile_filters(raw);
        self.dashboard = dashboard.to_string();
        self.items = compiled.filters;
        self.toolbar_filters_exist = compiled.toolbar_filters_exist;
        self.issues = compiled.issues;
        self.filters_changed = true;

        tracing::debug!(
            "Compiled {} filters for dashboard '{}'",
            self.items.len(),
            dashboard
        );

        self.load_from_settings();
        if let Some(param) = self.environment.filters_param.clone() {
            self.apply_url_parameter(&param);
        }
    }

    /// Drop every filter.
    pub fn clear(&mut self) {
        self.items.clear();
        self.issues.clear();
    }

    pub fn items(&self) -> &[FilterDefinition] {
        &self.items
    }

    pub fn get_filter(&self, idx: usize) -> Option<&FilterDefinition> {
        self.items.get(idx)
    }

    pub fn dashboard(&self) -> &str {
        &self.dashboard
    }

    pub fn filters_changed(&self) -> bool {
        self.filters_changed
    }

    /// Acknowledge the current filter state, e.g. after widgets re-queried.
    pub fn mark_clean(&mut self) {
        self.filters_changed = false;
    }

    pub fn toolbar_filters_exist(&self) -> bool {
        self.toolbar_filters_exist
    }

    pub fn issues(&self) -> &[CompileIssue] {
        &self.issues
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn affecting_filters(&self, widget: &str) -> Vec<&FilterDefinition> {
        filters_affecting_widget(&self.items, widget)
    }

    pub fn widget_model_filters(&self, widget: &str) -> Vec<WidgetModelFilter> {
        filters_displayed_on_widget(&self.items, widget)
    }

    pub fn widget_filters(&self, widget: &str) -> Vec<&FilterDefinition> {
        filters_used_by_widget(&self.items, widget)
    }

    pub fn click_filter_target(&self, widget: &str) -> Option<&str> {
        click_target(&self.items, widget)
    }

    /// Select exactly the values with the given paths (UI path, before apply).
    ///
    /// Returns false for an unknown index.
    pub fn set_checked(&mut self, idx: usize, paths: &[&str]) -> bool {
        let Some(flt) = self.items.get_mut(idx) else {
            return false;
        };
        for entry in &mut flt.values {
            entry.checked = paths.contains(&entry.path.as_str());
        }
        flt.interval = None;
        true
    }

    pub fn set_exclude(&mut self, idx: usize, exclude: bool) -> bool {
        let Some(flt) = self.items.get_mut(idx) else {
            return false;
        };
        flt.is_exclude = exclude;
        true
    }

    /// Switch a filter to an interval selection.
    ///
    /// Returns false for an unknown filter or out-of-range indices.
    pub fn set_interval(&mut self, idx: usize, from_idx: usize, to_idx: usize) -> bool {
        let Some(flt) = self.items.get_mut(idx) else {
            return false;
        };
        if from_idx >= flt.values.len() || to_idx >= flt.values.len() {
            return false;
        }
        for entry in &mut flt.values {
            entry.checked = false;
        }
        flt.interval = Some(Interval { from_idx, to_idx });
        flt.value_display = flt.interval_display().unwrap_or_default();
        true
    }

    /// Encoded filter string for one widget, or for the whole dashboard.
    pub fn url_string(&self, widget: Option<&str>, ignore_target_all: bool) -> String {
        serialize_filters(&self.items, widget, ignore_target_all)
    }

    /// Shareable version of `current_url` carrying every active filter.
    pub fn share_url(&self, current_url: &str) -> String {
        share_url(current_url, &self.url_string(None, false))
    }

    /// Merge a `FILTERS` URL parameter into the collection.
    pub fn apply_url_parameter(&mut self, param: &str) -> usize {
        let assigned = apply_url_parameter(param, &mut self.items);
        tracing::debug!("Applied {assigned} filter assignments from URL");
        assigned
    }

    /// Commit the UI selection of a filter and propagate it.
    ///
    /// `suppress_notify` skips the widget broadcasts; persistence and host
    /// notification still happen.
    pub fn apply_filter(&mut self, idx: usize, suppress_notify: bool) -> Option<&FilterDefinition> {
        let Some(flt) = self.items.get_mut(idx) else {
            tracing::warn!("apply_filter called with unknown filter index {idx}");
            return None;
        };

        for listener in &mut self.apply_listeners {
            listener(&*flt);
        }

        flt.sync_value_from_checked();
        if let Some(text) = flt.interval_display() {
            flt.value_display = text;
        }
        if !suppress_notify {
            notify_widgets(self.broadcaster.as_mut(), flt);
        }

        self.filters_changed = true;
        self.save_filters();
        self.update_url_parameter();
        self.items.get(idx)
    }

    /// Persist the active filters of the dashboard.
    pub fn save_filters(&mut self) {
        if !self.persistence_enabled() {
            return;
        }

        let active: Vec<PersistedFilter> = self
            .items
            .iter()
            .filter(|f| f.is_active())
            .map(PersistedFilter::from)
            .collect();

        let mut settings = self.settings.widgets_settings(&self.dashboard);
        settings.filters = (!active.is_empty()).then_some(active);
        if let Err(e) = self.settings.set_widgets_settings(settings, &self.dashboard) {
            tracing::warn!("Failed to save filters of '{}': {e}", self.dashboard);
        }
    }

    fn persistence_enabled(&self) -> bool {
        if self.environment.embedded {
            tracing::trace!("Embedded widget, filter persistence skipped");
            return false;
        }
        self.settings.app_settings().is_save_filters
    }

    fn load_from_settings(&mut self) {
        if !self.persistence_enabled() {
            return;
        }

        let settings = self.settings.widgets_settings(&self.dashboard);
        let Some(persisted) = settings.filters else {
            return;
        };

        let not = self.localizer.get("not");
        for entry in &persisted {
            match self
                .items
                .iter_mut()
                .find(|f| f.target_property == entry.target_property)
            {
                Some(flt) => restore_persisted(flt, entry, &not),
                None => tracing::debug!(
                    "Persisted filter '{}' is not on dashboard '{}'",
                    entry.target_property,
                    self.dashboard
                ),
            }
        }
    }

    fn update_url_parameter(&mut self) {
        if !self.environment.embedded {
            return;
        }

        let index = self.environment.widget_index.clone();
        let widget = index.as_deref().and_then(|i| self.widgets.widget_at(i));
        let name = widget.as_ref().map(|w| w.name.as_str());
        let param = UrlParameter::new(ALL_WIDGETS, self.url_string(name, true)).to_string();
        self.environment.filters_param = Some(param.clone());

        let message = HostMessage::filter(index, widget, param);
        if let Err(e) = self.host.post_message(&message) {
            tracing::error!("Failed to notify host of filter change: {e}");
        }
        if let Err(e) = self.host.notify_callback(&message) {
            tracing::error!("{e}");
        }
    }
}

impl std::fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStore")
            .field("dashboard", &self.dashboard)
            .field("items", &self.items.len())
            .field("filters_changed", &self.filters_changed)
            .field("environment", &self.environment)
            .finish()
    }
}

/// Broadcast a filter change: targets first, then the widgets showing its chip.
fn notify_widgets(broadcaster: &mut dyn Broadcaster, flt: &FilterDefinition) {
    if !flt.target_array().is_empty() {
        for widget in flt.target_array() {
            broadcaster.broadcast(&Channel::Filter(widget.clone()), flt);
        }
    } else if flt.target == ALL_WIDGETS || flt.target.is_empty() {
        broadcaster.broadcast(&Channel::FilterAll, flt);
    }

    for widget in flt.source_array() {
        broadcaster.broadcast(&Channel::UpdateFilterText(widget.clone()), flt);
    }
}

/// Copy a persisted selection onto a compiled filter and rebuild its view.
fn restore_persisted(flt: &mut FilterDefinition, entry: &PersistedFilter, not: &str) {
    flt.is_exclude = entry.is_exclude;
    flt.interval = None;
    flt.value = entry
        .value
        .split('|')
        .map(|el| {
            let (path, is_not) = strip_exclude_suffix(el);
            flt.is_exclude |= is_not;
            path
        })
        .collect::<Vec<_>>()
        .join("|");

    if entry.is_interval {
        let len = flt.values.len();
        match (entry.from_idx, entry.to_idx) {
            (Some(from_idx), Some(to_idx)) if from_idx < len && to_idx < len => {
                flt.interval = Some(Interval { from_idx, to_idx });
                flt.value_display = flt.interval_display().unwrap_or_default();
            }
            _ => {
                tracing::warn!(
                    "Persisted interval of '{}' does not fit its {} values",
                    entry.target_property,
                    len
                );
                flt.sync_checked_from_value();
                flt.value_display.clear();
            }
        }
        return;
    }

    flt.sync_checked_from_value();
    flt.value_display = entry
        .value
        .split('|')
        .map(|el| {
            let (path, is_not) = strip_exclude_suffix(el);
            let name = flt
                .values
                .iter()
                .find(|v| v.path == path)
                .map(|v| v.name.as_str())
                .unwrap_or_default();
            if is_not {
                format!("{not} {name}")
            } else {
                name.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
}
