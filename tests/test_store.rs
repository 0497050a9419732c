use dash_filters::broadcast::ChannelRegistry;
use dash_filters::filter::{FilterValue, RawFilter};
use dash_filters::host::{
    Environment, HostError, HostMessage, HostNotifier, RecordingHost, StaticLocalizer, Widget,
};
use dash_filters::persistence::{MemorySettings, PersistedFilter, SettingsStore, WidgetsSettings};
use dash_filters::store::FilterStore;
use std::cell::RefCell;
use std::rc::Rc;

fn raw(prop: &str, target: &str, source: &str, values: &[(&str, &str)]) -> RawFilter {
    RawFilter {
        label: prop.to_string(),
        target_property: prop.to_string(),
        target: target.to_string(),
        source: source.to_string(),
        values: values
            .iter()
            .map(|(name, path)| FilterValue::new(*name, *path))
            .collect(),
        ..Default::default()
    }
}

fn filters() -> Vec<RawFilter> {
    vec![
        raw("[Region]", "map,chart", "map", &[("East", "&[e]"), ("West", "&[w]")]),
        raw("[Year]", "*", "*", &[("2020", "&[2020]"), ("2021", "&[2021]")]),
    ]
}

fn record(registry: &mut ChannelRegistry, log: &Rc<RefCell<Vec<String>>>, channel: &str) {
    let log = Rc::clone(log);
    let name = channel.to_string();
    registry.subscribe(channel, move |_| log.borrow_mut().push(name.clone()));
}

#[test]
fn test_apply_notifies_targets_then_sources() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut registry = ChannelRegistry::new();
    for channel in [
        "filtermap",
        "filterchart",
        "filteremptyWidget",
        "filterAll",
        "updateFilterTextmap",
    ] {
        record(&mut registry, &log, channel);
    }

    let mut store = FilterStore::new(MemorySettings::default()).with_broadcaster(registry);
    store.init(&filters(), "sales");
    store.mark_clean();

    store.set_checked(0, &["&[w]"]);
    let applied = store.apply_filter(0, false).unwrap();
    assert_eq!(applied.value, "&[w]");
    assert_eq!(applied.value_display, "West");
    assert!(store.filters_changed());

    assert_eq!(
        *log.borrow(),
        vec![
            "filtermap",
            "filterchart",
            "filteremptyWidget",
            "updateFilterTextmap"
        ]
    );

    log.borrow_mut().clear();
    store.set_checked(1, &["&[2020]", "&[2021]"]);
    store.apply_filter(1, false);
    assert_eq!(*log.borrow(), vec!["filterAll"]);
}

#[test]
fn test_suppressed_apply_still_commits() {
    let hits = Rc::new(RefCell::new(0));
    let mut registry = ChannelRegistry::new();
    let counter = Rc::clone(&hits);
    registry.subscribe("filterAll", move |_| *counter.borrow_mut() += 1);

    let mut store = FilterStore::new(MemorySettings::saving_filters()).with_broadcaster(registry);
    store.init(&filters(), "sales");
    store.set_checked(1, &["&[2021]"]);
    store.apply_filter(1, true);

    assert_eq!(*hits.borrow(), 0);
    assert_eq!(store.items()[1].value, "&[2021]");
    let saved = store.settings().widgets_settings("sales").filters.unwrap();
    assert_eq!(saved[0].target_property, "[Year]");
}

#[test]
fn test_apply_listeners_see_uncommitted_state() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut store = FilterStore::new(MemorySettings::default());
    store.init(&filters(), "sales");

    let log = Rc::clone(&seen);
    store.on_apply(move |flt| log.borrow_mut().push(flt.value.clone()));
    store.set_checked(0, &["&[e]"]);
    store.apply_filter(0, false);

    assert_eq!(*seen.borrow(), vec![String::new()]);
    assert!(store.apply_filter(9, false).is_none());
}

/// Host whose message channel and callback both fail
#[derive(Clone, Default)]
struct FailingHost {
    posts: Rc<RefCell<usize>>,
    callbacks: Rc<RefCell<usize>>,
}

impl HostNotifier for FailingHost {
    fn post_message(&mut self, _message: &HostMessage) -> Result<(), HostError> {
        *self.posts.borrow_mut() += 1;
        Err(HostError::Rejected("parent window is gone".to_string()))
    }

    fn notify_callback(&mut self, _message: &HostMessage) -> Result<bool, HostError> {
        *self.callbacks.borrow_mut() += 1;
        Err(HostError::Callback("callback threw".to_string()))
    }
}

#[test]
fn test_host_failure_does_not_interrupt_apply() {
    let host = FailingHost::default();
    let mut store = FilterStore::new(MemorySettings::default())
        .with_environment(Environment::embedded("0"))
        .with_widgets(vec![Widget::named("map")])
        .with_host(host.clone());
    store.init(&filters(), "sales");
    store.mark_clean();

    store.set_checked(0, &["&[e]"]);
    let applied = store.apply_filter(0, false).unwrap();
    assert_eq!(applied.value, "&[e]");
    assert_eq!(applied.value_display, "East");

    assert!(store.filters_changed());
    assert_eq!(store.get_filter(0).unwrap().value, "&[e]");
    assert_eq!(*host.posts.borrow(), 1);
    assert_eq!(*host.callbacks.borrow(), 1);
    assert_eq!(
        store.environment().filters_param.as_deref(),
        Some("TARGET:*;FILTER:%5BRegion%5D.%26%5Be%5D")
    );
}

#[test]
fn test_embedded_apply_posts_to_host() {
    let host = RecordingHost::new();
    let widgets = vec![Widget::named("map"), Widget::named("chart")];
    let mut store = FilterStore::new(MemorySettings::saving_filters())
        .with_environment(Environment::embedded("1"))
        .with_widgets(widgets)
        .with_host(host.clone());
    store.init(&filters(), "sales");

    store.set_checked(0, &["&[e]"]);
    store.apply_filter(0, false);
    store.set_checked(1, &["&[2020]"]);
    store.apply_filter(1, false);

    let messages = host.messages();
    assert_eq!(messages.len(), 2);
    let last = &messages[1];
    assert_eq!(last.kind, "filter");
    assert_eq!(last.index.as_deref(), Some("1"));
    assert_eq!(last.widget.as_ref().map(|w| w.name.as_str()), Some("chart"));
    // filters on every widget are left to the parent dashboard
    assert_eq!(last.filters, "TARGET:*;FILTER:%5BRegion%5D.%26%5Be%5D");
    assert_eq!(
        store.environment().filters_param.as_deref(),
        Some(last.filters.as_str())
    );

    // embedded widgets never persist
    assert!(store.settings().widgets_settings("sales").filters.is_none());
}

#[test]
fn test_url_parameter_wins_over_persisted_state() {
    let mut settings = MemorySettings::saving_filters();
    let persisted = WidgetsSettings {
        filters: Some(vec![
            PersistedFilter {
                target_property: "[Region]".to_string(),
                value: "&[e]".to_string(),
                is_exclude: false,
                is_interval: false,
                from_idx: None,
                to_idx: None,
            },
            PersistedFilter {
                target_property: "[Year]".to_string(),
                value: "&[2020].%NOT".to_string(),
                is_exclude: true,
                is_interval: false,
                from_idx: None,
                to_idx: None,
            },
        ]),
        ..Default::default()
    };
    settings.set_widgets_settings(persisted, "sales").unwrap();

    let env = Environment::standalone()
        .with_filters_param(Some("TARGET:*;FILTER:%5BRegion%5D.%26%5Bw%5D"));
    let mut store = FilterStore::new(settings)
        .with_environment(env)
        .with_localizer(StaticLocalizer::new().with("not", "nicht"));
    store.init(&filters(), "sales");

    let region = store.get_filter(0).unwrap();
    assert_eq!(region.value, "&[w]");
    assert_eq!(region.checked_paths(), vec!["&[w]"]);

    let year = store.get_filter(1).unwrap();
    assert!(year.is_exclude);
    assert_eq!(year.value, "&[2020]");
    assert_eq!(year.value_display, "nicht 2020");
    assert_eq!(year.checked_paths(), vec!["&[2020]"]);
}

#[test]
fn test_saving_removes_cleared_filters() {
    let mut store = FilterStore::new(MemorySettings::saving_filters());
    store.init(&filters(), "sales");

    store.set_checked(0, &["&[e]", "&[w]"]);
    store.apply_filter(0, true);
    let saved = store.settings().widgets_settings("sales").filters.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].value, "&[e]|&[w]");

    store.set_checked(0, &[]);
    store.apply_filter(0, true);
    assert!(store.settings().widgets_settings("sales").filters.is_none());
}

#[test]
fn test_share_url_and_clear() {
    let mut store = FilterStore::new(MemorySettings::default());
    store.init(&filters(), "sales");
    assert_eq!(store.share_url("http://h/#/d"), "http://h/#/d");

    store.set_checked(1, &["&[2021]"]);
    store.apply_filter(1, true);
    assert_eq!(
        store.share_url("http://h/#/d?FILTERS=TARGET:*;FILTER:old"),
        "http://h/#/d?FILTERS=TARGET:*;FILTER:%5BYear%5D.%26%5B2021%5D"
    );

    store.clear();
    assert!(store.items().is_empty());
    assert!(store.get_filter(0).is_none());
}

#[test]
fn test_widget_relations() {
    let mut store = FilterStore::new(MemorySettings::default());
    store.init(&filters(), "sales");

    let affecting: Vec<&str> = store
        .affecting_filters("chart")
        .iter()
        .map(|f| f.target_property.as_str())
        .collect();
    assert_eq!(affecting, vec!["[Region]", "[Year]"]);

    let shown = store.widget_model_filters("map");
    assert_eq!(shown.iter().map(|m| m.idx).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(store.widget_model_filters("chart").len(), 1);
    assert_eq!(store.click_filter_target("map"), None);
}
