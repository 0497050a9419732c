pub mod broadcast;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod filter;
pub mod host;
pub mod logging;
pub mod persistence;
pub mod resolver;
pub mod store;

use crate::broadcast::{Channel, ChannelRegistry};
use crate::config::DashConfig;
use crate::dashboard::{DashboardDefinition, load_dashboard};
use crate::display::{format_filters_table, format_widget_report};
use crate::host::RecordingHost;
use crate::logging::{LogConfig, init_logging};
use crate::persistence::{AppSettings, JsonFileSettings, MemorySettings, SettingsStore};
use anyhow::{Context, bail};
use colored::Colorize;
use serde_json::json;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use codec::{UrlParameter, apply_url_parameter, serialize_filters, share_url};
pub use filter::{CompiledFilters, FilterDefinition, FilterValue, RawFilter, compile_filters};
pub use store::FilterStore;

fn open_settings(config: &DashConfig) -> anyhow::Result<Box<dyn SettingsStore>> {
    let app = AppSettings {
        is_save_filters: config.persistence.save_filters,
    };

    match &config.persistence.settings_file {
        Some(path) => {
            let mut settings = JsonFileSettings::open(path)?;
            if settings.app_settings() != app {
                settings.set_app_settings(app)?;
            }
            Ok(Box::new(settings))
        }
        None => Ok(Box::new(MemorySettings::new(app))),
    }
}

fn dashboard_id(definition: &DashboardDefinition, config: &DashConfig) -> String {
    definition
        .name
        .clone()
        .unwrap_or_else(|| config.dashboard.clone())
}

fn load_store(file: &Path, config: &DashConfig) -> anyhow::Result<FilterStore> {
    let definition = load_dashboard(file)?;
    let mut store = FilterStore::new(open_settings(config)?)
        .with_environment(config.environment())
        .with_widgets(definition.widgets.clone());
    store.init(&definition.filters, &dashboard_id(&definition, config));
    Ok(store)
}

fn print_filters(store: &FilterStore, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", format_filters_table(store.items()));
            for issue in store.issues() {
                eprintln!("{} {}", "warning:".yellow(), issue);
            }
        }
        OutputFormat::Json => {
            let body = json!({
                "dashboard": store.dashboard(),
                "toolbarFiltersExist": store.toolbar_filters_exist(),
                "filters": store.items(),
                "issues": store.issues().iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
    let log_config = LogConfig::from_verbosity(cli.verbose).with_ansi(cli.color != ColorMode::Never);
    init_logging(&log_config)?;

    let config =
        crate::config::load_config(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }
    let format = cli.format;

    match &cli.command {
        Commands::Compile { file } => {
            let store = load_store(file, &config)?;
            print_filters(&store, format)?;
        }
        Commands::Encode {
            file,
            widget,
            ignore_target_all,
        } => {
            let store = load_store(file, &config)?;
            let encoded = store.url_string(widget.as_deref(), *ignore_target_all);
            let param = UrlParameter::new(widget.as_deref().unwrap_or("*"), encoded);
            match format {
                OutputFormat::Text => println!("{param}"),
                OutputFormat::Json => {
                    let body = json!({
                        "target": param.target,
                        "filter": param.filter,
                        "param": param.to_string(),
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
            }
        }
        Commands::Decode { file, param, url } => {
            let param = match (param, url) {
                (Some(param), _) => param.clone(),
                (None, Some(url)) => match codec::filters_param_from_url(url) {
                    Some(param) => param,
                    None => bail!("URL '{url}' has no {} parameter", codec::FILTERS_PARAM),
                },
                (None, None) => bail!("Either --param or --url is required"),
            };
            let mut store = load_store(file, &config)?;
            let assigned = store.apply_url_parameter(&param);
            tracing::info!("{assigned} filter assignments taken from the URL");
            print_filters(&store, format)?;
        }
        Commands::ShareUrl { file, url, param } => {
            let mut store = load_store(file, &config)?;
            if let Some(param) = param {
                store.apply_url_parameter(param);
            }
            println!("{}", store.share_url(url));
        }
        Commands::Widget { file, widget } => {
            let store = load_store(file, &config)?;
            let affecting = store.affecting_filters(widget);
            let displayed = store.widget_model_filters(widget);
            let used = store.widget_filters(widget);
            let click = store.click_filter_target(widget);
            match format {
                OutputFormat::Text => print!(
                    "{}",
                    format_widget_report(widget, &affecting, &displayed, &used, click)
                ),
                OutputFormat::Json => {
                    let props = |filters: &[&FilterDefinition]| {
                        filters
                            .iter()
                            .map(|f| f.target_property.clone())
                            .collect::<Vec<_>>()
                    };
                    let body = json!({
                        "widget": widget,
                        "affectedBy": props(&affecting),
                        "uses": props(&used),
                        "displays": displayed,
                        "clickTarget": click,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
            }
        }
        Commands::Apply {
            file,
            property,
            select,
            exclude,
            quiet_widgets,
        } => {
            let definition = load_dashboard(file)?;
            let notified = Rc::new(RefCell::new(Vec::<String>::new()));
            let mut channels = ChannelRegistry::new();
            let compiled = compile_filters(&definition.filters);
            let Some(idx) = compiled
                .filters
                .iter()
                .position(|f| &f.target_property == property)
            else {
                bail!("Dashboard has no filter on '{property}'");
            };

            // store.init compiles the same list, so idx and the scopes carry over
            let target = &compiled.filters[idx];
            let mut subscribed = vec![Channel::FilterAll];
            subscribed.extend(target.target_array().iter().cloned().map(Channel::Filter));
            subscribed.extend(
                target
                    .source_array()
                    .iter()
                    .cloned()
                    .map(Channel::UpdateFilterText),
            );
            for channel in subscribed {
                let log = Rc::clone(&notified);
                let name = channel.name();
                channels.subscribe(channel.name(), move |_| log.borrow_mut().push(name.clone()));
            }

            let host = RecordingHost::new();
            let mut store = FilterStore::new(open_settings(&config)?)
                .with_environment(config.environment())
                .with_widgets(definition.widgets.clone())
                .with_broadcaster(channels)
                .with_host(host.clone());
            store.init(&definition.filters, &dashboard_id(&definition, &config));

            let paths: Vec<&str> = select.iter().map(String::as_str).collect();
            store.set_checked(idx, &paths);
            store.set_exclude(idx, *exclude);
            store.apply_filter(idx, *quiet_widgets);

            let notified = notified.borrow().clone();
            match format {
                OutputFormat::Text => {
                    println!("{}", format_filters_table(store.items()));
                    for channel in &notified {
                        println!("notified {channel}");
                    }
                    for message in host.messages() {
                        println!("host <- {}", serde_json::to_string(&message)?);
                    }
                }
                OutputFormat::Json => {
                    let body = json!({
                        "filter": store.get_filter(idx),
                        "notified": notified,
                        "hostMessages": host.messages(),
                        "url": store.url_string(None, false),
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
            }
        }
    }

    Ok(())
}
