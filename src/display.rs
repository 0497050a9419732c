use crate::filter::{FilterDefinition, SelectionMode};
use crate::resolver::WidgetModelFilter;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use std::fmt::Write as _;

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h.bold().to_string())));
    table
}

fn mode_label(mode: SelectionMode) -> &'static str {
    match mode {
        SelectionMode::Empty => "-",
        SelectionMode::Single => "single",
        SelectionMode::Multi => "multi",
        SelectionMode::Interval => "interval",
    }
}

/// Render compiled filters as a table.
pub fn format_filters_table(filters: &[FilterDefinition]) -> String {
    let mut table = styled_table(&[
        "#", "Label", "Property", "Target", "Source", "Location", "Mode", "Selection",
    ]);

    for (idx, flt) in filters.iter().enumerate() {
        let selection = if flt.is_exclude && !flt.value_display.is_empty() {
            format!("NOT {}", flt.value_display)
        } else {
            flt.value_display.clone()
        };
        table.add_row(vec![
            Cell::new(idx),
            Cell::new(&flt.label),
            Cell::new(&flt.target_property),
            Cell::new(&flt.target),
            Cell::new(&flt.source),
            Cell::new(flt.location.as_str()),
            Cell::new(mode_label(flt.mode())),
            Cell::new(selection),
        ]);
    }

    table.to_string()
}

/// Render the resolver view of one widget.
pub fn format_widget_report(
    widget: &str,
    affecting: &[&FilterDefinition],
    displayed: &[WidgetModelFilter],
    used: &[&FilterDefinition],
    click_target: Option<&str>,
) -> String {
    fn names(filters: &[&FilterDefinition]) -> String {
        if filters.is_empty() {
            return "(none)".dimmed().to_string();
        }
        filters
            .iter()
            .map(|f| f.target_property.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("Widget {widget}").bold());
    let _ = writeln!(out, "  affected by:  {}", names(affecting));
    let _ = writeln!(out, "  uses:         {}", names(used));
    let _ = writeln!(
        out,
        "  click target: {}",
        click_target.map(str::to_string).unwrap_or_else(|| "(none)".dimmed().to_string())
    );

    if displayed.is_empty() {
        let _ = writeln!(out, "  displays:     {}", "(none)".dimmed());
        return out;
    }

    let mut table = styled_table(&["#", "Label", "Selection"]);
    for model in displayed {
        table.add_row(vec![
            Cell::new(model.idx),
            Cell::new(&model.label),
            Cell::new(&model.text),
        ]);
    }
    let _ = writeln!(out, "  displays:");
    let _ = writeln!(out, "{table}");
    out
}
