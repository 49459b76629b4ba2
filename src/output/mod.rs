pub mod report;

use colored::{ColoredString, Colorize};
use serde::Serialize;
use serde_json::Value;

use crate::dashboard::DashboardState;
use crate::subscriber::{Column, DisplayRow, Kpis};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// What a renderer needs to draw one dashboard frame.
#[derive(Clone, Copy, Debug)]
pub struct DashboardView<'a> {
    pub account_id: u64,
    pub endpoint: &'a str,
    pub columns: &'a [Column],
    pub state: &'a DashboardState,
    pub show_raw: bool,
}

impl<'a> DashboardView<'a> {
    pub fn rows(&self) -> Vec<DisplayRow> {
        self.state
            .rows()
            .iter()
            .map(|row| row.select(self.columns))
            .collect()
    }

    pub fn raw_json(&self) -> Option<String> {
        if !self.show_raw {
            return None;
        }
        self.state.document().map(crate::client::response::pretty)
    }

    pub fn state_label(&self) -> &'static str {
        match self.state {
            DashboardState::Idle => "idle",
            DashboardState::Loading => "loading",
            DashboardState::Loaded(_) => "loaded",
            DashboardState::Failed(_) => "failed",
        }
    }
}

fn paint(text: &str, styled: bool, style: fn(&str) -> ColoredString) -> String {
    if styled {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n', '\t'], " ")
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    let mut out = value.to_string();
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    out
}

pub fn render_kpis(kpis: Kpis, styled: bool) -> String {
    let tile = |label: &str, value: usize, style: fn(&str) -> ColoredString| {
        format!(
            "[ {} {} ]",
            paint(label, styled, |s| s.dimmed()),
            paint(&value.to_string(), styled, style)
        )
    };
    [
        tile("Total", kpis.total, |s| s.bold().white()),
        tile("Active", kpis.active, |s| s.bold().green()),
        tile("Inactive", kpis.inactive, |s| s.bold().yellow()),
    ]
    .join("  ")
}

pub fn render_table(columns: &[Column], rows: &[DisplayRow], styled: bool) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| single_line(row.get(c.key).unwrap_or("")))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.title.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header = columns
        .iter()
        .zip(widths.iter())
        .map(|(c, w)| pad(c.title, *w))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(&paint(header.trim_end(), styled, |s| s.bold().cyan()));
    out.push('\n');
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    out.push_str(&paint(&rule, styled, |s| s.dimmed()));
    out.push('\n');

    if cells.is_empty() {
        out.push_str(&paint("No data.", styled, |s| s.dimmed()));
        out.push('\n');
        return out;
    }

    for row in cells.iter() {
        let line = row
            .iter()
            .zip(widths.iter())
            .map(|(v, w)| pad(v, *w))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// The full dashboard as terminal text. With `styled` off the result is
/// plain text suitable for a report file.
pub fn render_text(view: &DashboardView<'_>, styled: bool) -> String {
    let mut out = String::new();
    out.push_str(&paint("OCS Dashboard", styled, |s| s.bold().white()));
    out.push_str(&format!(
        "  ::  account {}  ::  {}\n\n",
        view.account_id, view.endpoint
    ));

    if view.state.is_loading() {
        out.push_str(&paint("Loading…", styled, |s| s.yellow()));
        out.push_str("\n\n");
    }
    if let Some(err) = view.state.error() {
        out.push_str(&paint(&format!("API error: {err}"), styled, |s| s.red()));
        out.push_str("\n\n");
    }

    out.push_str(&render_kpis(view.state.kpis(), styled));
    out.push_str("\n\n");

    if let Some(raw) = view.raw_json() {
        out.push_str(&paint("Raw response", styled, |s| s.bold()));
        out.push('\n');
        out.push_str(&raw);
        out.push_str("\n\n");
    }

    out.push_str(&render_table(view.columns, &view.rows(), styled));
    out
}

#[derive(Serialize)]
struct ColumnHeader<'a> {
    key: &'a str,
    title: &'a str,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    account_id: u64,
    endpoint: &'a str,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    kpis: Kpis,
    columns: Vec<ColumnHeader<'a>>,
    rows: Vec<DisplayRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<&'a Value>,
}

pub fn render_json(view: &DashboardView<'_>) -> Vec<u8> {
    let report = JsonReport {
        account_id: view.account_id,
        endpoint: view.endpoint,
        state: view.state_label(),
        error: view.state.error(),
        kpis: view.state.kpis(),
        columns: view
            .columns
            .iter()
            .map(|c| ColumnHeader {
                key: c.key,
                title: c.title,
            })
            .collect(),
        rows: view.rows(),
        raw: if view.show_raw {
            view.state.document()
        } else {
            None
        },
    };
    serde_json::to_vec_pretty(&report).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(view: &DashboardView<'_>) -> Vec<u8> {
    report::render_html(view)
}

pub fn render(view: &DashboardView<'_>, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(view, false).into_bytes(),
        OutputFormat::Json => render_json(view),
        OutputFormat::Html => render_html(view),
    }
}
