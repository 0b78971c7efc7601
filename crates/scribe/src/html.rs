//! Purpose visualization: renders a directory of reports into `report.html`.
//!
//! Layout:
//! - **Purposes** lane: every report with data (`p{id}`), then every child
//!   purpose with data (`p{id}'`).
//! - **Data** lane: sorted union of all data (`d{n}`).
//! - **DataRecipients** lane: unique transfers sorted by recipient (`dr{n}`).
//! - **Composed Purposes**: each report with its child purposes.
//!
//! Reports and purposes without data are left out; numbering is assigned
//! after that filter, parents first.

use crate::{Purpose, Report, ReportError};
use common::Transfer;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Output file name, written inside the scanned directory.
pub const HTML_FILE: &str = "report.html";

/// A report that survived the data filter, with its assigned ids.
struct Lane<'a> {
    id: usize,
    report: &'a Report,
    children: Vec<(usize, &'a Purpose)>,
}

/// Reads every `*.json` report directly inside `folder`, sorted by file name.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_reports(folder: &Path) -> Result<Vec<Report>, ReportError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
        {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Report>(&content) {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable report");
            }
        }
    }
    Ok(reports)
}

/// Renders `folder/report.html` from the reports in `folder`. Returns the written path.
pub fn render_directory(folder: &Path) -> Result<PathBuf, ReportError> {
    let reports = load_reports(folder)?;
    let title = folder
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let html = render(&title, &reports);

    let out = folder.join(HTML_FILE);
    std::fs::write(&out, html)?;
    tracing::info!(path = %out.display(), reports = reports.len(), "visualization written");
    Ok(out)
}

/// Renders the full HTML document for `reports`.
pub fn render(title: &str, reports: &[Report]) -> String {
    let lanes = number(reports);

    let mut purposes = String::new();
    for lane in &lanes {
        let view = PurposeView::from(lane.report);
        purposes.push_str(&render_purpose(lane.id, &view, false, lane.children.len()));
    }
    for lane in &lanes {
        for (id, child) in &lane.children {
            purposes.push_str(&render_purpose(*id, &PurposeView::from(*child), true, 0));
        }
    }

    let mut data = String::new();
    for (i, item) in collect_data(&lanes).iter().enumerate() {
        data.push_str(&format!(
            "<table class=\"lane-item\"><tr><th colspan=\"2\"><span>d{}:</span><span> {}</span></th></tr></table>",
            i + 1,
            escape(last_segment(item))
        ));
    }

    let mut recipients = String::new();
    for (i, t) in collect_transfers(&lanes).iter().enumerate() {
        recipients.push_str(&format!(
            "<table class=\"lane-item\"><tr><th colspan=\"2\"><span>dr{}:</span><span> {}</span></th></tr>\
             <tr><td class=\"key\"><em>policyURL:</em></td><td>{}</td></tr></table>",
            i + 1,
            escape(&t.recipient_id),
            escape(&t.policy_url)
        ));
    }

    let mut composed = String::new();
    for lane in &lanes {
        composed.push_str(&render_composed(lane));
    }

    format!(
        "<html><head>\n<link rel=\"stylesheet\" href=\"styles.css\"><meta charset=\"utf-8\"></head>\n<body>\n<main>\
         <h1>Purpose data for {title}</h1>\
         <div class=\"lanes\">\
         <section class=\"lane\"><h2>Purposes</h2>{purposes}</section>\
         <section class=\"lane no-shrink\"><h2>Data</h2>{data}</section>\
         <section class=\"lane\"><h2>DataRecipients</h2>{recipients}</section>\
         </div>\
         <section><h2>Composed Purposes</h2>{composed}</section>\
         </main></body></html>",
        title = escape(title),
    )
}

/// Drops reports and child purposes without data, then numbers the rest:
/// parents `1..=k`, children continuing from `k + 1`.
fn number(reports: &[Report]) -> Vec<Lane<'_>> {
    let mut next = 1;
    let mut lanes: Vec<Lane<'_>> = reports
        .iter()
        .filter(|r| !r.data.is_empty())
        .map(|report| {
            let lane = Lane {
                id: next,
                report,
                children: Vec::new(),
            };
            next += 1;
            lane
        })
        .collect();

    for lane in &mut lanes {
        for child in lane.report.purposes.iter().filter(|p| !p.data.is_empty()) {
            lane.children.push((next, child));
            next += 1;
        }
    }
    lanes
}

/// Sorted union of all data shown in the visualization.
fn collect_data(lanes: &[Lane<'_>]) -> Vec<String> {
    let all: BTreeSet<&String> = lanes.iter().flat_map(|l| &l.report.data).collect();
    all.into_iter().cloned().collect()
}

/// Transfers of all shown reports, unique by value, sorted by recipient.
fn collect_transfers(lanes: &[Lane<'_>]) -> Vec<Transfer> {
    let mut seen: HashSet<&Transfer> = HashSet::new();
    let mut unique: Vec<Transfer> = Vec::new();
    for lane in lanes {
        for t in &lane.report.transfers {
            if seen.insert(t) {
                unique.push(t.clone());
            }
        }
    }
    unique.sort_by(|a, b| a.recipient_id.cmp(&b.recipient_id));
    unique
}

/// The fields shared by reports and purposes that a lane item displays.
struct PurposeView<'a> {
    name: &'a str,
    description: &'a str,
    opt_out: bool,
    required: bool,
    retention: Option<&'a str>,
    pm: Option<&'a str>,
    data: &'a [String],
    transfers: &'a [Transfer],
}

impl<'a> From<&'a Report> for PurposeView<'a> {
    fn from(r: &'a Report) -> Self {
        Self {
            name: &r.name,
            description: &r.description,
            opt_out: r.opt_out,
            required: r.required,
            retention: r.retention.as_deref(),
            pm: r.pm.as_deref(),
            data: &r.data,
            transfers: &r.transfers,
        }
    }
}

impl<'a> From<&'a Purpose> for PurposeView<'a> {
    fn from(p: &'a Purpose) -> Self {
        Self {
            name: &p.name,
            description: &p.description,
            opt_out: p.opt_out,
            required: p.required,
            retention: p.retention.as_deref(),
            pm: p.pm.as_deref(),
            data: &p.data,
            transfers: &p.transfers,
        }
    }
}

fn render_purpose(id: usize, p: &PurposeView<'_>, child: bool, child_count: usize) -> String {
    let mark = if child { "'" } else { "" };
    let desc = if p.description.is_empty() {
        "\"\""
    } else {
        p.description
    };
    let data: Vec<&str> = p.data.iter().map(|d| last_segment(d)).collect();
    let recipients: Vec<&str> = p.transfers.iter().map(|t| t.recipient_id.as_str()).collect();

    let mut out = String::new();
    out.push_str(&format!(
        "<table class=\"lane-item\">\
         <tr><th colspan=\"2\"><span>p{id}{mark}:</span><span> {name}</span></th></tr>\
         <tr><td class=\"key\"><em>desc:</em></td><td>{desc}</td></tr>\
         <tr><td class=\"key\"><em>optOut:</em></td><td>{opt_out}</td></tr>\
         <tr><td class=\"key\"><em>required:</em></td><td>{required}</td></tr>\
         <tr><td class=\"key\"><em>retention:</em></td><td>{retention}</td></tr>\
         <tr><td class=\"key\"><em>pm:</em></td><td>{pm}</td></tr>\
         <tr><td class=\"key\"><em>D:</em></td><td>[{data}]</td></tr>\
         <tr><td class=\"key\"><em>DR:</em></td><td>[{dr}]</td></tr>",
        name = escape(display_name(p.name)),
        desc = escape(desc),
        opt_out = p.opt_out,
        required = p.required,
        retention = escape(p.retention.unwrap_or("(AfterPurpose, 0)")),
        pm = escape(p.pm.unwrap_or("null")),
        data = escape(&data.join(", ")),
        dr = escape(&recipients.join(", ")),
    ));
    if !child {
        out.push_str(&format!(
            "<tr><td class=\"key\"><em>p':</em></td><td>{child_count}</td></tr>"
        ));
    }
    out.push_str("</table>");
    out
}

fn render_composed(lane: &Lane<'_>) -> String {
    let mut children = String::new();
    for (id, child) in &lane.children {
        let short = display_name(&child.name);
        let short = short.rsplit('#').next().unwrap_or(short);
        children.push_str(&format!(
            "<div class=\"cp-container\"><div><div class=\"cp-arrow-top\"></div><div class=\"cp-arrow-bottom\"></div></div>\
             <table class=\"composed-purpose lane-item\"><tr><th colspan=\"2\"><span>p{id}':</span><span> #{name}</span></th></tr></table></div>",
            name = escape(short)
        ));
    }
    format!(
        "<div><table class=\"lane-item composed-parent\"><tr><th colspan=\"2\"><span>p{id}:</span><span> {name}</span></th></tr></table>\
         <div class=\"diamond\"></div><div>{children}</div></div>",
        id = lane.id,
        name = escape(display_name(&lane.report.name)),
    )
}

/// `com.acme.web.Ctrl#get(java.lang.String)` -> `Ctrl#get`.
fn display_name(name: &str) -> &str {
    let head = name.split('(').next().unwrap_or(name);
    last_segment(head)
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
