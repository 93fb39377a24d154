// ============================================================
// Layer 7 - HTML Report
// ============================================================
// Renders a DatasetProfile into one self-contained HTML file.
//
// The template is a handlebars string compiled into the binary.
// All numbers are formatted here, so the template only places
// strings; histograms are inline SVG built in Rust and inserted
// with a triple-stash.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde_json::{json, Value};

use super::stats::{Correlations, DatasetProfile, Histogram};

const TEMPLATE_NAME: &str = "profile_report";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style>
body { font-family: -apple-system, Segoe UI, Helvetica, Arial, sans-serif; margin: 2rem; color: #222; }
h1 { margin-bottom: 0.2rem; }
h2 { border-bottom: 2px solid #4a6fa5; padding-bottom: 0.3rem; margin-top: 2.5rem; }
table { border-collapse: collapse; margin: 0.5rem 0; font-size: 0.9rem; }
th, td { border: 1px solid #ddd; padding: 0.25rem 0.6rem; text-align: left; }
th { background: #f0f3f8; }
.variable { border: 1px solid #ddd; border-radius: 6px; padding: 1rem; margin: 1rem 0; }
.variable h3 { margin-top: 0; }
.kind { font-size: 0.8rem; background: #4a6fa5; color: #fff; padding: 0.1rem 0.5rem; border-radius: 4px; }
.row { display: flex; gap: 2rem; flex-wrap: wrap; align-items: flex-start; }
.alert { color: #8a4b00; }
.muted { color: #888; }
</style>
</head>
<body>
<h1>{{title}}</h1>
<p class="muted">Generated {{generated}}</p>

<h2 id="overview">Overview</h2>
<div class="row">
<table>
<tr><th>Rows</th><td>{{overview.rows}}</td></tr>
<tr><th>Columns</th><td>{{overview.columns}}</td></tr>
<tr><th>Missing cells</th><td>{{overview.missing}}</td></tr>
<tr><th>Duplicate rows</th><td>{{overview.duplicates}}</td></tr>
</table>
<table>
<tr><th>Column kind</th><th>Count</th></tr>
{{#each overview.kinds}}<tr><td>{{this.kind}}</td><td>{{this.count}}</td></tr>
{{/each}}
</table>
</div>

<h2 id="alerts">Alerts</h2>
{{#if alerts}}
<table>
<tr><th>Column</th><th>Alert</th><th>Detail</th></tr>
{{#each alerts}}<tr class="alert"><td>{{this.column}}</td><td>{{this.kind}}</td><td>{{this.detail}}</td></tr>
{{/each}}
</table>
{{else}}
<p class="muted">No alerts.</p>
{{/if}}

<h2 id="variables">Variables</h2>
{{#each columns}}
<div class="variable">
<h3>{{this.name}} <span class="kind">{{this.kind}}</span></h3>
<div class="row">
<table>
<tr><th>Distinct</th><td>{{this.distinct}}</td></tr>
<tr><th>Missing</th><td>{{this.missing}}</td></tr>
{{#each this.stats}}<tr><th>{{this.label}}</th><td>{{this.value}}</td></tr>
{{/each}}
</table>
{{#if this.histogram}}<div>{{{this.histogram}}}</div>{{/if}}
{{#if this.top_values}}
<table>
<tr><th>Value</th><th>Count</th></tr>
{{#each this.top_values}}<tr><td>{{this.value}}</td><td>{{this.count}}</td></tr>
{{/each}}
</table>
{{/if}}
</div>
</div>
{{/each}}

<h2 id="correlations">Correlations</h2>
{{#if correlations.columns}}
<table>
<tr><th></th>{{#each correlations.columns}}<th>{{this}}</th>{{/each}}</tr>
{{#each correlations.rows}}<tr><th>{{this.name}}</th>{{#each this.cells}}<td style="background:{{this.color}}">{{this.value}}</td>{{/each}}</tr>
{{/each}}
</table>
{{else}}
<p class="muted">Fewer than two numeric columns.</p>
{{/if}}

<h2 id="sample">Sample</h2>
<h3>First rows</h3>
<table>
<tr>{{#each headers}}<th>{{this}}</th>{{/each}}</tr>
{{#each head}}<tr>{{#each this}}<td>{{this}}</td>{{/each}}</tr>
{{/each}}
</table>
{{#if tail}}
<h3>Last rows</h3>
<table>
<tr>{{#each headers}}<th>{{this}}</th>{{/each}}</tr>
{{#each tail}}<tr>{{#each this}}<td>{{this}}</td>{{/each}}</tr>
{{/each}}
</table>
{{/if}}
</body>
</html>
"#;

/// Render the report to an HTML string.
pub fn render(profile: &DatasetProfile, title: &str, headers: &[String]) -> Result<String> {
    let mut hb = Handlebars::new();
    hb.register_template_string(TEMPLATE_NAME, TEMPLATE)
        .context("Profile report template is invalid")?;
    hb.render(TEMPLATE_NAME, &view(profile, title, headers))
        .context("Failed to render profile report")
}

/// Render and write the report, creating the parent directory.
pub fn write_report(profile: &DatasetProfile, title: &str, headers: &[String], path: &Path) -> Result<()> {
    let html = render(profile, title, headers)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    fs::write(path, html).with_context(|| format!("Cannot write report '{}'", path.display()))?;
    tracing::debug!("Wrote profile report to '{}'", path.display());
    Ok(())
}

fn view(profile: &DatasetProfile, title: &str, headers: &[String]) -> Value {
    let o = &profile.overview;
    let columns: Vec<Value> = profile
        .columns
        .iter()
        .map(|c| {
            let stats: Vec<Value> = c
                .numeric
                .as_ref()
                .map(|n| {
                    let mut rows = vec![
                        stat("Mean", fmt_num(n.mean)),
                        stat("Std", fmt_num(n.std)),
                        stat("Min", fmt_num(n.min)),
                    ];
                    rows.extend(n.percentiles.iter().map(|(p, v)| stat(&format!("{p}%"), fmt_num(*v))));
                    rows.push(stat("Max", fmt_num(n.max)));
                    rows.push(stat("Zeros", n.zeros.to_string()));
                    rows.push(stat("Negatives", n.negatives.to_string()));
                    rows
                })
                .unwrap_or_default();

            json!({
                "name": c.name,
                "kind": c.kind.label(),
                "distinct": format!("{} ({:.1}%)", c.distinct, c.distinct_pct),
                "missing": format!("{} ({:.1}%)", c.missing, c.missing_pct),
                "stats": stats,
                "histogram": c.numeric.as_ref().map(|n| histogram_svg(&n.histogram)),
                "top_values": c.top_values.iter()
                    .map(|(v, n)| json!({ "value": v, "count": n }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "title": title,
        "generated": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "overview": {
            "rows": o.rows,
            "columns": o.columns,
            "missing": format!("{} ({:.1}%)", o.missing_cells, o.missing_pct),
            "duplicates": format!("{} ({:.1}%)", o.duplicate_rows, o.duplicate_pct),
            "kinds": o.kinds.iter().map(|(k, n)| json!({ "kind": k, "count": n })).collect::<Vec<_>>(),
        },
        "alerts": profile.alerts.iter()
            .map(|a| json!({ "column": a.column, "kind": a.kind.label(), "detail": a.detail }))
            .collect::<Vec<_>>(),
        "columns": columns,
        "correlations": correlation_view(&profile.correlations),
        "headers": headers,
        "head": profile.head,
        "tail": profile.tail,
    })
}

fn stat(label: &str, value: String) -> Value {
    json!({ "label": label, "value": value })
}

fn correlation_view(c: &Correlations) -> Value {
    if c.columns.len() < 2 {
        return json!({ "columns": [], "rows": [] });
    }
    let rows: Vec<Value> = c
        .columns
        .iter()
        .zip(&c.matrix)
        .map(|(name, row)| {
            let cells: Vec<Value> = row
                .iter()
                .map(|r| match r {
                    Some(r) => json!({ "value": format!("{r:.2}"), "color": heat(*r) }),
                    None    => json!({ "value": "-", "color": "#fff" }),
                })
                .collect();
            json!({ "name": name, "cells": cells })
        })
        .collect();
    json!({ "columns": c.columns, "rows": rows })
}

/// Blue for positive, red for negative, alpha by strength.
fn heat(r: f64) -> String {
    let alpha = r.abs().min(1.0) * 0.8;
    if r >= 0.0 {
        format!("rgba(74,111,165,{alpha:.2})")
    } else {
        format!("rgba(192,57,43,{alpha:.2})")
    }
}

/// Bar chart of one histogram as an inline SVG element.
pub fn histogram_svg(h: &Histogram) -> String {
    const WIDTH: f64 = 300.0;
    const HEIGHT: f64 = 120.0;
    const LABEL: f64 = 16.0;

    let peak = h.counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let bar = WIDTH / h.counts.len().max(1) as f64;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{}" viewBox="0 0 {WIDTH} {}">"#,
        HEIGHT + LABEL,
        HEIGHT + LABEL
    );
    for (i, &count) in h.counts.iter().enumerate() {
        let height = count as f64 / peak * HEIGHT;
        svg.push_str(&format!(
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="#4a6fa5"><title>[{}, {}): {}</title></rect>"##,
            i as f64 * bar + 1.0,
            HEIGHT - height,
            (bar - 2.0).max(1.0),
            height,
            fmt_num(h.edges[i]),
            fmt_num(h.edges[i + 1]),
            count
        ));
    }
    if let (Some(first), Some(last)) = (h.edges.first(), h.edges.last()) {
        svg.push_str(&format!(
            r#"<text x="0" y="{y}" font-size="11">{}</text><text x="{WIDTH}" y="{y}" font-size="11" text-anchor="end">{}</text>"#,
            fmt_num(*first),
            fmt_num(*last),
            y = HEIGHT + LABEL - 3.0
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Compact number formatting for the report.
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else if v.abs() >= 1e6 || v.abs() < 1e-3 {
        format!("{v:.4e}")
    } else {
        format!("{v:.4}")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Table;
    use crate::profiling::stats::profile_table;

    fn sample() -> Table {
        Table::new(
            vec!["age".into(), "income".into(), "city".into()],
            (0..25)
                .map(|i| vec![(20 + i).to_string(), (1000 * i).to_string(), format!("<city{}>", i % 3)])
                .collect(),
        )
    }

    #[test]
    fn test_render_has_all_sections() {
        let t = sample();
        let html = render(&profile_table(&t), "people.csv", &t.headers).unwrap();
        for id in ["overview", "alerts", "variables", "correlations", "sample"] {
            assert!(html.contains(&format!(r#"id="{id}""#)), "missing section {id}");
        }
        assert!(html.contains("<title>people.csv</title>"));
        assert!(html.contains("<svg"));
        assert!(html.contains("Last rows"));
        // cell text is escaped, the svg is not
        assert!(html.contains("&lt;city0&gt;"));
        assert!(!html.contains("<city0>"));
    }

    #[test]
    fn test_write_report_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("people_profile_report.html");
        let t = sample();
        write_report(&profile_table(&t), "people.csv", &t.headers, &path).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("High correlation"));
    }

    #[test]
    fn test_histogram_svg_has_one_bar_per_bin() {
        let h = Histogram { edges: (0..=10).map(f64::from).collect(), counts: vec![1; 10] };
        let svg = histogram_svg(&h);
        assert_eq!(svg.matches("<rect").count(), 10);
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(0.5), "0.5000");
    }
}
