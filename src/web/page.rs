//! Server-side rendering of the dashboard page

use anyhow::Result;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use super::chart;
use crate::chrome::Logo;
use crate::dashboard::{Section, Selection, Snapshot, View, SIDEBAR_SOURCE};
use crate::db::Table;

pub struct PageContext<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub logo: &'a Logo,
    pub selection: &'a Selection,
    pub snapshot: &'a Snapshot,
}

pub fn render_page(ctx: &PageContext<'_>) -> Result<String> {
    let sidebar = render_sidebar(ctx)?;
    let main = render_main(&ctx.selection.plan(), ctx.snapshot)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <aside class="sidebar">
{sidebar}
    </aside>
    <main class="main">
        <h1>{title}</h1>
        <p>{subtitle}</p>
        <hr>
{main}
    </main>
</body>
</html>"#,
        title = encode_text(ctx.title),
        subtitle = encode_text(ctx.subtitle),
        css = inline_css(),
    ))
}

fn render_sidebar(ctx: &PageContext<'_>) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"        <img class="logo" alt="logo" src="{}">"#,
        encode_double_quoted_attribute(ctx.logo.data_uri())
    );
    out.push_str(&render_selector(ctx.selection));
    out.push_str(&render_risk_settings(ctx.snapshot.get(SIDEBAR_SOURCE)?));
    Ok(out)
}

/// Selector form. Submitting it reloads the page with `?view=<label>`.
fn render_selector(selection: &Selection) -> String {
    let mut options = String::new();
    if selection.view().is_none() {
        options.push_str(r#"<option value="" selected disabled>Select a dashboard</option>"#);
    }
    for view in View::ALL {
        let selected = if selection.view() == Some(view) { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{value}"{selected}>{label}</option>"#,
            value = encode_double_quoted_attribute(view.label()),
            label = encode_text(view.label()),
        );
    }
    format!(
        r#"        <form method="get" action="/">
            <label for="view">Select a Dashboard</label>
            <select id="view" name="view" onchange="this.form.submit()">{options}</select>
            <noscript><button type="submit">Show</button></noscript>
        </form>
"#
    )
}

/// Sidebar risk table. Depends on nothing but the table itself.
pub fn render_risk_settings(table: &Table) -> String {
    format!(
        r#"        <div class="risk-settings">
            <p>Risky Countries Settings</p>
            {}
        </div>
"#,
        render_table(SIDEBAR_SOURCE.name(), table)
    )
}

fn render_main(plan: &[Section], snapshot: &Snapshot) -> Result<String> {
    let mut out = String::new();
    for section in plan {
        out.push_str(&render_section(section, snapshot)?);
        out.push('\n');
    }
    Ok(out)
}

fn render_section(section: &Section, snapshot: &Snapshot) -> Result<String> {
    let html = match section {
        Section::Subheader(text) => format!("        <h2>{}</h2>", encode_text(text)),
        Section::Caption(text) => format!("        <p>{}</p>", encode_text(text)),
        Section::BarChart { source, x, y } => {
            let (categories, series) = chart::extract(snapshot.get(*source)?, x, y)?;
            panel(source.name(), &chart::bar_chart(&categories, &series))
        }
        Section::AreaChart { source, x, y } => {
            let (categories, mut series) = chart::extract(snapshot.get(*source)?, x, &[*y])?;
            let series = series.remove(0);
            panel(source.name(), &chart::area_chart(&categories, &series))
        }
        Section::Table { source } => render_table(source.name(), snapshot.get(*source)?),
    };
    Ok(html)
}

fn panel(source: &str, body: &str) -> String {
    format!(r#"        <div class="panel" data-source="{}">{}</div>"#, source, body)
}

/// Table with the first column as the row index
pub fn render_table(source: &str, table: &Table) -> String {
    let mut out = String::new();
    let _ = write!(out, r#"<div class="panel table-wrap" data-source="{}"><table><thead><tr>"#, source);
    for column in &table.columns {
        let _ = write!(out, "<th>{}</th>", encode_text(column));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for (index, cell) in row.iter().enumerate() {
            let text = cell.to_string();
            if index == 0 {
                let _ = write!(out, r#"<th scope="row">{}</th>"#, encode_text(&text));
            } else if cell.as_f64().is_some() {
                let _ = write!(out, r#"<td class="num">{}</td>"#, encode_text(&text));
            } else {
                let _ = write!(out, "<td>{}</td>", encode_text(&text));
            }
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
    out
}

fn inline_css() -> &'static str {
    r#"
body { margin: 0; display: flex; font-family: "Source Sans Pro", sans-serif; color: #31333f; }
.sidebar { width: 300px; min-height: 100vh; padding: 24px; background: #f0f2f6; box-sizing: border-box; }
.sidebar .logo { max-width: 100%; margin-bottom: 16px; }
.sidebar select { width: 100%; padding: 6px; margin: 6px 0 24px; }
.main { flex: 1; padding: 32px 48px; max-width: 1200px; }
.panel { margin: 12px 0 24px; }
.table-wrap { overflow-x: auto; }
table { border-collapse: collapse; font-size: 14px; }
th, td { border: 1px solid #e6e9ef; padding: 4px 10px; text-align: left; }
thead th { background: #fafafa; }
td.num { text-align: right; }
.chart { width: 100%; height: auto; font-size: 11px; }
.chart .empty { fill: #808495; font-size: 14px; }
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{load, FetchPolicy};
    use crate::db::testing::fixture_warehouse;
    use crate::db::Cell;

    fn main_panel(html: &str) -> &str {
        let start = html.find(r#"<main class="main">"#).unwrap();
        let end = html.find("</main>").unwrap();
        &html[start..end]
    }

    fn sources(fragment: &str) -> Vec<&str> {
        fragment
            .split(r#"data-source=""#)
            .skip(1)
            .filter_map(|s| s.split('"').next())
            .collect()
    }

    async fn render(selection: Selection) -> (String, Snapshot) {
        let warehouse = fixture_warehouse().await;
        let snapshot = load(&warehouse, &selection, FetchPolicy::All).await.unwrap();
        let logo = Logo::from_bytes("png", b"logo");
        let html = render_page(&PageContext {
            title: "Fraud Detection Analytics",
            subtitle: "Demo",
            logo: &logo,
            selection: &selection,
            snapshot: &snapshot,
        })
        .unwrap();
        (html, snapshot)
    }

    #[tokio::test]
    async fn risky_destination_renders_its_two_tables_only() {
        let (html, _) = render(Selection::View(View::RiskyDestination)).await;
        assert_eq!(sources(main_panel(&html)), vec!["top5_country", "top_called_numbers"]);
        assert!(html.contains("<h2>Risky Destination Analysis</h2>"));
        assert!(html.contains("chart-bar"));
    }

    #[tokio::test]
    async fn sms_spamming_renders_area_chart_and_ranked_table() {
        let (html, _) = render(Selection::View(View::SmsSpamming)).await;
        let main = main_panel(&html);
        assert_eq!(sources(main), vec!["sms_by_country", "sms_spamming"]);
        assert!(main.contains("chart-area"));
        assert!(main.contains(r#"<th scope="row">33600001</th>"#));
    }

    #[tokio::test]
    async fn empty_and_unknown_views_leave_main_panel_blank() {
        for selection in [
            Selection::View(View::HandsetFraud),
            Selection::View(View::Wangiri),
            Selection::View(View::SimSwap),
            Selection::Unknown("Nope".into()),
        ] {
            let (html, _) = render(selection).await;
            let main = main_panel(&html);
            assert!(sources(main).is_empty());
            assert!(!main.contains("<h2>"));
        }
    }

    #[tokio::test]
    async fn sidebar_table_does_not_depend_on_selection() {
        let mut selections: Vec<Selection> = View::ALL.into_iter().map(Selection::View).collect();
        selections.push(Selection::Unknown("x".into()));

        let (_, snapshot) = render(Selection::resolve(None)).await;
        let expected = render_risk_settings(snapshot.get(SIDEBAR_SOURCE).unwrap());
        for selection in selections {
            let (html, _) = render(selection).await;
            assert!(html.contains(&expected));
        }
    }

    #[tokio::test]
    async fn selector_marks_current_view() {
        let (html, _) = render(Selection::View(View::Wangiri)).await;
        assert!(html.contains(r#"<option value="Wangiri (Empty)" selected>"#));
        assert_eq!(html.matches(" selected>").count(), 1);

        assert!(!html.contains("Select a dashboard</option>"));

        let (html, _) = render(Selection::Unknown("x".into())).await;
        assert!(html.contains(r#"<option value="" selected disabled>Select a dashboard</option>"#));
        assert_eq!(html.matches(" selected>").count(), 0);
        assert_eq!(html.matches(" selected").count(), 1);
    }

    #[test]
    fn table_uses_first_column_as_index_and_escapes() {
        let table = Table::new(
            vec!["BNUMBER".into(), "COUNTRYNAME".into(), "TOTALCOUNT".into()],
            vec![vec![
                Cell::Text("<script>".into()),
                Cell::Text("A&B".into()),
                Cell::Integer(7),
            ]],
        );
        let html = render_table("t", &table);
        assert!(html.contains(r#"<th scope="row">&lt;script&gt;</th>"#));
        assert!(html.contains("<td>A&amp;B</td>"));
        assert!(html.contains(r#"<td class="num">7</td>"#));
    }

    #[test]
    fn missing_table_fails_the_render() {
        let snapshot = Snapshot::default();
        let section = Section::Table {
            source: crate::db::QueryId::SmsSpamming,
        };
        assert!(render_section(&section, &snapshot).is_err());
    }
}
