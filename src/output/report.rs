use super::DashboardView;

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn kpi_tile(label: &str, value: usize, accent: &str) -> String {
    format!(
        r#"      <div class="kpi"><div class="kpi-label">{label}</div><div class="kpi-value" style="color:{accent}">{value}</div></div>
"#
    )
}

pub fn render_html(view: &DashboardView<'_>) -> Vec<u8> {
    let kpis = view.state.kpis();
    let mut tiles = String::new();
    tiles.push_str(&kpi_tile("Total", kpis.total, "#cfd8ff"));
    tiles.push_str(&kpi_tile("Active", kpis.active, "#8ef0b0"));
    tiles.push_str(&kpi_tile("Inactive", kpis.inactive, "#ffd68a"));

    let error = view
        .state
        .error()
        .map(|e| {
            format!(
                "    <div class=\"error\">API error: {}</div>\n",
                escape_html(e)
            )
        })
        .unwrap_or_default();

    let raw = view
        .raw_json()
        .map(|raw| {
            format!(
                "    <div class=\"panel\">\n      <div class=\"panel-title\">Raw response</div>\n      <pre>{}</pre>\n    </div>\n",
                escape_html(&raw)
            )
        })
        .unwrap_or_default();

    let mut head = String::new();
    for column in view.columns.iter() {
        head.push_str(&format!("<th>{}</th>", escape_html(column.title)));
    }

    let rows = view.rows();
    let mut body = String::new();
    if rows.is_empty() {
        body.push_str(&format!(
            "        <tr><td colspan=\"{}\" class=\"empty\">No data.</td></tr>\n",
            view.columns.len().max(1)
        ));
    }
    for row in rows.iter() {
        body.push_str("        <tr>");
        for (_, value) in row.cells() {
            body.push_str(&format!("<td>{}</td>", escape_html(value)));
        }
        body.push_str("</tr>\n");
    }

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>OCS Dashboard</title>
  <style>
    body {{ background: #0b1020; color: #e6ebff; font-family: Inter, system-ui, sans-serif; margin: 0; padding: 32px; }}
    h1 {{ margin: 0 0 4px 0; }}
    .meta {{ color: #8a94c2; font-size: 13px; margin-bottom: 20px; }}
    .kpis {{ display: flex; gap: 12px; margin-bottom: 16px; }}
    .kpi {{ background: #151a2e; border-radius: 12px; padding: 12px 18px; min-width: 120px; }}
    .kpi-label {{ color: #8a94c2; font-size: 12px; text-transform: uppercase; }}
    .kpi-value {{ font-size: 28px; font-weight: 700; }}
    .error {{ color: #ffb3b3; margin: 10px 0; }}
    .panel {{ background: #151a2e; padding: 12px; border-radius: 12px; color: #cfd8ff; margin-top: 16px; }}
    .panel-title {{ font-weight: 700; margin-bottom: 8px; }}
    pre {{ margin: 0; white-space: pre-wrap; }}
    table {{ margin-top: 20px; width: 100%; border-collapse: collapse; }}
    th {{ text-align: left; border-bottom: 1px solid #2a3356; padding: 8px; }}
    td {{ padding: 8px; }}
    td.empty {{ opacity: 0.8; }}
  </style>
</head>
<body>
  <main>
    <h1>OCS Dashboard</h1>
    <div class="meta">account {account} &middot; {endpoint} &middot; {state}</div>
{error}    <div class="kpis">
{tiles}    </div>
{raw}    <table>
      <thead>
        <tr>{head}</tr>
      </thead>
      <tbody>
{body}      </tbody>
    </table>
  </main>
</body>
</html>
"####,
        account = view.account_id,
        endpoint = escape_html(view.endpoint),
        state = view.state_label(),
    );

    html.into_bytes()
}
