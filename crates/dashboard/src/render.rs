//! Page shell, list screen, analytics screen and footer notices.

use rav_core::aggregate::{format_mean, Analytics, Summary};
use rav_core::constants::{COMPLIANCE_TARGET_PERCENT, LIST_CODE_PREVIEW};
use rav_core::patient::{PatientRecord, RiskStatus};
use rav_core::{Dialog, EducationCatalog, SortKey, StatusFilter, ViewState};
use url::form_urlencoded;

/// Which top-level screen the navigation bar highlights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Nav {
    Patients,
    Analytics,
    None,
}

pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Build an escaped link target from a path and query parameters.
pub(crate) fn href(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    escape_html(&format!("{path}?{query}"))
}

pub(crate) fn status_badge(status: RiskStatus) -> String {
    let class = match status {
        RiskStatus::VeryHigh => "badge very-high",
        RiskStatus::High => "badge high",
        RiskStatus::Moderate => "badge moderate",
    };
    format!(r#"<span class="{class}">{}</span>"#, status.as_str())
}

/// Wrap a screen body in the document shell.
///
/// `path` and `params` describe the current page so the footer notices can link back to it.
pub(crate) fn page(
    title: &str,
    nav: Nav,
    body: &str,
    dialog: &str,
    path: &str,
    params: &[(&str, &str)],
) -> String {
    let nav_link = |target: Nav, url: &str, label: &str| {
        let class = if nav == target { " class=\"active\"" } else { "" };
        format!(r#"<a href="{url}"{class}>{label}</a>"#)
    };
    let notice_link = |kind: &'static str, label: &str| {
        let mut with_dialog = params.to_vec();
        with_dialog.push(("dialog", kind));
        format!(r#"<a href="{}">{label}</a>"#, href(path, &with_dialog))
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Risk Adjustment Viewer</title>
<style>
*,*::before,*::after{{box-sizing:border-box}}
body{{margin:0;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#f8fafc;color:#0f172a}}
header{{background:#1e3a8a;color:#fff;padding:16px 32px;display:flex;align-items:center;gap:32px}}
header h1{{font-size:1.25rem;margin:0}}
header nav a{{color:#cbd5e1;text-decoration:none;margin-right:16px}}
header nav a.active{{color:#fff;font-weight:600}}
main{{padding:24px 32px;max-width:1280px;margin:0 auto}}
.cards{{display:grid;grid-template-columns:repeat(auto-fit,minmax(180px,1fr));gap:16px;margin-bottom:24px}}
.card{{background:#fff;border-radius:12px;box-shadow:0 1px 4px rgba(0,0,0,.08);padding:16px}}
.card .label{{color:#64748b;font-size:.8rem}}
.card .value{{font-size:1.6rem;font-weight:700}}
table{{width:100%;border-collapse:collapse;background:#fff;border-radius:12px;overflow:hidden}}
th,td{{text-align:left;padding:10px 12px;border-bottom:1px solid #e2e8f0;font-size:.9rem;vertical-align:top}}
th{{background:#f1f5f9;font-weight:600}}
.badge{{display:inline-block;border-radius:999px;padding:2px 10px;font-size:.75rem;font-weight:600}}
.very-high{{background:#fee2e2;color:#991b1b}}
.high{{background:#ffedd5;color:#9a3412}}
.moderate{{background:#fef9c3;color:#854d0e}}
.met{{background:#dcfce7;color:#166534}}
.gap{{background:#fee2e2;color:#991b1b}}
.due-soon{{background:#e0f2fe;color:#075985}}
.code{{font-family:monospace;background:#eef2ff;border-radius:4px;padding:1px 6px;margin-right:4px;text-decoration:none;color:#3730a3}}
.controls{{display:flex;gap:12px;margin-bottom:16px;flex-wrap:wrap}}
.controls input,.controls select,.controls button{{padding:8px 10px;border:1px solid #cbd5e1;border-radius:8px;font-size:.9rem}}
.tabs{{display:flex;gap:4px;border-bottom:1px solid #cbd5e1;margin:16px 0}}
.tabs a{{padding:8px 14px;text-decoration:none;color:#475569;border-radius:8px 8px 0 0}}
.tabs a.active{{background:#fff;color:#1e3a8a;font-weight:600;border:1px solid #cbd5e1;border-bottom:none}}
.section{{background:#fff;border-radius:12px;box-shadow:0 1px 4px rgba(0,0,0,.08);padding:16px;margin-bottom:16px}}
.empty{{color:#64748b;font-style:italic;text-align:center}}
.overlay{{position:fixed;inset:0;background:rgba(15,23,42,.5);display:flex;align-items:center;justify-content:center;padding:24px}}
.modal{{background:#fff;border-radius:16px;max-width:640px;width:100%;max-height:90vh;overflow:auto;padding:24px}}
.modal .close{{float:right;text-decoration:none;color:#64748b}}
.error{{background:#fee2e2;color:#991b1b;border-radius:8px;padding:8px 12px}}
footer{{text-align:center;color:#64748b;font-size:.8rem;padding:24px}}
footer a{{color:#475569;margin:0 8px}}
</style>
</head>
<body>
<header>
  <h1>Risk Adjustment Viewer</h1>
  <nav>{patients_link}{analytics_link}</nav>
</header>
<main>
{body}
</main>
<footer>
  Synthetic data for demonstration only.
  {hipaa_link}{accessibility_link}
</footer>
{dialog}
</body>
</html>"##,
        title = escape_html(title),
        patients_link = nav_link(Nav::Patients, "/", "Patients"),
        analytics_link = nav_link(Nav::Analytics, "/analytics", "Analytics"),
        hipaa_link = notice_link("hipaa", "HIPAA Notice"),
        accessibility_link = notice_link("accessibility", "Accessibility"),
    )
}

/// Wrap dialog content in a modal overlay with a close link back to `close_href`.
pub(crate) fn modal(title: &str, content: &str, close_href: &str) -> String {
    format!(
        r#"<div class="overlay" role="dialog" aria-modal="true" aria-labelledby="dialog-title">
<div class="modal">
<a class="close" href="{close_href}" aria-label="Close">&times;</a>
<h2 id="dialog-title">{title}</h2>
{content}
</div>
</div>"#,
        title = escape_html(title),
    )
}

/// The compliance notices reachable from every page footer.
pub(crate) fn notice_dialog(dialog: Option<&Dialog>, close_href: &str) -> String {
    match dialog {
        Some(Dialog::HipaaNotice) => modal(
            "HIPAA Notice",
            "<p>This dashboard displays synthetic records only. No protected health information \
             is stored, transmitted or logged.</p>\
             <p>In a production deployment, access to patient records is limited to the minimum \
             necessary for treatment, payment and operations, and every access is audited.</p>",
            close_href,
        ),
        Some(Dialog::AccessibilityNotice) => modal(
            "Accessibility",
            "<p>Every screen is plain HTML that works with keyboard navigation and screen \
             readers. Status colours are always paired with a text label.</p>\
             <p>Dialogs are links, so the browser back button closes them.</p>",
            close_href,
        ),
        _ => String::new(),
    }
}

fn summary_cards(summary: &Summary) -> String {
    let card = |label: &str, value: String| {
        format!(
            r#"<div class="card"><div class="label">{label}</div><div class="value">{value}</div></div>"#
        )
    };
    format!(
        r#"<div class="cards">{}{}{}{}{}</div>"#,
        card("Total Patients", summary.total_patients.to_string()),
        card("High Risk Patients", summary.high_risk_patients.to_string()),
        card("Missing Codes", summary.total_missing_codes.to_string()),
        card("Avg Risk Score", format_mean(summary.mean_risk_score, 2)),
        card("HEDIS Gaps", summary.total_quality_gaps.to_string()),
    )
}

fn list_row(record: &PatientRecord) -> String {
    let codes: String = record
        .diagnosis_codes
        .iter()
        .take(LIST_CODE_PREVIEW)
        .map(|c| format!(r#"<span class="code">{}</span>"#, escape_html(c)))
        .collect();
    let more = record.diagnosis_codes.len().saturating_sub(LIST_CODE_PREVIEW);
    let more = if more > 0 {
        format!(" +{more}")
    } else {
        String::new()
    };
    let detail_href = format!("/patients/{}", record.id);

    format!(
        r#"<tr>
<td><a href="{detail_href}">{name}</a><br><small>{gender}, {age}</small></td>
<td>{insurance}</td>
<td>{score:.2}</td>
<td>{status}</td>
<td>{codes}{more}</td>
<td>{last_visit}</td>
<td>{missing}</td>
<td>{gaps}</td>
<td><a href="{detail_href}">View</a></td>
</tr>"#,
        name = escape_html(record.name.as_str()),
        gender = record.gender.initial(),
        age = record.age,
        insurance = escape_html(record.insurance_id.as_str()),
        score = record.risk_score,
        status = status_badge(record.status),
        last_visit = record.last_visit,
        missing = record.missing_codes,
        gaps = record.quality_gaps(),
    )
}

/// Render the patient list screen.
pub(crate) fn list_page(records: &[PatientRecord], summary: &Summary, view: &ViewState) -> String {
    let visible = view.visible(records);

    let mut sort_options: String = SortKey::ALL
        .into_iter()
        .map(|key| {
            let selected = if view.sort == Some(key) { " selected" } else { "" };
            format!(
                r#"<option value="{}"{selected}>Sort by {}</option>"#,
                key.as_param(),
                key.label()
            )
        })
        .collect();
    let unsorted = if view.sort.is_none() { " selected" } else { "" };
    sort_options.push_str(&format!(r#"<option value="none"{unsorted}>Input order</option>"#));
    let filter_options: String = StatusFilter::OPTIONS
        .into_iter()
        .map(|(param, label)| {
            let selected = if view.filter.as_param() == param { " selected" } else { "" };
            format!(r#"<option value="{param}"{selected}>{label}</option>"#)
        })
        .collect();

    let rows: String = if visible.is_empty() {
        r#"<tr><td colspan="9" class="empty">No patients match the current search and filter.</td></tr>"#
            .to_string()
    } else {
        visible.iter().map(|r| list_row(r)).collect()
    };

    let body = format!(
        r#"<h2>Patient Risk Overview</h2>
{cards}
<form class="controls" method="get" action="/">
  <input type="search" name="q" value="{search}" placeholder="Search by name or insurance ID" aria-label="Search patients">
  <select name="sort" aria-label="Sort">{sort_options}</select>
  <select name="filter" aria-label="Risk filter">{filter_options}</select>
  <button type="submit">Apply</button>
</form>
<p>Showing {shown} of {total} patients</p>
<table>
<thead><tr><th>Patient</th><th>Insurance ID</th><th>Risk Score</th><th>Status</th><th>Diagnosis Codes</th><th>Last Visit</th><th>Missing Codes</th><th>HEDIS Gaps</th><th></th></tr></thead>
<tbody>
{rows}
</tbody>
</table>"#,
        cards = summary_cards(summary),
        search = escape_html(&view.search),
        shown = visible.len(),
        total = records.len(),
    );

    let params = view.list_params();
    let dialog = notice_dialog(view.dialog.as_ref(), &href("/", &params));
    page("Patients", Nav::Patients, &body, &dialog, "/", &params)
}

fn percent(count: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        (count as f64 / total as f64 * 100.0).round() as usize
    }
}

/// Render the analytics screen.
pub(crate) fn analytics_page(
    analytics: &Analytics,
    catalog: &EducationCatalog,
    view: &ViewState,
) -> String {
    let summary = &analytics.summary;

    let distribution: String = RiskStatus::ALL
        .into_iter()
        .map(|status| {
            let count = summary.distribution.count(status);
            format!(
                "<tr><td>{}</td><td>{}</td><td>{count}</td><td>{}%</td></tr>",
                status_badge(status),
                status.band_label(),
                percent(count, summary.total_patients)
            )
        })
        .collect();

    let compliance: String = if analytics.measure_compliance.is_empty() {
        r#"<tr><td colspan="5" class="empty">No HEDIS data available</td></tr>"#.to_string()
    } else {
        analytics
            .measure_compliance
            .iter()
            .map(|m| {
                let on_target = if m.rate >= COMPLIANCE_TARGET_PERCENT {
                    r#"<span class="badge met">On target</span>"#
                } else {
                    r#"<span class="badge gap">Below target</span>"#
                };
                format!(
                    "<tr><td><span class=\"code\">{code}</span></td><td>{title}</td><td>{met} / {eligible}</td><td>{rate}%</td><td>{on_target}</td></tr>",
                    code = escape_html(&m.code),
                    title = escape_html(catalog.measure_title(&m.code)),
                    met = m.met,
                    eligible = m.eligible,
                    rate = m.rate,
                )
            })
            .collect()
    };

    let missing: String = if analytics.top_missing_hccs.is_empty() {
        r#"<tr><td colspan="3" class="empty">No missing risk codes identified.</td></tr>"#
            .to_string()
    } else {
        analytics
            .top_missing_hccs
            .iter()
            .map(|m| {
                format!(
                    "<tr><td><span class=\"code\">{}</span></td><td>{}</td><td>{}</td></tr>",
                    escape_html(&m.hcc_code),
                    escape_html(&m.condition),
                    m.count
                )
            })
            .collect()
    };

    let body = format!(
        r#"<h2>Population Analytics</h2>
{cards}
<div class="section">
<h3>Risk Distribution</h3>
<table>
<thead><tr><th>Category</th><th>Score Band</th><th>Patients</th><th>Share</th></tr></thead>
<tbody>{distribution}</tbody>
</table>
<p>{mismatches} patient(s) carry a risk status outside the band of their score.</p>
</div>
<div class="section">
<h3>HEDIS Quality Measures</h3>
<p>Average HEDIS score: <strong>{mean_quality}</strong> &middot; Target compliance: {target}%</p>
<table>
<thead><tr><th>Measure</th><th>Title</th><th>Met</th><th>Rate</th><th></th></tr></thead>
<tbody>{compliance}</tbody>
</table>
</div>
<div class="section">
<h3>Most Common Missing HCCs</h3>
<table>
<thead><tr><th>HCC</th><th>Condition</th><th>Patients</th></tr></thead>
<tbody>{missing}</tbody>
</table>
</div>"#,
        cards = summary_cards(summary),
        mismatches = analytics.band_mismatches,
        mean_quality = format_mean(analytics.mean_quality_score, 1),
        target = COMPLIANCE_TARGET_PERCENT,
    );

    let dialog = notice_dialog(view.dialog.as_ref(), "/analytics");
    page("Analytics", Nav::Analytics, &body, &dialog, "/analytics", &[])
}

pub(crate) fn not_found_page(message: &str) -> String {
    let body = format!(
        r#"<div class="section">
<h2>Not Found</h2>
<p>{}</p>
<p><a href="/">Back to patient list</a></p>
</div>"#,
        escape_html(message)
    );
    page("Not Found", Nav::None, &body, "", "/", &[])
}
