//! Patient detail screen: tabs and the dialogs that open over them.

use rav_core::education::{CodeEducation, MeasureEducation};
use rav_core::patient::{MeasureStatus, PatientRecord};
use rav_core::{DetailTab, Dialog, EducationCatalog, Lookup, Note, NoteKind, ViewState};

use crate::render::{escape_html, href, modal, notice_dialog, page, status_badge, Nav};

/// Everything the detail screen needs besides the record itself.
pub(crate) struct DetailContext<'a> {
    pub catalog: &'a EducationCatalog,
    pub notes: &'a [Note],
    pub rejected_note: Option<RejectedNote<'a>>,
}

/// A note submission that failed validation, shown again in the note dialog.
pub(crate) struct RejectedNote<'a> {
    pub error: &'a str,
    pub text: &'a str,
    pub kind: NoteKind,
}

fn tab_of(view: &ViewState) -> DetailTab {
    match view.screen {
        rav_core::Screen::Detail { tab, .. } => tab,
        _ => DetailTab::default(),
    }
}

fn tab_href(record: &PatientRecord, tab: DetailTab) -> String {
    let path = format!("/patients/{}", record.id);
    if tab == DetailTab::default() {
        path
    } else {
        href(&path, &[("tab", tab.as_param())])
    }
}

fn code_link(record: &PatientRecord, tab: DetailTab, code: &str) -> String {
    let path = format!("/patients/{}", record.id);
    format!(
        r#"<a class="code" href="{}">{}</a>"#,
        href(
            &path,
            &[("tab", tab.as_param()), ("dialog", "code"), ("code", code)]
        ),
        escape_html(code)
    )
}

fn measure_link(record: &PatientRecord, code: &str) -> String {
    let path = format!("/patients/{}", record.id);
    format!(
        r#"<a class="code" href="{}">{}</a>"#,
        href(
            &path,
            &[
                ("tab", DetailTab::Hedis.as_param()),
                ("dialog", "measure"),
                ("measure", code),
            ]
        ),
        escape_html(code)
    )
}

fn empty_section(message: &str) -> String {
    format!(r#"<div class="section"><p class="empty">{message}</p></div>"#)
}

fn list_items(items: &[String]) -> String {
    let items: String = items
        .iter()
        .map(|i| format!("<li>{}</li>", escape_html(i)))
        .collect();
    format!("<ul>{items}</ul>")
}

fn overview_tab(record: &PatientRecord) -> String {
    let profile = match &record.detail.profile {
        Some(p) => format!(
            r#"<table>
<tr><th>Date of Birth</th><td>{dob}</td></tr>
<tr><th>Address</th><td>{address}</td></tr>
<tr><th>Phone</th><td>{phone}</td></tr>
<tr><th>Emergency Contact</th><td>{emergency}</td></tr>
<tr><th>Primary Care Provider</th><td>{pcp}</td></tr>
</table>"#,
            dob = p.date_of_birth,
            address = escape_html(&p.address),
            phone = escape_html(&p.phone),
            emergency = escape_html(&p.emergency_contact),
            pcp = escape_html(&p.primary_care_provider),
        ),
        None => r#"<p class="empty">No demographic profile on file.</p>"#.to_string(),
    };

    let conditions: String = record
        .conditions()
        .map(|(code, name)| {
            format!(
                "<li>{} {}</li>",
                code_link(record, DetailTab::Overview, code),
                escape_html(name)
            )
        })
        .collect();

    let contributions = record.detail.risk_contributions();
    let breakdown = if contributions.is_empty() {
        r#"<p class="empty">No risk factor breakdown available.</p>"#.to_string()
    } else {
        let rows: String = contributions
            .iter()
            .map(|(factor, pct)| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{:.3}</td><td>{pct:.1}%</td></tr>",
                    escape_html(&factor.condition),
                    escape_html(&factor.hcc),
                    factor.weight
                )
            })
            .collect();
        format!(
            "<table><thead><tr><th>Condition</th><th>HCC</th><th>Weight</th><th>Contribution</th></tr></thead><tbody>{rows}</tbody></table>"
        )
    };

    format!(
        r#"<div class="section"><h3>Demographics</h3>{profile}</div>
<div class="section"><h3>Active Conditions</h3><ul>{conditions}</ul></div>
<div class="section"><h3>Risk Score Breakdown</h3>{breakdown}</div>"#
    )
}

fn diagnosis_tab(record: &PatientRecord) -> String {
    if record.detail.diagnosis_history.is_empty() {
        let rows: String = record
            .conditions()
            .map(|(code, name)| {
                format!(
                    "<tr><td>{}</td><td>{}</td></tr>",
                    code_link(record, DetailTab::Diagnosis, code),
                    escape_html(name)
                )
            })
            .collect();
        return format!(
            r#"<div class="section"><h3>Current Diagnoses</h3>
<table><thead><tr><th>Code</th><th>Condition</th></tr></thead><tbody>{rows}</tbody></table></div>"#
        );
    }

    let rows: String = record
        .detail
        .diagnosis_history
        .iter()
        .map(|d| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.3}</td></tr>",
                d.date,
                code_link(record, DetailTab::Diagnosis, &d.code),
                escape_html(&d.description),
                d.hcc.as_deref().map_or_else(
                    || "&mdash;".to_string(),
                    |hcc| code_link(record, DetailTab::Diagnosis, hcc)
                ),
                d.weight
            )
        })
        .collect();
    format!(
        r#"<div class="section"><h3>Diagnosis History</h3>
<table><thead><tr><th>Date</th><th>Code</th><th>Description</th><th>HCC</th><th>Weight</th></tr></thead><tbody>{rows}</tbody></table></div>"#
    )
}

fn missing_tab(record: &PatientRecord) -> String {
    let heading = format!(
        "<p>{} code(s) flagged as missing from current-year documentation.</p>",
        record.missing_codes
    );
    if record.detail.missing_risk_codes.is_empty() {
        return format!(
            r#"<div class="section">{heading}<p class="empty">No missing risk code details recorded.</p></div>"#
        );
    }

    let items: String = record
        .detail
        .missing_risk_codes
        .iter()
        .map(|m| {
            format!(
                r#"<div class="section">
<h4>{code} {condition}</h4>
<p>Last reported {last} &middot; {status}</p>
<p><strong>Reasoning:</strong> {reasoning}</p>
<p><strong>Suggested intervention:</strong> {intervention}</p>
</div>"#,
                code = code_link(record, DetailTab::Missing, &m.hcc_code),
                condition = escape_html(&m.condition),
                last = m.last_reported,
                status = escape_html(&m.status),
                reasoning = escape_html(&m.reasoning),
                intervention = escape_html(&m.intervention),
            )
        })
        .collect();
    format!(r#"<div class="section">{heading}</div>{items}"#)
}

fn measure_badge(status: MeasureStatus) -> String {
    let class = match status {
        MeasureStatus::Met => "met",
        MeasureStatus::Gap => "gap",
        MeasureStatus::DueSoon => "due-soon",
    };
    format!(r#"<span class="badge {class}">{}</span>"#, status.as_str())
}

fn hedis_tab(record: &PatientRecord, catalog: &EducationCatalog) -> String {
    let Some(quality) = &record.quality else {
        return empty_section("No HEDIS data available");
    };

    let rows: String = quality
        .measures
        .iter()
        .map(|(code, result)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                measure_link(record, code),
                escape_html(catalog.measure_title(code)),
                measure_badge(result.status),
                result.last_date,
                result.due_date,
                result
                    .value
                    .as_deref()
                    .map_or_else(|| "&mdash;".to_string(), escape_html),
            )
        })
        .collect();

    format!(
        r#"<div class="section">
<p>Overall HEDIS score: <strong>{score}</strong> &middot; Measures met: {met} of {total} &middot; Open gaps: {gaps}</p>
<table><thead><tr><th>Measure</th><th>Title</th><th>Status</th><th>Last Service</th><th>Next Due</th><th>Value</th></tr></thead>
<tbody>{rows}</tbody></table>
</div>"#,
        score = quality.overall_score,
        met = quality.met_count(),
        total = quality.measures.len(),
        gaps = quality.gap_count,
    )
}

fn interventions_tab(record: &PatientRecord, catalog: &EducationCatalog) -> String {
    let mut items: Vec<String> = record
        .detail
        .missing_risk_codes
        .iter()
        .map(|m| {
            format!(
                "<li><strong>{} ({})</strong>: {}</li>",
                escape_html(&m.condition),
                escape_html(&m.hcc_code),
                escape_html(&m.intervention)
            )
        })
        .collect();

    if let Some(quality) = &record.quality {
        for (code, result) in &quality.measures {
            if result.status == MeasureStatus::Met {
                continue;
            }
            let action = catalog
                .measure(code)
                .entry()
                .and_then(|m| m.interventions.first())
                .map_or("Schedule follow-up to close the measure", String::as_str);
            items.push(format!(
                "<li><strong>{} ({})</strong>: {}</li>",
                escape_html(catalog.measure_title(code)),
                measure_badge(result.status),
                escape_html(action)
            ));
        }
    }

    if items.is_empty() {
        return empty_section("No open interventions.");
    }
    format!(
        r#"<div class="section"><h3>Recommended Interventions</h3><ul>{}</ul></div>"#,
        items.concat()
    )
}

fn visits_tab(record: &PatientRecord) -> String {
    if record.detail.recent_visits.is_empty() {
        return empty_section("No recent visits recorded.");
    }
    record
        .detail
        .recent_visits
        .iter()
        .map(|v| {
            format!(
                r#"<div class="section">
<h4>{date} &middot; {kind}</h4>
<p>{provider}</p>
<p><strong>Chief complaint:</strong> {complaint}</p>
<p><strong>Assessment:</strong> {assessment}</p>
<p><strong>Plan:</strong> {plan}</p>
</div>"#,
                date = v.date,
                kind = escape_html(&v.visit_type),
                provider = escape_html(&v.provider),
                complaint = escape_html(&v.chief_complaint),
                assessment = escape_html(&v.assessment),
                plan = escape_html(&v.plan),
            )
        })
        .collect()
}

fn notes_tab(record: &PatientRecord, notes: &[Note]) -> String {
    let add = href(
        &format!("/patients/{}", record.id),
        &[("tab", DetailTab::Notes.as_param()), ("dialog", "note")],
    );
    let items: String = if notes.is_empty() {
        r#"<p class="empty">No notes yet.</p>"#.to_string()
    } else {
        notes
            .iter()
            .map(|n| {
                format!(
                    r#"<div class="section">
<p><strong>{author}</strong> &middot; {timestamp} &middot; <span class="badge moderate">{kind}</span></p>
<p>{text}</p>
</div>"#,
                    author = escape_html(&n.author),
                    timestamp = n.timestamp.format("%Y-%m-%d %H:%M"),
                    kind = n.kind.as_str(),
                    text = escape_html(n.text.as_str()),
                )
            })
            .collect()
    };
    format!(r#"<p><a href="{add}">Add Note</a></p>{items}"#)
}

fn code_dialog(code: &str, lookup: Lookup<'_, CodeEducation>, close: &str) -> String {
    match lookup {
        Lookup::Known { code, entry } => {
            let hcc = entry
                .hcc
                .as_deref()
                .map(|h| format!("<p>Maps to <span class=\"code\">{}</span></p>", escape_html(h)))
                .unwrap_or_default();
            let weight = entry
                .risk_weight
                .map(|w| format!("<p>Risk weight: <strong>{w:.3}</strong></p>"))
                .unwrap_or_default();
            let content = format!(
                r#"<p><span class="code">{code}</span></p>{hcc}
<p>{definition}</p>
<h4>Clinical Criteria</h4>{criteria}
<h4>Documentation Tips</h4>{tips}
<h4>Common Pitfalls</h4>{pitfalls}
{weight}"#,
                code = escape_html(code),
                definition = escape_html(&entry.definition),
                criteria = list_items(&entry.clinical_criteria),
                tips = list_items(&entry.documentation_tips),
                pitfalls = list_items(&entry.common_pitfalls),
            );
            modal(&entry.title, &content, close)
        }
        Lookup::Unknown => modal(
            "Unknown Code",
            &format!(
                "<p>No education content is available for <span class=\"code\">{}</span>.</p>",
                escape_html(code)
            ),
            close,
        ),
    }
}

fn measure_dialog(code: &str, lookup: Lookup<'_, MeasureEducation>, close: &str) -> String {
    match lookup {
        Lookup::Known { code, entry } => {
            let content = format!(
                r#"<p><span class="code">{code}</span></p>
<p>{description}</p>
<p><strong>Specification:</strong> {specification}</p>
<p><strong>Target:</strong> {target}</p>
<p><strong>Clinical rationale:</strong> {rationale}</p>
<h4>Interventions</h4>{interventions}"#,
                code = escape_html(code),
                description = escape_html(&entry.description),
                specification = escape_html(&entry.specification),
                target = escape_html(&entry.target),
                rationale = escape_html(&entry.clinical_rationale),
                interventions = list_items(&entry.interventions),
            );
            modal(&entry.title, &content, close)
        }
        Lookup::Unknown => modal(
            rav_core::education::UNKNOWN_MEASURE_TITLE,
            &format!(
                "<p>No education content is available for measure <span class=\"code\">{}</span>.</p>",
                escape_html(code)
            ),
            close,
        ),
    }
}

fn note_dialog(
    record: &PatientRecord,
    rejected: Option<&RejectedNote<'_>>,
    close: &str,
) -> String {
    let chosen = rejected.map(|r| r.kind).unwrap_or_default();
    let kinds: String = NoteKind::ALL
        .into_iter()
        .map(|k| {
            let selected = if k == chosen { " selected" } else { "" };
            format!(r#"<option value="{0}"{selected}>{0}</option>"#, k.as_str())
        })
        .collect();
    let error = rejected
        .map(|r| format!(r#"<p class="error" role="alert">{}</p>"#, escape_html(r.error)))
        .unwrap_or_default();
    let draft = rejected.map(|r| escape_html(r.text)).unwrap_or_default();
    let content = format!(
        r#"{error}<form method="post" action="/patients/{id}/notes">
<p><label>Type <select name="kind">{kinds}</select></label></p>
<p><label>Note<br><textarea name="text" rows="6" cols="60" required>{draft}</textarea></label></p>
<p><button type="submit">Save Note</button> <a href="{close}">Cancel</a></p>
</form>"#,
        id = record.id,
    );
    modal("Add Note", &content, close)
}

/// Render the patient detail screen for `view`.
pub(crate) fn detail_page(record: &PatientRecord, view: &ViewState, ctx: &DetailContext<'_>) -> String {
    let tab = tab_of(view);
    let close = tab_href(record, tab);

    let tabs: String = DetailTab::ALL
        .into_iter()
        .map(|t| {
            let class = if t == tab { r#" class="active""# } else { "" };
            format!(r#"<a href="{}"{class}>{}</a>"#, tab_href(record, t), t.label())
        })
        .collect();

    let content = match tab {
        DetailTab::Overview => overview_tab(record),
        DetailTab::Diagnosis => diagnosis_tab(record),
        DetailTab::Missing => missing_tab(record),
        DetailTab::Hedis => hedis_tab(record, ctx.catalog),
        DetailTab::Interventions => interventions_tab(record, ctx.catalog),
        DetailTab::Visits => visits_tab(record),
        DetailTab::Notes => notes_tab(record, ctx.notes),
    };

    let body = format!(
        r#"<p><a href="/">&larr; Back to patient list</a></p>
<div class="section">
<h2>{name}</h2>
<p>{gender}, {age} &middot; Insurance ID {insurance} &middot; Last visit {last_visit}</p>
<p>Risk score <strong>{score:.2}</strong> {status} &middot; {missing} missing code(s)</p>
</div>
<nav class="tabs" aria-label="Patient sections">{tabs}</nav>
{content}"#,
        name = escape_html(record.name.as_str()),
        gender = record.gender.as_str(),
        age = record.age,
        insurance = escape_html(record.insurance_id.as_str()),
        last_visit = record.last_visit,
        score = record.risk_score,
        status = status_badge(record.status),
        missing = record.missing_codes,
    );

    let dialog = match &view.dialog {
        Some(Dialog::CodeEducation(code)) => code_dialog(code, ctx.catalog.code(code), &close),
        Some(Dialog::MeasureEducation(code)) => {
            measure_dialog(code, ctx.catalog.measure(code), &close)
        }
        Some(Dialog::NoteEntry) => note_dialog(record, ctx.rejected_note.as_ref(), &close),
        other => notice_dialog(other.as_ref(), &close),
    };

    let path = format!("/patients/{}", record.id);
    let tab_param = [("tab", tab.as_param())];
    page(record.name.as_str(), Nav::None, &body, &dialog, &path, &tab_param)
}
