//! Minimal HTML form for checking a claim from a browser.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use super::v1::response::ApiResponse;
use super::AppState;
use crate::models::{EvidenceStatus, PublishStatus, ValidationReport};
use crate::services::ValidationOptions;

#[derive(Debug, Deserialize)]
pub struct ClaimForm {
    pub claim: String,
    #[serde(default)]
    pub max_results: Option<String>,
    /// Checkbox value, `"on"` when ticked.
    #[serde(default)]
    pub publish: Option<String>,
    #[serde(default)]
    pub human_only: Option<String>,
    /// Comma-separated publication types.
    #[serde(default)]
    pub publication_types: Option<String>,
}

pub async fn claim_page() -> Html<String> {
    Html(page("", ""))
}

pub async fn submit_claim(State(state): State<AppState>, Form(form): Form<ClaimForm>) -> Response {
    let claim = form.claim.trim();
    if claim.is_empty() || claim.chars().count() > 2000 {
        let body = page(claim, &error_block("Enter a claim of at most 2000 characters."));
        return (StatusCode::BAD_REQUEST, Html(body)).into_response();
    }

    let options = ValidationOptions {
        max_results: form
            .max_results
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .map(|n: usize| n.min(200)),
        publish: Some(form.publish.is_some()),
        human_only: Some(form.human_only.is_some()),
        publication_types: form.publication_types.as_deref().map(split_publication_types),
    };

    match state.validation.validate(claim, &options).await {
        Ok(report) => Html(page(claim, &report_block(&report))).into_response(),
        Err(e) => {
            let resp = ApiResponse::<()>::from(e);
            let status = resp.status();
            let message = resp
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "Validation failed".to_string());
            (status, Html(page(claim, &error_block(&message)))).into_response()
        }
    }
}

fn page(claim: &str, result: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Nutricheck</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
textarea {{ width: 100%; }}
.supported {{ color: #1b7f3b; }} .refuted {{ color: #b3261e; }} .inconclusive {{ color: #6b6b6b; }}
.error {{ color: #b3261e; }}
</style>
</head>
<body>
<h1>Nutricheck</h1>
<form method="post" action="/">
<label for="claim">Health claim</label>
<textarea id="claim" name="claim" rows="3" maxlength="2000" required>{claim}</textarea>
<label>Max articles <input type="number" name="max_results" min="0" max="200" value="20"></label>
<label><input type="checkbox" name="human_only" checked> Humans only</label>
<label>Publication types <input type="text" name="publication_types" list="publication-types" placeholder="e.g. Meta-Analysis, Randomized Controlled Trial"></label>
<datalist id="publication-types">
<option value="Clinical Trial"><option value="Review"><option value="Meta-Analysis">
<option value="Randomized Controlled Trial"><option value="Case Reports">
</datalist>
<label><input type="checkbox" name="publish"> Publish verdict</label>
<button type="submit">Check</button>
</form>
{result}
</body>
</html>"#,
        claim = escape_html(claim),
    )
}

fn split_publication_types(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .take(10)
        .map(str::to_string)
        .collect()
}

fn error_block(message: &str) -> String {
    format!(r#"<p class="error">{}</p>"#, escape_html(message))
}

fn report_block(report: &ValidationReport) -> String {
    let verdict = &report.verdict;
    let mut html = format!(
        r#"<h2 class="{label}">{label}</h2>
<p>Subject: <b>{subject}</b>. Effect: <b>{effect}</b>.</p>
<p>Confidence {confidence:.2}, truth score {truth:+.2}. {supporting} supporting, {refuting} refuting, {neutral} neutral.</p>
"#,
        label = verdict.label,
        subject = escape_html(&report.extracted.subject),
        effect = escape_html(&report.extracted.effect),
        confidence = verdict.confidence,
        truth = verdict.truth_score,
        supporting = verdict.supporting,
        refuting = verdict.refuting,
        neutral = verdict.neutral,
    );

    if let EvidenceStatus::Unavailable { reason } = &report.evidence_status {
        html.push_str(&format!(
            "<p class=\"error\">Evidence could not be checked: {}</p>\n",
            escape_html(reason)
        ));
    }

    if !report.terms.is_empty() {
        let terms: Vec<String> = report.terms.iter().map(|t| escape_html(t)).collect();
        html.push_str(&format!("<p>Search terms: {}</p>\n", terms.join(", ")));
    }

    if !verdict.cited_evidence.is_empty() {
        html.push_str("<ol>\n");
        for record in &verdict.cited_evidence {
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a> <i>{}</i> {}</li>\n",
                escape_html(&record.url),
                escape_html(&record.title),
                escape_html(&record.journal),
                escape_html(&record.publication_date),
            ));
        }
        html.push_str("</ol>\n");
    }

    match &report.publish_status {
        PublishStatus::Published { asset_id } => {
            html.push_str(&format!("<p>Published as {}</p>\n", escape_html(asset_id)));
        }
        PublishStatus::Failed { error } => {
            html.push_str(&format!(
                "<p class=\"error\">Publishing failed: {}</p>\n",
                escape_html(error)
            ));
        }
        PublishStatus::Skipped { reason } => {
            html.push_str(&format!("<p>Publishing skipped: {}</p>\n", escape_html(reason)));
        }
        PublishStatus::NotConfigured => html.push_str("<p>No ledger is configured.</p>\n"),
        PublishStatus::NotRequested => {}
    }

    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
