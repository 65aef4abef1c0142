//! HTML report rendering for run history.

use chrono::Utc;

use crate::history::RunRecord;

/// Score above which a run is presented as passing. A display threshold
/// only, not an engine invariant.
const PASS_THRESHOLD: u8 = 70;

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 20px; background-color: #f4f4f4; color: #333; }
.container { max-width: 1200px; margin: auto; background: #fff; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
h1, h2 { color: #0056b3; }
.run { border: 1px solid #ddd; border-radius: 5px; padding: 15px; margin-bottom: 15px; background-color: #f9f9f9; }
.run.violated { border-left: 5px solid #dc3545; }
.run.compliant { border-left: 5px solid #28a745; }
.run h3 { margin-top: 0; color: #007bff; }
.violations { list-style-type: none; padding: 0; }
.violations li { background-color: #ffebe6; border-left: 3px solid #dc3545; margin-bottom: 5px; padding: 8px; border-radius: 3px; }
.metadata { font-size: 0.9em; color: #666; }
.score { font-weight: bold; }
.score.pass { color: #28a745; }
.score.fail { color: #dc3545; }
"#;

/// Render the full run history as a self-contained HTML document.
///
/// All record-derived text is escaped; generated output in particular is
/// untrusted.
pub fn render_report(records: &[RunRecord]) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str("<title>Covenant Run Report</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n"));
    html.push_str("</head>\n<body>\n<div class=\"container\">\n");
    html.push_str("<h1>Covenant Run Report</h1>\n");
    html.push_str(&format!(
        "<p class=\"metadata\">Generated on: {}</p>\n",
        Utc::now().to_rfc3339()
    ));
    html.push_str(&format!("<h2>Total runs: {}</h2>\n", records.len()));

    if records.is_empty() {
        html.push_str("<p>No runs recorded.</p>\n");
    }

    for record in records {
        let compliance_class = if record.violations.is_empty() {
            "compliant"
        } else {
            "violated"
        };
        let score_class = if record.score > PASS_THRESHOLD {
            "pass"
        } else {
            "fail"
        };

        html.push_str(&format!("<div class=\"run {compliance_class}\">\n"));
        html.push_str(&format!("<h3>Run {}</h3>\n", record.uuid));
        html.push_str(&format!(
            "<p class=\"metadata\">Timestamp: {}</p>\n",
            record.timestamp.to_rfc3339()
        ));
        html.push_str(&format!(
            "<p><strong>Role:</strong> {}</p>\n",
            escape_html(&record.role)
        ));
        html.push_str(&format!(
            "<p><strong>Model:</strong> {}</p>\n",
            escape_html(&record.llm_model)
        ));
        html.push_str(&format!(
            "<p><strong>Input:</strong> {}</p>\n",
            escape_html(&record.input)
        ));
        html.push_str(&format!(
            "<p><strong>Output:</strong> {}</p>\n",
            escape_html(&record.output)
        ));
        html.push_str(&format!(
            "<p><strong>Score:</strong> <span class=\"score {score_class}\">{} / 100</span></p>\n",
            record.score
        ));

        if record.violations.is_empty() {
            html.push_str("<p><strong>Violations:</strong> None</p>\n");
        } else {
            html.push_str("<p><strong>Violations:</strong></p>\n<ul class=\"violations\">\n");
            for violation in &record.violations {
                html.push_str(&format!(
                    "<li>Rule {}: {} triggered by \"{}\" (severity: {})</li>\n",
                    escape_html(&violation.rule_id),
                    violation.kind,
                    escape_html(&violation.trigger),
                    violation.severity,
                ));
            }
            html.push_str("</ul>\n");
        }

        html.push_str("</div>\n");
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
