//! Machine-readable report writing and HTML rendering.
//!
//! The batch pipeline emits an intermediate machine-readable report (MRR, an
//! XML dialect) plus a run summary; [`HtmlRenderer`] transforms those into
//! the human-readable payload served to `text/html` clients. The same XML
//! escaping also backs the structured-XML content negotiation for the direct
//! result path ([`result_to_xml`]).
//!
//! The renderer only consumes the MRR dialect this crate writes — it scans
//! for the handful of elements it needs rather than carrying a full XML
//! parser. Malformed intermediate input (wrong root, bad UTF-8) fails with
//! [`ValidateError::RenderTransform`].

use crate::engine::{AssertionStatus, ValidationResult};
use crate::error::ValidateError;
use crate::pipeline::batch::BatchSummary;
use std::io::{self, Write};

/// Escape a string for use in XML text or attribute content.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// ── MRR writer ───────────────────────────────────────────────────────────

/// Streaming writer for the machine-readable report.
///
/// Writes the prolog on construction, one `<job>` element per processed
/// item, and the batch summary on [`finish`](MrrWriter::finish). All write
/// failures surface as `io::Error` so the pipeline can map them to its sink
/// error.
pub struct MrrWriter<W: Write> {
    sink: W,
}

impl<W: Write> MrrWriter<W> {
    pub fn new(mut sink: W) -> io::Result<Self> {
        writeln!(sink, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
        writeln!(sink, "<report>")?;
        writeln!(sink, "  <jobs>")?;
        Ok(Self { sink })
    }

    /// Record a completed validation job.
    pub fn job(&mut self, item_name: &str, size_bytes: u64, result: &ValidationResult) -> io::Result<()> {
        writeln!(self.sink, "    <job>")?;
        writeln!(
            self.sink,
            r#"      <item size="{}"><name>{}</name></item>"#,
            size_bytes,
            xml_escape(item_name)
        )?;
        writeln!(
            self.sink,
            r#"      <validationReport profileName="{}" isCompliant="{}" statement="{}">"#,
            xml_escape(&result.profile),
            result.compliant,
            xml_escape(&result.statement)
        )?;
        writeln!(
            self.sink,
            r#"        <details totalChecks="{}" passedChecks="{}" failedChecks="{}">"#,
            result.total_checks, result.passed_checks, result.failed_checks
        )?;
        for assertion in &result.assertions {
            let status = match assertion.status {
                AssertionStatus::Passed => "passed",
                AssertionStatus::Failed => "failed",
            };
            writeln!(
                self.sink,
                r#"          <rule specification="{}" clause="{}" testNumber="{}" status="{}"><description>{}</description></rule>"#,
                xml_escape(&assertion.rule.specification),
                xml_escape(&assertion.rule.clause),
                assertion.rule.test_number,
                status,
                xml_escape(&assertion.message)
            )?;
        }
        writeln!(self.sink, "        </details>")?;
        writeln!(self.sink, "      </validationReport>")?;
        writeln!(self.sink, "    </job>")?;
        Ok(())
    }

    /// Record an item whose parse failed before any rules could run.
    pub fn failed_job(&mut self, item_name: &str, detail: &str) -> io::Result<()> {
        writeln!(self.sink, "    <job>")?;
        writeln!(
            self.sink,
            r#"      <item><name>{}</name></item>"#,
            xml_escape(item_name)
        )?;
        writeln!(
            self.sink,
            r#"      <taskException>{}</taskException>"#,
            xml_escape(detail)
        )?;
        writeln!(self.sink, "    </job>")?;
        Ok(())
    }

    /// Close the report, appending the batch summary when one exists.
    pub fn finish(mut self, summary: Option<&BatchSummary>) -> io::Result<W> {
        writeln!(self.sink, "  </jobs>")?;
        if let Some(s) = summary {
            writeln!(
                self.sink,
                r#"  <batchSummary totalJobs="{}" failedToParse="{}" valid="{}" inValid="{}" durationMs="{}"/>"#,
                s.total_jobs, s.failed_jobs, s.valid, s.invalid, s.duration_ms
            )?;
        }
        writeln!(self.sink, "</report>")?;
        Ok(self.sink)
    }
}

// ── Structured-result XML (direct path content negotiation) ──────────────

/// Serialize a [`ValidationResult`] as a standalone XML document.
pub fn result_to_xml(result: &ValidationResult) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    out.push('\n');
    out.push_str(&format!(
        r#"<validationResult profile="{}" compliant="{}" totalChecks="{}" passedChecks="{}" failedChecks="{}">"#,
        xml_escape(&result.profile),
        result.compliant,
        result.total_checks,
        result.passed_checks,
        result.failed_checks
    ));
    out.push('\n');
    out.push_str(&format!(
        "  <statement>{}</statement>\n",
        xml_escape(&result.statement)
    ));
    for assertion in &result.assertions {
        let status = match assertion.status {
            AssertionStatus::Passed => "passed",
            AssertionStatus::Failed => "failed",
        };
        out.push_str(&format!(
            r#"  <assertion specification="{}" clause="{}" testNumber="{}" status="{}">{}</assertion>"#,
            xml_escape(&assertion.rule.specification),
            xml_escape(&assertion.rule.clause),
            assertion.rule.test_number,
            status,
            xml_escape(&assertion.message)
        ));
        out.push('\n');
    }
    out.push_str("</validationResult>\n");
    out
}

// ── HTML renderer ────────────────────────────────────────────────────────

/// Transforms the MRR report plus run summary into final rendered bytes.
pub trait ReportRenderer: Send + Sync {
    /// `wiki_base` is prepended to rule clauses to build documentation
    /// links; `verbose` includes passed rules in the output.
    fn render(
        &self,
        mrr: &[u8],
        summary: Option<&BatchSummary>,
        wiki_base: &str,
        verbose: bool,
    ) -> Result<Vec<u8>, ValidateError>;
}

/// Default renderer producing a self-contained HTML page.
pub struct HtmlRenderer;

impl ReportRenderer for HtmlRenderer {
    fn render(
        &self,
        mrr: &[u8],
        summary: Option<&BatchSummary>,
        wiki_base: &str,
        verbose: bool,
    ) -> Result<Vec<u8>, ValidateError> {
        let doc = std::str::from_utf8(mrr).map_err(|e| ValidateError::RenderTransform {
            detail: format!("report is not valid UTF-8: {e}"),
        })?;
        if !doc.contains("<report") {
            return Err(ValidateError::RenderTransform {
                detail: "missing <report> root element".into(),
            });
        }

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>Validation Report</title>\n");
        html.push_str(
            "<style>body{font-family:sans-serif;margin:2em}table{border-collapse:collapse}\
             td,th{border:1px solid #ccc;padding:4px 10px}.pass{color:#070}.fail{color:#a00}</style>\n",
        );
        html.push_str("</head>\n<body>\n<h1>Validation Report</h1>\n");

        for report_tag in tags(doc, "<validationReport") {
            let profile = attr(report_tag, "profileName").unwrap_or("unknown");
            let compliant = attr(report_tag, "isCompliant") == Some("true");
            let statement = attr(report_tag, "statement").unwrap_or("");
            html.push_str(&format!(
                "<h2>{} — <span class=\"{}\">{}</span></h2>\n<p>{}</p>\n",
                profile,
                if compliant { "pass" } else { "fail" },
                if compliant { "compliant" } else { "not compliant" },
                statement
            ));
        }

        for details_tag in tags(doc, "<details") {
            html.push_str("<table>\n<tr><th>total checks</th><th>passed</th><th>failed</th></tr>\n");
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n</table>\n",
                attr(details_tag, "totalChecks").unwrap_or("0"),
                attr(details_tag, "passedChecks").unwrap_or("0"),
                attr(details_tag, "failedChecks").unwrap_or("0")
            ));
        }

        let rules: Vec<&str> = elements(doc, "rule")
            .into_iter()
            .filter(|e| verbose || attr(e, "status") == Some("failed"))
            .collect();
        if !rules.is_empty() {
            html.push_str("<h3>Rules</h3>\n<ul>\n");
            for rule in rules {
                let clause = attr(rule, "clause").unwrap_or("?");
                let test = attr(rule, "testNumber").unwrap_or("?");
                let status = attr(rule, "status").unwrap_or("failed");
                let description = element_text(rule, "description").unwrap_or_default();
                html.push_str(&format!(
                    "<li class=\"{status}\"><a href=\"{wiki_base}{clause}\">{clause}-{test}</a> {description}</li>\n",
                ));
            }
            html.push_str("</ul>\n");
        }

        for exception in elements(doc, "taskException") {
            let detail = element_text_direct(exception);
            html.push_str(&format!(
                "<p class=\"fail\">Processing failed: {detail}</p>\n"
            ));
        }

        if let Some(s) = summary {
            html.push_str(&format!(
                "<p>Batch: {} job(s), {} valid, {} invalid, {} failed to parse, {} ms.</p>\n",
                s.total_jobs, s.valid, s.invalid, s.failed_jobs, s.duration_ms
            ));
        } else {
            html.push_str("<p class=\"fail\">No report produced: the pipeline run did not complete.</p>\n");
        }

        html.push_str(&format!(
            "<p><a href=\"{wiki_base}\">Validation profile documentation</a></p>\n"
        ));
        html.push_str("</body>\n</html>\n");
        Ok(html.into_bytes())
    }
}

// ── Minimal tag scanning over our own MRR dialect ────────────────────────

/// All opening tags starting with `prefix`, as `"<name attr=..>"` slices.
fn tags<'a>(doc: &'a str, prefix: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut rest = doc;
    while let Some(start) = rest.find(prefix) {
        let from = &rest[start..];
        match from.find('>') {
            Some(end) => {
                out.push(&from[..=end]);
                rest = &from[end + 1..];
            }
            None => break,
        }
    }
    out
}

/// Full `<name ...>...</name>` element slices.
fn elements<'a>(doc: &'a str, name: &str) -> Vec<&'a str> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut out = Vec::new();
    let mut rest = doc;
    while let Some(start) = rest.find(&open) {
        let from = &rest[start..];
        match from.find(&close) {
            Some(end) => {
                out.push(&from[..end + close.len()]);
                rest = &from[end + close.len()..];
            }
            None => break,
        }
    }
    out
}

/// Value of `name="..."` inside an opening tag.
fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let pat = format!("{name}=\"");
    let start = tag.find(&pat)? + pat.len();
    let end = tag[start..].find('"')? + start;
    Some(&tag[start..end])
}

/// Text content of a child element.
fn element_text(parent: &str, child: &str) -> Option<String> {
    elements(parent, child)
        .first()
        .map(|e| element_text_direct(e))
}

/// Text between the first `>` and the last `<` of an element slice.
fn element_text_direct(element: &str) -> String {
    match (element.find('>'), element.rfind('<')) {
        (Some(a), Some(b)) if b > a => element[a + 1..b].to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RuleId, TestAssertion};
    use crate::pipeline::batch::BatchSummary;

    fn failing_result() -> ValidationResult {
        ValidationResult {
            profile: "PDF/A-1B".into(),
            compliant: false,
            statement: "PDF file is not compliant with Validation Profile requirements.".into(),
            total_checks: 4,
            passed_checks: 3,
            failed_checks: 1,
            assertions: vec![TestAssertion {
                rule: RuleId {
                    specification: "ISO 19005-1:2005".into(),
                    clause: "6.1.3".into(),
                    test_number: 1,
                },
                status: AssertionStatus::Failed,
                message: "File trailer terminates with the %%EOF marker".into(),
            }],
        }
    }

    fn summary() -> BatchSummary {
        BatchSummary {
            total_jobs: 1,
            failed_jobs: 0,
            valid: 0,
            invalid: 1,
            duration_ms: 3,
        }
    }

    #[test]
    fn xml_escape_covers_all_specials() {
        assert_eq!(xml_escape(r#"a&b<c>d"e'f"#), "a&amp;b&lt;c&gt;d&quot;e&apos;f");
    }

    #[test]
    fn mrr_report_roundtrips_through_writer() {
        let mut writer = MrrWriter::new(Vec::new()).unwrap();
        writer.job("/tmp/staged", 94, &failing_result()).unwrap();
        let s = summary();
        let bytes = writer.finish(Some(&s)).unwrap();
        let doc = String::from_utf8(bytes).unwrap();

        assert!(doc.starts_with("<?xml"));
        assert!(doc.contains(r#"profileName="PDF/A-1B""#));
        assert!(doc.contains(r#"isCompliant="false""#));
        assert!(doc.contains(r#"clause="6.1.3""#));
        assert!(doc.contains(r#"totalJobs="1""#));
        assert!(doc.ends_with("</report>\n"));
    }

    #[test]
    fn html_render_links_rules_against_the_wiki_base() {
        let mut writer = MrrWriter::new(Vec::new()).unwrap();
        writer.job("/tmp/staged", 94, &failing_result()).unwrap();
        let s = summary();
        let mrr = writer.finish(Some(&s)).unwrap();

        let html = HtmlRenderer
            .render(&mrr, Some(&s), "https://wiki.example/rules/", false)
            .unwrap();
        let html = String::from_utf8(html).unwrap();

        assert!(html.contains("https://wiki.example/rules/6.1.3"));
        assert!(html.contains("not compliant"));
        assert!(html.contains("1 job(s)"));
    }

    #[test]
    fn html_render_without_summary_flags_missing_report() {
        let mut writer = MrrWriter::new(Vec::new()).unwrap();
        writer.failed_job("/tmp/staged", "expected %PDF- header").unwrap();
        let mrr = writer.finish(None).unwrap();

        let html = HtmlRenderer
            .render(&mrr, None, "https://wiki.example/", false)
            .unwrap();
        let html = String::from_utf8(html).unwrap();
        assert!(html.contains("No report produced"));
        assert!(html.contains("expected %PDF- header"));
    }

    #[test]
    fn render_rejects_non_report_input() {
        let err = HtmlRenderer.render(b"<html>nope</html>", None, "https://w/", false);
        assert!(matches!(err, Err(ValidateError::RenderTransform { .. })));
    }

    #[test]
    fn render_rejects_invalid_utf8() {
        let err = HtmlRenderer.render(&[0xff, 0xfe, 0x00], None, "https://w/", false);
        assert!(matches!(err, Err(ValidateError::RenderTransform { .. })));
    }

    #[test]
    fn result_to_xml_is_escaped_and_complete() {
        let xml = result_to_xml(&failing_result());
        assert!(xml.contains(r#"profile="PDF/A-1B""#));
        assert!(xml.contains(r#"clause="6.1.3""#));
        assert!(xml.contains("<statement>"));
    }
}
