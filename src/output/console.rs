use crate::rules::{CheckResult, Severity, Status};

/// Render results as plain console output, most severe first, then by
/// location.
pub fn render(results: &[CheckResult]) -> String {
    let mut output = String::new();

    let failed = results.iter().filter(|r| r.status == Status::Failed).count();
    if failed == 0 {
        output.push_str("\n  No problems detected.\n\n");
        if results.is_empty() {
            return output;
        }
    } else {
        output.push_str(&format!("\n  {} problem(s) detected:\n\n", failed));
    }

    let mut sorted: Vec<&CheckResult> = results.iter().collect();
    sorted.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.range.file.cmp(&b.range.file))
            .then_with(|| a.range.start_line.cmp(&b.range.start_line))
    });

    for result in &sorted {
        let severity_tag = match result.severity {
            Severity::Error => "[ERROR]  ",
            Severity::Warning => "[WARNING]",
            Severity::Info => "[INFO]   ",
        };
        let status_tag = match result.status {
            Status::Failed => "",
            Status::Passed => " (passed)",
            Status::Ignored => " (ignored)",
        };

        output.push_str(&format!(
            "  {} {}{} {}\n",
            severity_tag, result.rule_id, status_tag, result.description
        ));
        output.push_str(&format!("           at {}\n", result.range));
        if let Some(annotation) = &result.annotation {
            output.push_str(&format!("           value: {}\n", annotation));
        }
        if !result.resolution.is_empty() {
            output.push_str(&format!("           fix: {}\n", result.resolution));
        }
        output.push('\n');
    }

    output
}
