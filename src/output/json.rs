use serde::Serialize;

use crate::error::{GuardError, Result};
use crate::rules::CheckResult;

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [CheckResult],
}

/// Render results as a JSON report.
pub fn render(results: &[CheckResult]) -> Result<String> {
    let report = JsonReport { results };
    serde_json::to_string_pretty(&report).map_err(|e| GuardError::Output(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Range;
    use crate::rules::{CheckResult, Severity, Status};

    #[test]
    fn report_carries_rule_identity_and_location() {
        let mut result = CheckResult::new("Resource 'resource.aws_s3_bucket.assets' has an ACL which allows public access.")
            .with_range(Range::new("main.tf", 3, 3))
            .with_severity(Severity::Error)
            .with_status(Status::Failed);
        result.rule_id = "AWS001".to_string();

        let rendered = render(&[result]).unwrap();
        assert!(rendered.contains("\"AWS001\""));
        assert!(rendered.contains("\"location\""));
        assert!(rendered.contains("main.tf"));
        assert!(rendered.contains("\"severity\": \"error\""));
    }
}
