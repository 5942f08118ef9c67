use crate::core::Pipeline;
use crate::domain::model::AuditSummary;
use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRun {
    pub summary: AuditSummary,
    pub outputs: Vec<String>,
}

pub struct AuditEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> AuditEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<AuditRun> {
        tracing::info!("Starting skill audit...");

        let rows = self.pipeline.extract().await?;
        tracing::info!("Read {} rows", rows.len());

        let report = self.pipeline.transform(rows).await?;
        let summary = report.summary;
        tracing::info!(
            compliant = summary.compliant,
            violations = summary.violations,
            invalid = summary.invalid,
            "Audited {} rows against the '{}' policy",
            summary.total,
            report.policy
        );

        let outputs = self.pipeline.load(report).await?;
        for path in &outputs {
            tracing::info!("Report saved to: {}", path);
        }

        Ok(AuditRun { summary, outputs })
    }
}
