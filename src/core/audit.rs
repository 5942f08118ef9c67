use crate::core::eligibility::evaluate_with;
use crate::core::{ConfigProvider, EligibilityPolicy, Pipeline, Storage};
use crate::domain::model::{AuditEntry, AuditOutcome, AuditReport, AuditSummary, SheetRow, SubSkillRecord};
use crate::utils::error::{EligibilityError, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

/// Audits an exported sub-skill sheet against an eligibility policy.
pub struct AuditPipeline<S: Storage, C: ConfigProvider, P: EligibilityPolicy> {
    storage: S,
    config: C,
    policy: P,
    output_path: String,
}

impl<S: Storage, C: ConfigProvider, P: EligibilityPolicy> AuditPipeline<S, C, P> {
    pub fn new(storage: S, config: C, policy: P, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            policy,
            output_path: output_path.into(),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    fn audit_record(&self, record: &SubSkillRecord) -> Result<AuditOutcome> {
        let experience = record.experience()?;
        let rating = record.rating()?;
        let result = evaluate_with(&self.policy, experience, rating);

        Ok(match result.message {
            None => AuditOutcome::Compliant {
                max_allowed: result.max_allowed,
            },
            Some(message) => AuditOutcome::Violation {
                max_allowed: result.max_allowed,
                clamped_proficiency: result.clamped_proficiency,
                message,
            },
        })
    }

    fn output_file(&self, filename: &str) -> String {
        Path::new(&self.output_path)
            .join(filename)
            .to_string_lossy()
            .into_owned()
    }
}

fn record_line(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    line: u64,
    employee_id: &'a str,
    employee_name: &'a str,
    skill_name: &'a str,
    sub_skill_name: &'a str,
    experience_months: Option<i64>,
    proficiency: Option<i64>,
    status: &'static str,
    max_allowed: Option<u8>,
    clamped_proficiency: Option<u8>,
    message: &'a str,
}

impl<'a> From<&'a AuditEntry> for ReportRow<'a> {
    fn from(entry: &'a AuditEntry) -> Self {
        let record = entry.record.as_ref();
        let (max_allowed, clamped, message) = match &entry.outcome {
            AuditOutcome::Compliant { max_allowed } => (Some(max_allowed.stars()), None, ""),
            AuditOutcome::Violation {
                max_allowed,
                clamped_proficiency,
                message,
            } => (
                Some(max_allowed.stars()),
                Some(clamped_proficiency.stars()),
                message.as_str(),
            ),
            AuditOutcome::Invalid { reason } => (None, None, reason.as_str()),
        };

        Self {
            line: entry.line,
            employee_id: record.map(|r| r.employee_id.as_str()).unwrap_or(""),
            employee_name: record.and_then(|r| r.employee_name.as_deref()).unwrap_or(""),
            skill_name: record.and_then(|r| r.skill_name.as_deref()).unwrap_or(""),
            sub_skill_name: record.map(|r| r.sub_skill_name.as_str()).unwrap_or(""),
            experience_months: record.map(|r| r.experience_months),
            proficiency: record.map(|r| r.proficiency),
            status: entry.outcome.status(),
            max_allowed,
            clamped_proficiency: clamped,
            message,
        }
    }
}

pub fn render_csv_report(report: &AuditReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for entry in &report.entries {
        writer.serialize(ReportRow::from(entry))?;
    }
    writer
        .into_inner()
        .map_err(|e| EligibilityError::ProcessingError {
            message: format!("failed to flush CSV report: {}", e),
        })
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, P: EligibilityPolicy> Pipeline for AuditPipeline<S, C, P> {
    async fn extract(&self) -> Result<Vec<SheetRow>> {
        let input = self.config.input_path();
        tracing::debug!("Reading skill sheet from: {}", input);
        let data = self.storage.read_file(input).await?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data.as_slice());

        let headers = reader.headers()?.clone();
        let mut record = csv::StringRecord::new();
        let mut rows = Vec::new();

        // `line` is the physical line the record starts on; blank lines are skipped
        // by the reader but still counted.
        loop {
            let parsed = match reader.read_record(&mut record) {
                Ok(false) => break,
                Ok(true) => record
                    .deserialize::<SubSkillRecord>(Some(&headers))
                    .map_err(|e| (record_line(&record), e)),
                Err(e) => Err((e.position().map(|p| p.line()).unwrap_or(0), e)),
            };

            match parsed {
                Ok(sub_skill) => rows.push(SheetRow {
                    line: record_line(&record),
                    parsed: Ok(sub_skill),
                }),
                Err((_, e)) if self.config.fail_on_invalid_row() => return Err(e.into()),
                Err((line, e)) => {
                    tracing::warn!("Skipping unreadable row {}: {}", line, e);
                    rows.push(SheetRow {
                        line,
                        parsed: Err(e.to_string()),
                    });
                }
            }
        }

        Ok(rows)
    }

    async fn transform(&self, rows: Vec<SheetRow>) -> Result<AuditReport> {
        let mut summary = AuditSummary::default();
        let mut entries = Vec::with_capacity(rows.len());

        for row in rows {
            let (record, outcome) = match row.parsed {
                Ok(record) => match self.audit_record(&record) {
                    Ok(outcome) => (Some(record), outcome),
                    Err(e) if self.config.fail_on_invalid_row() => {
                        return Err(EligibilityError::ProcessingError {
                            message: format!("row {}: {}", row.line, e),
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Row {} failed validation: {}", row.line, e);
                        (
                            Some(record),
                            AuditOutcome::Invalid {
                                reason: e.to_string(),
                            },
                        )
                    }
                },
                Err(reason) => (None, AuditOutcome::Invalid { reason }),
            };

            if let AuditOutcome::Violation { max_allowed, .. } = &outcome {
                tracing::debug!(
                    line = row.line,
                    max_allowed = %max_allowed,
                    "proficiency above experience cap"
                );
            }

            summary.record(&outcome);
            entries.push(AuditEntry {
                line: row.line,
                record,
                outcome,
            });
        }

        Ok(AuditReport {
            generated_at: Utc::now(),
            policy: self.policy.name().to_string(),
            summary,
            entries,
        })
    }

    async fn load(&self, report: AuditReport) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for format in self.config.output_formats() {
            let (path, data) = match format.as_str() {
                "csv" => (
                    self.output_file(self.config.csv_filename()),
                    render_csv_report(&report)?,
                ),
                "json" => (
                    self.output_file(self.config.json_filename()),
                    serde_json::to_vec_pretty(&report)?,
                ),
                other => {
                    return Err(EligibilityError::InvalidConfigValueError {
                        field: "output.formats".to_string(),
                        value: other.to_string(),
                        reason: "Valid formats: csv, json".to_string(),
                    })
                }
            };

            self.storage.write_file(&path, &data).await?;
            tracing::debug!("Wrote {} report to {}", format, path);
            written.push(path);
        }

        Ok(written)
    }
}
