use crate::domain::model::{AuditReport, ExperienceDuration, ProficiencyRating, SheetRow};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Maps claimed experience to the highest star rating it can back.
pub trait EligibilityPolicy: Send + Sync {
    fn name(&self) -> &str;
    fn max_allowed(&self, experience: ExperienceDuration) -> ProficiencyRating;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn csv_filename(&self) -> &str;
    fn json_filename(&self) -> &str;
    fn fail_on_invalid_row(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SheetRow>>;
    async fn transform(&self, rows: Vec<SheetRow>) -> Result<AuditReport>;
    async fn load(&self, report: AuditReport) -> Result<Vec<String>>;
}
