use crate::core::eligibility::{PolicyTier, TieredPolicy};
use crate::core::ConfigProvider;
use crate::utils::error::{EligibilityError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_one_of, validate_path,
    validate_required_field, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const OUTPUT_FORMATS: [&str; 2] = ["csv", "json"];
pub const INVALID_ROW_MODES: [&str; 2] = ["skip", "fail"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyVariant {
    #[default]
    FourTier,
    Legacy,
    /// Tiers come from the config file.
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub audit: Option<AuditMeta>,
    #[serde(default)]
    pub policy: PolicyConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditMeta {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub variant: PolicyVariant,
    pub tiers: Option<Vec<PolicyTier>>,
    pub ceiling: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub on_invalid_row: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    pub filenames: Option<FilenameConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilenameConfig {
    pub csv: Option<String>,
    pub json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

fn default_formats() -> Vec<String> {
    vec!["csv".to_string(), "json".to_string()]
}

impl AuditConfig {
    /// 以預設值建立設定（四級政策、輸出 CSV 與 JSON）
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            audit: None,
            policy: PolicyConfig::default(),
            input: InputConfig {
                path: input_path.into(),
                on_invalid_row: None,
            },
            output: OutputConfig {
                path: output_path.into(),
                formats: default_formats(),
                filenames: None,
            },
            logging: None,
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${SKILL_EXPORT_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EligibilityError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn name(&self) -> &str {
        self.audit.as_ref().map(|a| a.name.as_str()).unwrap_or("skill-audit")
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    /// 依設定建立資格政策
    pub fn build_policy(&self) -> Result<TieredPolicy> {
        match self.policy.variant {
            PolicyVariant::FourTier => Ok(TieredPolicy::four_tier()),
            PolicyVariant::Legacy => Ok(TieredPolicy::legacy_binary()),
            PolicyVariant::Custom => {
                let tiers = validate_required_field("policy.tiers", &self.policy.tiers)?;
                TieredPolicy::new(
                    self.name(),
                    tiers.clone(),
                    self.policy.ceiling.unwrap_or(5),
                )
            }
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(meta) = &self.audit {
            validate_non_empty_string("audit.name", &meta.name)?;
        }

        validate_path("input.path", &self.input.path)?;
        validate_file_extension("input.path", &self.input.path, &["csv"])?;
        if let Some(mode) = &self.input.on_invalid_row {
            validate_one_of("input.on_invalid_row", mode, &INVALID_ROW_MODES)?;
        }

        validate_path("output.path", &self.output.path)?;
        if self.output.formats.is_empty() {
            return Err(EligibilityError::ConfigValidationError {
                field: "output.formats".to_string(),
                message: "at least one output format is required".to_string(),
            });
        }
        for format in &self.output.formats {
            validate_one_of("output.formats", format, &OUTPUT_FORMATS)?;
        }
        if let Some(filenames) = &self.output.filenames {
            if let Some(csv) = &filenames.csv {
                validate_non_empty_string("output.filenames.csv", csv)?;
            }
            if let Some(json) = &filenames.json {
                validate_non_empty_string("output.filenames.json", json)?;
            }
        }

        self.build_policy().map(|_| ())
    }
}

impl ConfigProvider for AuditConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn csv_filename(&self) -> &str {
        self.output
            .filenames
            .as_ref()
            .and_then(|f| f.csv.as_deref())
            .unwrap_or("audit_report.csv")
    }

    fn json_filename(&self) -> &str {
        self.output
            .filenames
            .as_ref()
            .and_then(|f| f.json.as_deref())
            .unwrap_or("audit_report.json")
    }

    fn fail_on_invalid_row(&self) -> bool {
        self.input.on_invalid_row.as_deref() == Some("fail")
    }
}

impl Validate for AuditConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
