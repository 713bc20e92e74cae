//! 配置模块，负责过滤器设置的构建、校验以及从 JSON 文件加载

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::alias::AliasRegistry;
use crate::ast::{CompOp, LogicalOp};

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("operator {operator} has an empty token")]
    EmptyToken { operator: String },

    #[error("token `{token}` for {operator} must not contain {found:?}")]
    InvalidTokenChar {
        operator: String,
        token: String,
        found: char,
    },

    #[error("token `{token}` is configured for both {first} and {second}")]
    DuplicateToken {
        token: String,
        first: String,
        second: String,
    },

    #[error("case-insensitive appendix must not be empty")]
    EmptyAppendix,

    #[error("config file does not exist: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON config file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 比较运算符的别名, 每个运算符都有一个默认值或覆盖值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonAliases {
    pub equals_operator: String,
    pub not_equals_operator: String,
    pub greater_than_operator: String,
    pub greater_than_or_equal_operator: String,
    pub less_than_operator: String,
    pub less_than_or_equal_operator: String,
    pub contains_operator: String,
    pub not_contains_operator: String,
    pub starts_with_operator: String,
    pub not_starts_with_operator: String,
    pub ends_with_operator: String,
    pub not_ends_with_operator: String,
    pub in_operator: String,
    pub not_in_operator: String,
    /// 跟在运算符后面, 表示大小写不敏感的比较, 例如 `==*`
    pub case_insensitive_appendix: String,
}

impl Default for ComparisonAliases {
    fn default() -> Self {
        Self {
            equals_operator: CompOp::Eq.default_token().to_string(),
            not_equals_operator: CompOp::NotEq.default_token().to_string(),
            greater_than_operator: CompOp::Gt.default_token().to_string(),
            greater_than_or_equal_operator: CompOp::Gte.default_token().to_string(),
            less_than_operator: CompOp::Lt.default_token().to_string(),
            less_than_or_equal_operator: CompOp::Lte.default_token().to_string(),
            contains_operator: CompOp::Contains.default_token().to_string(),
            not_contains_operator: CompOp::NotContains.default_token().to_string(),
            starts_with_operator: CompOp::StartsWith.default_token().to_string(),
            not_starts_with_operator: CompOp::NotStartsWith.default_token().to_string(),
            ends_with_operator: CompOp::EndsWith.default_token().to_string(),
            not_ends_with_operator: CompOp::NotEndsWith.default_token().to_string(),
            in_operator: CompOp::In.default_token().to_string(),
            not_in_operator: CompOp::NotIn.default_token().to_string(),
            case_insensitive_appendix: "*".to_string(),
        }
    }
}

impl ComparisonAliases {
    /// 获取运算符当前配置的符号
    pub fn token(&self, op: CompOp) -> &str {
        match op {
            CompOp::Eq => &self.equals_operator,
            CompOp::NotEq => &self.not_equals_operator,
            CompOp::Gt => &self.greater_than_operator,
            CompOp::Gte => &self.greater_than_or_equal_operator,
            CompOp::Lt => &self.less_than_operator,
            CompOp::Lte => &self.less_than_or_equal_operator,
            CompOp::Contains => &self.contains_operator,
            CompOp::NotContains => &self.not_contains_operator,
            CompOp::StartsWith => &self.starts_with_operator,
            CompOp::NotStartsWith => &self.not_starts_with_operator,
            CompOp::EndsWith => &self.ends_with_operator,
            CompOp::NotEndsWith => &self.not_ends_with_operator,
            CompOp::In => &self.in_operator,
            CompOp::NotIn => &self.not_in_operator,
        }
    }
}

/// 逻辑运算符的别名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicalAliases {
    pub and_operator: String,
    pub or_operator: String,
}

impl Default for LogicalAliases {
    fn default() -> Self {
        Self {
            and_operator: LogicalOp::And.default_token().to_string(),
            or_operator: LogicalOp::Or.default_token().to_string(),
        }
    }
}

impl LogicalAliases {
    pub fn token(&self, op: LogicalOp) -> &str {
        match op {
            LogicalOp::And => &self.and_operator,
            LogicalOp::Or => &self.or_operator,
        }
    }
}

/// 字段路径跨越集合时插入的量词
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    /// 至少一个元素满足条件
    #[default]
    Any,
    /// 所有元素都满足条件
    All,
}

/// 过滤器的全部可配置项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub comparison_aliases: ComparisonAliases,
    pub logical_aliases: LogicalAliases,
    /// 字段路径是否区分大小写
    pub field_case_sensitive: bool,
    pub default_quantifier: Quantifier,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            comparison_aliases: ComparisonAliases::default(),
            logical_aliases: LogicalAliases::default(),
            field_case_sensitive: true,
            default_quantifier: Quantifier::Any,
        }
    }
}

impl FilterSettings {
    /// 从默认值开始，通过闭包覆盖部分设置
    ///
    /// ```
    /// use filter_compiler::config::FilterSettings;
    ///
    /// let settings = FilterSettings::configure(|s| {
    ///     s.comparison_aliases.equals_operator = "eq".to_string();
    /// });
    /// assert_eq!(settings.comparison_aliases.equals_operator, "eq");
    /// ```
    pub fn configure(f: impl FnOnce(&mut FilterSettings)) -> Self {
        let mut settings = FilterSettings::default();
        f(&mut settings);
        settings
    }

    /// 从JSON文件加载设置, 缺省的字段使用默认值
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: FilterSettings = read_json_file(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loaded filter settings");
        Ok(settings)
    }
}

/// 读取并解析JSON文件
pub(crate) fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    // 检查文件是否存在
    if !path.exists() {
        return Err(ConfigError::Missing {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// 校验过的、不可变的配置
///
/// 构建时预先计算好运算符表，之后可以在多个线程间共享。
#[derive(Debug, Clone)]
pub struct FilterConfig {
    settings: FilterSettings,
    registry: AliasRegistry,
}

impl FilterConfig {
    pub fn new(settings: FilterSettings) -> Result<Self, ConfigError> {
        let registry =
            AliasRegistry::new(&settings.comparison_aliases, &settings.logical_aliases)?;
        debug!(
            operators = registry.comparison_count(),
            appendix = registry.appendix(),
            "built filter config"
        );
        Ok(Self { settings, registry })
    }

    /// 通过闭包构建并校验配置
    pub fn configure(f: impl FnOnce(&mut FilterSettings)) -> Result<Self, ConfigError> {
        Self::new(FilterSettings::configure(f))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::new(FilterSettings::from_json_file(path)?)
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn registry(&self) -> &AliasRegistry {
        &self.registry
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            settings: FilterSettings::default(),
            registry: AliasRegistry::default(),
        }
    }
}
