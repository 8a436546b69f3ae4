use crate::config::config::AppConfig;
use crate::models::session::Language;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 已知的知识查询后端
const KNOWN_PROVIDERS: &[&str] = &["wikipedia", "ollama", "none"];

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序（后者覆盖前者）：
    /// 1. 开发环境默认值
    /// 2. ./inmind.toml
    /// 3. INMIND_ 前缀的环境变量（`__` 分隔嵌套字段）
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("INMIND_").split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.knowledge.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        if config.knowledge.max_summary_chars == 0 {
            return Err(ConfigValidationError::InvalidSummaryLength);
        }

        if config.session.max_queries == 0 {
            return Err(ConfigValidationError::InvalidQueryLimit);
        }

        if config.session.idle_ttl_secs == 0 {
            return Err(ConfigValidationError::InvalidSessionTtl);
        }

        if config.session.max_sessions == 0 {
            return Err(ConfigValidationError::InvalidSessionCapacity);
        }

        if !KNOWN_PROVIDERS.contains(&config.knowledge.provider.as_str()) {
            return Err(ConfigValidationError::UnknownProvider(
                config.knowledge.provider.clone(),
            ));
        }

        if Language::from_code(&config.session.default_language).is_none() {
            return Err(ConfigValidationError::UnsupportedLanguage(
                config.session.default_language.clone(),
            ));
        }

        if let Some(path) = &config.classifier.tables_path {
            if !path.exists() {
                return Err(ConfigValidationError::InvalidPath(
                    path.display().to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("知识查询超时无效，必须大于 0")]
    InvalidTimeout,

    #[error("摘要长度上限无效，必须大于 0")]
    InvalidSummaryLength,

    #[error("会话提问上限无效，必须大于 0")]
    InvalidQueryLimit,

    #[error("会话空闲回收时间无效，必须大于 0")]
    InvalidSessionTtl,

    #[error("会话数量上限无效，必须大于 0")]
    InvalidSessionCapacity,

    #[error("未知的知识查询后端: {0}")]
    UnknownProvider(String),

    #[error("不支持的语言: {0}")]
    UnsupportedLanguage(String),

    #[error("配置路径无效: {0}")]
    InvalidPath(String),
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("inmind.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ConfigLoader::load_from("definitely/not/here.toml").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.max_queries, 30);
    }

    #[test]
    fn test_validate_development_config() {
        assert!(ConfigLoader::validate(&AppConfig::development()).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::development();
        config.server.port = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        ));

        let mut config = AppConfig::development();
        config.knowledge.provider = "bing".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::UnknownProvider(_))
        ));

        let mut config = AppConfig::development();
        config.session.default_language = "de".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::UnsupportedLanguage(_))
        ));

        let mut config = AppConfig::development();
        config.session.max_queries = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidQueryLimit)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_summary_length() {
        let mut config = AppConfig::development();
        config.knowledge.max_summary_chars = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidSummaryLength)
        ));
    }

    #[test]
    fn test_validate_rejects_unbounded_session_store() {
        let mut config = AppConfig::development();
        config.session.idle_ttl_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidSessionTtl)
        ));

        let mut config = AppConfig::development();
        config.session.max_sessions = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidSessionCapacity)
        ));
    }
}
