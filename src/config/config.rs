use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::session::Language;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 允许跨域访问（前端页面独立部署时开启）
    pub cors_permissive: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式（JSON）
    pub structured: bool,
    /// 日志文件目录，为空时只输出到标准输出
    pub log_dir: Option<PathBuf>,
}

/// 知识查询配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// 查询后端: "wikipedia"、"ollama" 或 "none"
    pub provider: String,
    /// Wikipedia 地址覆盖，为空时按语言拼接 https://{lang}.wikipedia.org
    pub wikipedia_base_url: Option<String>,
    /// 摘要保留的句子数
    pub summary_sentences: u32,
    /// 摘要最大字符数
    pub max_summary_chars: usize,
    /// Ollama 服务器地址
    pub ollama_url: String,
    /// Ollama 模型名称
    pub ollama_model: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionSettings {
    /// 每个会话允许的提问次数
    pub max_queries: u32,
    /// 新会话的默认语言
    pub default_language: String,
    /// 会话空闲多久后回收（秒）
    pub idle_ttl_secs: u64,
    /// 同时保留的会话上限，满时淘汰最久未活动的会话
    pub max_sessions: usize,
}

/// 分类器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 自定义关键词表（TOML），为空时使用内置表
    pub tables_path: Option<PathBuf>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 知识查询配置
    pub knowledge: KnowledgeConfig,
    /// 会话配置
    pub session: SessionSettings,
    /// 分类器配置
    pub classifier: ClassifierConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
                cors_permissive: true,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            knowledge: KnowledgeConfig {
                provider: "wikipedia".into(),
                wikipedia_base_url: None,
                summary_sentences: 3,
                max_summary_chars: 900,
                ollama_url: "http://localhost:11434".into(),
                ollama_model: "llama3.2".into(),
                timeout_secs: 5,
            },
            session: SessionSettings {
                max_queries: 30,
                default_language: Language::En.code().into(),
                idle_ttl_secs: 3600,
                max_sessions: 10_000,
            },
            classifier: ClassifierConfig { tables_path: None },
            app_name: "inmind".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.server.host = "0.0.0.0".into();
        config.server.cors_permissive = false;
        config.logging.level = "info".into();
        config.logging.structured = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.session.max_queries, 30);
        assert_eq!(config.knowledge.provider, "wikipedia");
        assert_eq!(config.knowledge.timeout_secs, 5);
        assert_eq!(config.session.default_language, "en");
        assert_eq!(config.session.idle_ttl_secs, 3600);
        assert_eq!(config.session.max_sessions, 10_000);
    }

    #[test]
    fn test_production_overrides() {
        let config = AppConfig::production();
        assert_eq!(config.environment, "production");
        assert!(config.logging.structured);
        assert!(!config.server.cors_permissive);
        assert_eq!(config.knowledge.max_summary_chars, 900);
    }
}
