//! 引擎配置
//!
//! 加载顺序（后加载的覆盖先加载的同名配置项）：
//! 1. config/default.toml
//! 2. config/{name}.toml
//! 3. 环境变量（RULE_ENGINE_ 前缀，如 RULE_ENGINE_STRICT_COMPILE -> strict_compile）

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 构建评估器时遇到第一个编译错误即失败，而不是延迟到评估时返回
    pub strict_compile: bool,
    /// 构建评估器时运行语法校验，并以 warn 级别记录发现的问题
    pub validate_on_build: bool,
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_compile: false,
            validate_on_build: false,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl EngineConfig {
    /// 从 `CONFIG_DIR`（默认 `config`）目录和环境变量加载配置
    pub fn load(name: &str) -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        Self::load_from(Path::new(&config_dir), name)
    }

    pub fn load_from(config_dir: &Path, name: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", name))).required(false))
            .add_source(Environment::with_prefix("RULE_ENGINE").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn is_json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
