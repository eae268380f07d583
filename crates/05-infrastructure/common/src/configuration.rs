//! 容器配置与组件配置绑定

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error};

/// 环境变量前缀，例如 `DI_MAX_RESOLUTION_DEPTH=32`
pub const ENV_PREFIX: &str = "DI";

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 最大解析深度（构造链长度）
    pub max_resolution_depth: usize,
    /// 是否在实例创建后执行延迟绑定（循环依赖接线）
    pub wire_bindings: bool,
    /// 是否在调用构造函数前上报进度
    pub report_progress: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: 64,
            wire_bindings: true,
            report_progress: true,
        }
    }
}

impl ContainerConfig {
    /// 从可选配置文件和 `DI_` 前缀的环境变量加载配置
    ///
    /// 未出现的键使用默认值；环境变量优先于文件。
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("加载容器配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                error!("容器配置构建失败: {}", e);
                ConfigError::ParseError {
                    source: Box::new(e),
                }
            })?;

        let config: Self = settings.try_deserialize().map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

/// 从已构建的配置中绑定一个类型化的配置节
///
/// 用于在注册组件前准备组件的配置对象。
pub fn bind_section<T>(settings: &config::Config, path: &str) -> ConfigResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    debug!("绑定配置到类型: {} -> {}", path, std::any::type_name::<T>());
    settings.get::<T>(path).map_err(|e| match e {
        config::ConfigError::NotFound(key) => ConfigError::KeyNotFound { key },
        other => {
            error!("配置绑定失败: path={}, error={}", path, other);
            ConfigError::ParseError {
                source: Box::new(other),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ContainerConfig::default();
        assert_eq!(config.max_resolution_depth, 64);
        assert!(config.wire_bindings);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_resolution_depth = 8").unwrap();
        writeln!(file, "wire_bindings = false").unwrap();

        let config = ContainerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_resolution_depth, 8);
        assert!(!config.wire_bindings);
        assert!(config.report_progress);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = ContainerConfig::load(Some(Path::new("/definitely/missing/di.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let config = ContainerConfig {
            max_resolution_depth: 0,
            ..ContainerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct CacheSettings {
        capacity: usize,
    }

    #[test]
    fn test_bind_section() {
        let settings = config::Config::builder()
            .set_override("cache.capacity", 128)
            .unwrap()
            .build()
            .unwrap();

        let section: CacheSettings = bind_section(&settings, "cache").unwrap();
        assert_eq!(section, CacheSettings { capacity: 128 });

        let missing = bind_section::<CacheSettings>(&settings, "store");
        assert!(missing.is_err());
    }
}
