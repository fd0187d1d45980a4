//! 绑定清单
//!
//! 清单以 TOML 或 JSON 描述容器选项和抽象标识符到具体标识符的绑定，
//! 环境变量可以逐项覆盖文件中的绑定。

use di_abstractions::{BindingRegistry, ContainerConfig};
use di_common::{ConfigError, ConfigResult, ServiceKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// 容器选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSection {
    /// 最大解析深度
    pub max_resolution_depth: Option<usize>,
    /// 覆盖已有绑定时是否警告
    pub warn_on_rebind: Option<bool>,
}

/// 绑定清单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingManifest {
    /// 容器选项
    pub container: ContainerSection,
    /// 瞬态绑定
    pub bindings: BTreeMap<ServiceKey, ServiceKey>,
    /// 单例绑定
    pub singletons: BTreeMap<ServiceKey, ServiceKey>,
}

impl BindingManifest {
    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let manifest: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        manifest.check()?;
        Ok(manifest)
    }

    /// 从 JSON 文本解析
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let manifest: Self =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;
        manifest.check()?;
        Ok(manifest)
    }

    /// 从文件加载，按扩展名选择格式
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        info!("加载绑定清单: {}", path.display());
        match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&std::fs::read_to_string(path)?),
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    fn check(&self) -> ConfigResult<()> {
        for (key, concrete) in self.bindings.iter().chain(self.singletons.iter()) {
            if key.is_empty() || concrete.is_empty() {
                return Err(ConfigError::InvalidEntry {
                    key: key.to_string(),
                    message: "绑定的标识符不能为空".to_string(),
                });
            }
        }
        if self.container.max_resolution_depth == Some(0) {
            return Err(ConfigError::InvalidEntry {
                key: "container.max_resolution_depth".to_string(),
                message: "最大解析深度必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 清单是否不包含任何内容
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
            && self.singletons.is_empty()
            && self.container == ContainerSection::default()
    }

    /// 添加瞬态绑定，同名的单例绑定被替换
    pub fn bind(&mut self, key: impl Into<ServiceKey>, concrete: impl Into<ServiceKey>) {
        let key = key.into();
        self.singletons.remove(&key);
        self.bindings.insert(key, concrete.into());
    }

    /// 添加单例绑定，同名的瞬态绑定被替换
    pub fn singleton(&mut self, key: impl Into<ServiceKey>, concrete: impl Into<ServiceKey>) {
        let key = key.into();
        self.bindings.remove(&key);
        self.singletons.insert(key, concrete.into());
    }

    /// 合并另一份清单，`other` 中的项优先
    pub fn merge(&mut self, other: BindingManifest) {
        if other.container.max_resolution_depth.is_some() {
            self.container.max_resolution_depth = other.container.max_resolution_depth;
        }
        if other.container.warn_on_rebind.is_some() {
            self.container.warn_on_rebind = other.container.warn_on_rebind;
        }
        for (key, concrete) in other.bindings {
            self.bind(key, concrete);
        }
        for (key, concrete) in other.singletons {
            self.singleton(key, concrete);
        }
    }

    /// 应用 `<PREFIX>_BIND__<Key>` 和 `<PREFIX>_SINGLETON__<Key>` 形式的覆盖项
    ///
    /// 返回应用的覆盖项数量，其他变量被忽略
    pub fn apply_overrides<I>(&mut self, prefix: &str, vars: I) -> ConfigResult<usize>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let bind_prefix = format!("{}_BIND__", prefix);
        let singleton_prefix = format!("{}_SINGLETON__", prefix);
        let mut applied = 0;

        for (name, value) in vars {
            let (key, singleton) = if let Some(key) = name.strip_prefix(&bind_prefix) {
                (key, false)
            } else if let Some(key) = name.strip_prefix(&singleton_prefix) {
                (key, true)
            } else {
                continue;
            };

            let concrete = value.trim();
            if key.is_empty() || concrete.is_empty() {
                return Err(ConfigError::InvalidEntry {
                    key: name.clone(),
                    message: "环境变量覆盖项的标识符不能为空".to_string(),
                });
            }

            debug!("环境变量覆盖绑定: {} -> {}", key, concrete);
            if singleton {
                self.singleton(key, concrete);
            } else {
                self.bind(key, concrete);
            }
            applied += 1;
        }

        Ok(applied)
    }

    /// 应用当前进程环境变量中的覆盖项
    pub fn apply_env_overrides(&mut self, prefix: &str) -> ConfigResult<usize> {
        debug!("加载环境变量，前缀: {}", prefix);
        self.apply_overrides(prefix, std::env::vars())
    }

    /// 在基础配置上叠加清单中的容器选项
    pub fn container_config(&self, base: ContainerConfig) -> ContainerConfig {
        ContainerConfig {
            max_resolution_depth: self
                .container
                .max_resolution_depth
                .unwrap_or(base.max_resolution_depth),
            warn_on_rebind: self.container.warn_on_rebind.unwrap_or(base.warn_on_rebind),
        }
    }

    /// 将绑定写入注册表，返回写入的绑定数量
    pub fn apply_to<R: BindingRegistry>(&self, registry: &mut R) -> usize {
        for (key, concrete) in &self.bindings {
            registry.bind(key, concrete);
        }
        for (key, concrete) in &self.singletons {
            registry.singleton(key, concrete);
        }
        self.bindings.len() + self.singletons.len()
    }
}
