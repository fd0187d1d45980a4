//! 容器启动器

use crate::logging::{init_logging, LoggingConfig};
use crate::manifest::BindingManifest;
use di_abstractions::ContainerConfig;
use di_common::{BootstrapError, BootstrapResult, RegistrationResult};
use di_impl::Container;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 服务提供者
///
/// 一组相关的类型注册、契约声明和默认绑定
pub trait ServiceProvider: Send + Sync {
    /// 提供者名称
    fn name(&self) -> &str;

    /// 向容器注册服务
    fn register(&self, container: &mut Container) -> RegistrationResult<()>;
}

/// 容器启动器
///
/// 按固定顺序组装容器：日志、服务提供者、绑定清单、环境变量覆盖、验证。
/// 清单和环境变量中的绑定覆盖服务提供者注册的默认绑定。
pub struct ContainerBootstrapper {
    /// 容器配置
    config: ContainerConfig,
    /// 服务提供者列表
    providers: Vec<Box<dyn ServiceProvider>>,
    /// 合并后的绑定清单
    manifest: BindingManifest,
    /// 环境变量前缀
    env_prefix: Option<String>,
    /// 是否在构建结束时验证容器
    validation_enabled: bool,
    /// 日志配置，未设置时不初始化日志
    logging_config: Option<LoggingConfig>,
}

impl ContainerBootstrapper {
    /// 创建新的容器启动器
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
            providers: Vec::new(),
            manifest: BindingManifest::default(),
            env_prefix: None,
            validation_enabled: true,
            logging_config: None,
        }
    }

    /// 设置日志配置
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 设置容器配置，清单中的容器选项优先
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 添加服务提供者
    pub fn add_provider<P: ServiceProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// 添加绑定清单
    pub fn add_manifest(mut self, manifest: BindingManifest) -> Self {
        self.manifest.merge(manifest);
        self
    }

    /// 添加绑定清单文件
    pub fn add_manifest_file<P: AsRef<Path>>(self, path: P) -> BootstrapResult<Self> {
        let manifest = BindingManifest::from_path(path)?;
        Ok(self.add_manifest(manifest))
    }

    /// 设置环境变量覆盖的前缀
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// 设置是否启用容器验证
    pub fn enable_validation(mut self, enabled: bool) -> Self {
        self.validation_enabled = enabled;
        self
    }

    /// 构建容器，构建完成后仍可继续注册
    pub fn build_container(mut self) -> BootstrapResult<Container> {
        // 只有在明确配置了日志时才初始化日志
        if let Some(logging_config) = &self.logging_config {
            init_logging(logging_config)?;
        }

        info!("开始构建容器");

        if let Some(prefix) = &self.env_prefix {
            let applied = self.manifest.apply_env_overrides(prefix)?;
            debug!("应用了 {} 个环境变量覆盖项", applied);
        }

        let mut container = Container::with_config(self.manifest.container_config(self.config));

        for provider in &self.providers {
            info!("注册服务提供者: {}", provider.name());
            provider.register(&mut container)?;
        }

        let applied = self.manifest.apply_to(&mut container);
        debug!("应用了 {} 个清单绑定", applied);

        if self.validation_enabled {
            if let Err(errors) = container.validate() {
                for e in &errors {
                    error!("容器验证失败: {}", e);
                }
                return Err(BootstrapError::ValidationFailed {
                    errors: errors.iter().map(ToString::to_string).collect(),
                });
            }
        }

        let stats = container.stats();
        info!(
            "容器构建完成: {} 个绑定, {} 个类型",
            stats.registered_bindings, stats.registered_types
        );
        Ok(container)
    }

    /// 构建并共享容器，共享之后绑定表不再变化
    pub fn build(self) -> BootstrapResult<Arc<Container>> {
        self.build_container().map(Arc::new)
    }
}

impl Default for ContainerBootstrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContainerBootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ContainerBootstrapper")
            .field("config", &self.config)
            .field("providers", &providers)
            .field("manifest", &self.manifest)
            .field("env_prefix", &self.env_prefix)
            .field("validation_enabled", &self.validation_enabled)
            .field("logging_config", &self.logging_config)
            .finish()
    }
}
