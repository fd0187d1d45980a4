//! 错误类型定义

use crate::metadata::ServiceKey;
use thiserror::Error;

/// 解析错误类型
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("无法解析绑定: {key} 未绑定且不可直接实例化")]
    UnresolvableBinding { key: ServiceKey },

    #[error("类型不可实例化: {type_name}, 原因: {reason}")]
    NotInstantiable {
        type_name: ServiceKey,
        reason: String,
        source: Option<Box<ResolutionError>>,
    },

    #[error("检测到循环依赖: {chain}")]
    CircularDependency { chain: String },

    #[error("解析深度超出限制: {key}, 最大深度 {max_depth}")]
    DepthExceeded { key: ServiceKey, max_depth: usize },

    #[error("类型不匹配: {key} 无法作为 {expected} 使用")]
    TypeMismatch {
        key: ServiceKey,
        expected: &'static str,
    },

    #[error("工厂执行失败: {key}, 原因: {message}")]
    FactoryFailed { key: ServiceKey, message: String },
}

impl ResolutionError {
    /// 创建不可实例化错误
    pub fn not_instantiable(type_name: impl Into<ServiceKey>, reason: impl Into<String>) -> Self {
        Self::NotInstantiable {
            type_name: type_name.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// 创建带有底层原因的不可实例化错误
    pub fn not_instantiable_because(
        type_name: impl Into<ServiceKey>,
        reason: impl Into<String>,
        source: ResolutionError,
    ) -> Self {
        Self::NotInstantiable {
            type_name: type_name.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// 创建工厂执行失败错误
    pub fn factory_failed(key: impl Into<ServiceKey>, message: impl Into<String>) -> Self {
        Self::FactoryFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// 是否为未绑定错误
    pub fn is_unresolvable_binding(&self) -> bool {
        matches!(self, Self::UnresolvableBinding { .. })
    }

    /// 是否为不可实例化错误
    pub fn is_not_instantiable(&self) -> bool {
        matches!(self, Self::NotInstantiable { .. })
    }

    /// 是否为循环依赖或深度超限
    ///
    /// 这两类错误描述的是整个解析链，沿调用栈向上传递时不再包装
    pub fn is_chain_failure(&self) -> bool {
        matches!(
            self,
            Self::CircularDependency { .. } | Self::DepthExceeded { .. }
        )
    }
}

/// 注册错误类型
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("服务标识符不能为空")]
    EmptyKey,

    #[error("具体类型缺少构造函数: {key}")]
    MissingConstructor { key: ServiceKey },

    #[error("标识符已声明为抽象契约，不能注册为具体类型: {key}")]
    ContractConflict { key: ServiceKey },

    #[error("标识符已注册为具体类型，不能声明为抽象契约: {key}")]
    ConcreteConflict { key: ServiceKey },
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("不支持的配置文件格式: {path}")]
    UnsupportedFormat { path: String },

    #[error("配置项无效: {key}, 原因: {message}")]
    InvalidEntry { key: String, message: String },
}

/// 启动错误类型
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("注册错误: {source}")]
    Registration {
        #[from]
        source: RegistrationError,
    },

    #[error("解析错误: {source}")]
    Resolution {
        #[from]
        source: ResolutionError,
    },

    #[error("日志初始化失败: {message}")]
    LoggingInit { message: String },

    #[error("容器验证失败: {}", errors.join("; "))]
    ValidationFailed { errors: Vec<String> },
}

/// 结果类型别名
pub type ResolutionResult<T> = Result<T, ResolutionError>;
pub type RegistrationResult<T> = Result<T, RegistrationError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type BootstrapResult<T> = Result<T, BootstrapError>;
