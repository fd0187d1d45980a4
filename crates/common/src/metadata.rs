//! 元数据定义
//!
//! 提供服务标识符、构造参数和绑定的元数据信息

use crate::lifecycle::Lifetime;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// 服务标识符
///
/// 可以是抽象契约名（如 `PaymentInterface`），也可以是具体类型名
/// （如 `CreditCardPayment`）。克隆开销很小。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceKey(Arc<str>);

impl ServiceKey {
    /// 创建新的服务标识符
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// 获取字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ServiceKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ServiceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ServiceKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl From<&ServiceKey> for ServiceKey {
    fn from(key: &ServiceKey) -> Self {
        key.clone()
    }
}

impl PartialEq<str> for ServiceKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for ServiceKey {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// 构造函数参数声明
///
/// 按声明顺序登记在具体类型上，替代运行时反射
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// 可由容器解析的服务参数
    Service(ServiceKey),
    /// 标量参数（字符串、数字等），无法自动解析
    Scalar {
        /// 参数名
        name: String,
        /// 声明的标量类型
        type_name: String,
    },
}

impl Parameter {
    /// 创建服务参数
    pub fn service(key: impl Into<ServiceKey>) -> Self {
        Self::Service(key.into())
    }

    /// 创建标量参数
    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::Scalar {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// 服务参数对应的标识符
    pub fn service_key(&self) -> Option<&ServiceKey> {
        match self {
            Self::Service(key) => Some(key),
            Self::Scalar { .. } => None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(key) => write!(f, "{}", key),
            Self::Scalar { name, type_name } => write!(f, "{}: {}", name, type_name),
        }
    }
}

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        Self {
            name: full.rsplit("::").next().unwrap_or(full).to_string(),
            id: TypeId::of::<T>(),
            module_path: full.to_string(),
        }
    }
}

/// 绑定目标的种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    /// 绑定到具体类型标识符
    Concrete(ServiceKey),
    /// 绑定到工厂函数
    Factory,
    /// 绑定到已创建的实例
    Instance,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(key) => write!(f, "{}", key),
            Self::Factory => f.write_str("<factory>"),
            Self::Instance => f.write_str("<instance>"),
        }
    }
}

/// 绑定描述符，用于诊断和日志
#[derive(Debug, Clone)]
pub struct BindingDescriptor {
    /// 抽象标识符
    pub key: ServiceKey,
    /// 绑定目标
    pub kind: BindingKind,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 单例是否已经创建
    pub resolved: bool,
    /// 注册时间
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

impl fmt::Display for BindingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.key, self.kind, self.lifetime)
    }
}
