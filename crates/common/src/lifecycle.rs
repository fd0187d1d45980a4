//! 绑定生命周期

use std::fmt;

/// 绑定生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// 瞬时模式 - 每次解析都创建新实例
    #[default]
    Transient,
    /// 单例模式 - 首次解析时创建，之后在容器内共享
    Singleton,
}

impl Lifetime {
    /// 是否缓存解析结果
    pub fn is_shared(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Singleton => f.write_str("singleton"),
        }
    }
}
