//! 容器配置与统计

use crate::resolver::ResolveOptions;

/// 容器配置
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 覆盖已有绑定时是否输出警告日志
    pub warn_on_rebind: bool,
}

impl ContainerConfig {
    /// 新解析链使用的选项
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_depth: self.max_resolution_depth,
        }
    }

    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: ResolveOptions::default().max_depth,
            warn_on_rebind: true,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 绑定数量
    pub registered_bindings: usize,
    /// 具体类型数量
    pub registered_types: usize,
    /// 已创建的单例数量，不含实例绑定
    pub active_singletons: usize,
    /// 成功的顶层解析次数
    pub resolutions: u64,
    /// 失败的顶层解析次数
    pub resolution_errors: u64,
}
