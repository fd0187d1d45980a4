//! 解析器抽象接口
//!
//! 提供递归解析和解析链跟踪的能力

use crate::instance::Instance;
use di_common::{ResolutionError, ResolutionResult, ServiceKey};
use std::sync::Arc;

/// 解析器 trait
///
/// 负责为标识符产生实例，并递归解析其构造参数
pub trait Resolver: Send + Sync {
    /// 在给定的解析上下文中解析标识符
    fn resolve_with(&self, key: &str, context: &mut ResolveContext) -> ResolutionResult<Instance>;

    /// 新解析链使用的选项
    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::default()
    }

    /// 解析标识符
    fn resolve(&self, key: &str) -> ResolutionResult<Instance> {
        let mut context = ResolveContext::new(self.resolve_options());
        self.resolve_with(key, &mut context)
    }

    /// 解析标识符并以 `T` 视图返回
    fn resolve_as<T>(&self, key: &str) -> ResolutionResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        self.resolve(key)?.require::<T>()
    }
}

/// 解析上下文
///
/// 对应一次顶层 `resolve` 调用，记录当前正在解析的标识符链
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    pub resolution_chain: Vec<ServiceKey>,
    /// 解析选项
    pub options: ResolveOptions,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            resolution_chain: Vec::new(),
            options,
        }
    }

    /// 进入对 `key` 的解析
    pub fn enter(&mut self, key: &str) -> ResolutionResult<()> {
        if self.resolution_chain.iter().any(|k| k == key) {
            let mut chain: Vec<&str> = self.resolution_chain.iter().map(|k| k.as_str()).collect();
            chain.push(key);
            return Err(ResolutionError::CircularDependency {
                chain: chain.join(" -> "),
            });
        }
        if self.resolution_chain.len() >= self.options.max_depth {
            return Err(ResolutionError::DepthExceeded {
                key: ServiceKey::from(key),
                max_depth: self.options.max_depth,
            });
        }
        self.resolution_chain.push(ServiceKey::from(key));
        Ok(())
    }

    /// 离开当前解析
    pub fn exit(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(ResolveOptions::default())
    }
}

/// 解析选项
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// 最大递归深度
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// 工厂函数在执行期间看到的解析器
///
/// 工厂内部发起的解析沿用同一条解析链，因此跨工厂的循环依赖同样会被检测到
pub struct Resolving<'a> {
    resolver: &'a dyn Resolver,
    context: &'a mut ResolveContext,
}

impl<'a> Resolving<'a> {
    /// 创建新的工厂解析器
    pub fn new(resolver: &'a dyn Resolver, context: &'a mut ResolveContext) -> Self {
        Self { resolver, context }
    }

    /// 解析依赖
    pub fn resolve(&mut self, key: &str) -> ResolutionResult<Instance> {
        self.resolver.resolve_with(key, self.context)
    }

    /// 解析依赖并以 `T` 视图返回
    pub fn resolve_as<T>(&mut self, key: &str) -> ResolutionResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve(key)?.require::<T>()
    }
}
