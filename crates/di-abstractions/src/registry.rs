//! 绑定注册表抽象接口

use crate::factory::{ConcreteType, FactoryFn, TypeRegistration};
use crate::instance::Instance;
use crate::resolver::Resolving;
use di_common::{
    BindingDescriptor, BindingKind, RegistrationResult, ResolutionError, ResolutionResult,
    ServiceKey,
};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// 绑定注册表 trait
///
/// 提供绑定注册和查询的核心接口。注册方法都需要 `&mut self`，
/// 因此容器一旦被共享，绑定表就不再变化。
pub trait BindingRegistry {
    /// 绑定抽象标识符到具体类型标识符，已有绑定会被覆盖
    fn bind(&mut self, abstract_key: &str, concrete_key: &str);

    /// 绑定抽象标识符到工厂函数
    fn bind_factory<F>(&mut self, abstract_key: &str, factory: F)
    where
        F: Fn(&mut Resolving<'_>) -> ResolutionResult<Instance> + Send + Sync + 'static;

    /// 以单例方式绑定到具体类型标识符
    fn singleton(&mut self, abstract_key: &str, concrete_key: &str);

    /// 以单例方式绑定到工厂函数
    fn singleton_factory<F>(&mut self, abstract_key: &str, factory: F)
    where
        F: Fn(&mut Resolving<'_>) -> ResolutionResult<Instance> + Send + Sync + 'static;

    /// 绑定到已创建的共享实例
    fn instance(&mut self, abstract_key: &str, instance: Instance);

    /// 注册具体类型的构造参数和构造函数
    fn register_type<T>(&mut self, concrete: ConcreteType<T>) -> RegistrationResult<()>
    where
        T: Send + Sync + 'static;

    /// 声明抽象契约
    fn register_contract(&mut self, key: &str) -> RegistrationResult<()>;

    /// 移除绑定及其缓存的单例，返回绑定是否存在
    fn forget(&mut self, key: &str) -> bool;

    /// 是否存在绑定
    fn is_bound(&self, key: &str) -> bool;

    /// 是否存在绑定或已注册的具体类型
    fn has(&self, key: &str) -> bool;

    /// 获取所有绑定的描述符
    fn bindings(&self) -> Vec<BindingDescriptor>;
}

/// 绑定目标
#[derive(Clone)]
pub enum BindingTarget {
    /// 具体类型标识符
    Concrete(ServiceKey),
    /// 工厂函数
    Factory(FactoryFn),
    /// 已创建的实例
    Instance(Instance),
}

impl BindingTarget {
    /// 绑定目标的种类
    pub fn kind(&self) -> BindingKind {
        match self {
            Self::Concrete(key) => BindingKind::Concrete(key.clone()),
            Self::Factory(_) => BindingKind::Factory,
            Self::Instance(_) => BindingKind::Instance,
        }
    }
}

impl std::fmt::Debug for BindingTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concrete(key) => f.debug_tuple("Concrete").field(key).finish(),
            Self::Factory(_) => f.write_str("Factory(<function>)"),
            Self::Instance(instance) => f.debug_tuple("Instance").field(instance).finish(),
        }
    }
}

/// 依赖图节点
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// 标识符
    pub key: ServiceKey,
    /// 依赖的标识符列表
    pub dependencies: Vec<ServiceKey>,
}

/// 循环依赖检测器
pub trait CircularDependencyDetector: Send + Sync {
    /// 检测循环依赖
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> ResolutionResult<()>;

    /// 构建依赖图
    fn build_dependency_graph(
        &self,
        bindings: &[(ServiceKey, BindingTarget)],
        types: &[&TypeRegistration],
    ) -> Vec<DependencyGraphNode>;
}

/// 默认循环依赖检测器
#[derive(Debug, Default)]
pub struct DefaultCircularDependencyDetector;

impl CircularDependencyDetector for DefaultCircularDependencyDetector {
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> ResolutionResult<()> {
        let index: HashMap<&str, &DependencyGraphNode> =
            graph.iter().map(|node| (node.key.as_str(), node)).collect();
        let mut visited = HashSet::new();
        let mut visiting = Vec::new();

        let mut roots: Vec<&DependencyGraphNode> = graph.iter().collect();
        roots.sort_by(|a, b| a.key.cmp(&b.key));

        for node in roots {
            if !visited.contains(node.key.as_str()) {
                Self::dfs_check(node.key.as_str(), &index, &mut visited, &mut visiting)?;
            }
        }

        Ok(())
    }

    fn build_dependency_graph(
        &self,
        bindings: &[(ServiceKey, BindingTarget)],
        types: &[&TypeRegistration],
    ) -> Vec<DependencyGraphNode> {
        // 绑定节点：抽象标识符 -> 具体标识符；工厂和实例的依赖不可见
        let binding_nodes = bindings.iter().map(|(key, target)| {
            let dependencies = match target {
                BindingTarget::Concrete(concrete) if concrete != key => vec![concrete.clone()],
                _ => Vec::new(),
            };
            DependencyGraphNode {
                key: key.clone(),
                dependencies,
            }
        });

        // 同名的绑定和具体类型合并为一个节点
        let mut merged: HashMap<ServiceKey, Vec<ServiceKey>> = HashMap::new();
        for node in binding_nodes {
            merged
                .entry(node.key)
                .or_default()
                .extend(node.dependencies);
        }
        for registration in types {
            merged
                .entry(registration.key.clone())
                .or_default()
                .extend(registration.dependencies().cloned());
        }

        merged
            .into_iter()
            .map(|(key, dependencies)| DependencyGraphNode { key, dependencies })
            .collect()
    }
}

impl DefaultCircularDependencyDetector {
    fn dfs_check<'g>(
        current: &'g str,
        index: &HashMap<&'g str, &'g DependencyGraphNode>,
        visited: &mut HashSet<&'g str>,
        visiting: &mut Vec<&'g str>,
    ) -> ResolutionResult<()> {
        if let Some(position) = visiting.iter().position(|key| *key == current) {
            let mut chain = visiting[position..].to_vec();
            chain.push(current);
            warn!("依赖图中存在循环: {}", chain.join(" -> "));
            return Err(ResolutionError::CircularDependency {
                chain: chain.join(" -> "),
            });
        }

        if visited.contains(current) {
            return Ok(());
        }

        visiting.push(current);

        if let Some(node) = index.get(current).copied() {
            for dependency in &node.dependencies {
                Self::dfs_check(dependency.as_str(), index, visited, visiting)?;
            }
        }

        visiting.pop();
        visited.insert(current);

        Ok(())
    }
}
