//! # 绑定容器具体实现
//!
//! 提供 [`Container`]：绑定表 + 具体类型表 + 递归构造解析器。
//!
//! 解析规则：
//!
//! 1. 标识符绑定到工厂：调用工厂并返回结果
//! 2. 标识符绑定到具体标识符：若两者不同则继续解析具体标识符，
//!    否则按其注册的参数列表构造
//! 3. 标识符绑定到实例：返回共享实例
//! 4. 未绑定：若是已注册的具体类型则直接构造，否则返回
//!    [`ResolutionError::UnresolvableBinding`]

use chrono::{DateTime, Utc};
use di_abstractions::{
    Arguments, BindingRegistry, BindingTarget, CircularDependencyDetector, ConcreteType,
    ContainerConfig, ContainerStats, DefaultCircularDependencyDetector, Instance, ResolveContext,
    ResolveOptions, Resolver, Resolving, TypeRegistration,
};
use di_common::{
    BindingDescriptor, Lifetime, Parameter, RegistrationError, RegistrationResult,
    ResolutionError, ResolutionResult, ServiceKey,
};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 常用类型
pub mod prelude {
    pub use crate::Container;
    pub use di_abstractions::{
        BindingRegistry, ConcreteType, ContainerConfig, Instance, Resolver, Resolving,
    };
    pub use di_common::{Lifetime, ResolutionError, ResolutionResult, ServiceKey};
}

/// 绑定表中的一项
struct Binding {
    target: BindingTarget,
    lifetime: Lifetime,
    /// 单例缓存，重新绑定时随旧绑定一起丢弃
    shared: OnceCell<Instance>,
    registered_at: DateTime<Utc>,
}

impl Binding {
    fn new(target: BindingTarget, lifetime: Lifetime) -> Self {
        Self {
            target,
            lifetime,
            shared: OnceCell::new(),
            registered_at: Utc::now(),
        }
    }

    /// 由容器创建并缓存的单例，不含实例绑定
    fn is_constructed_singleton(&self) -> bool {
        self.lifetime.is_shared()
            && !matches!(self.target, BindingTarget::Instance(_))
            && self.shared.get().is_some()
    }
}

#[derive(Debug, Default)]
struct ResolutionCounters {
    resolutions: u64,
    errors: u64,
}

/// 绑定容器
///
/// 注册阶段通过 `&mut self` 完成；放进 `Arc` 共享后只能解析，
/// 这保证了所有注册都先于任何并发解析发生。
pub struct Container {
    config: ContainerConfig,
    bindings: HashMap<ServiceKey, Binding>,
    types: HashMap<ServiceKey, TypeRegistration>,
    contracts: HashSet<ServiceKey>,
    counters: Mutex<ResolutionCounters>,
}

impl Container {
    /// 创建新的容器
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 使用指定配置创建容器
    ///
    /// 最大解析深度至少为 1，配置为 0 时按 1 处理
    pub fn with_config(mut config: ContainerConfig) -> Self {
        if config.max_resolution_depth == 0 {
            warn!("最大解析深度不能为 0，已调整为 1");
            config.max_resolution_depth = 1;
        }
        Self {
            config,
            bindings: HashMap::new(),
            types: HashMap::new(),
            contracts: HashSet::new(),
            counters: Mutex::new(ResolutionCounters::default()),
        }
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 容器统计信息
    pub fn stats(&self) -> ContainerStats {
        let counters = self.counters.lock();
        ContainerStats {
            registered_bindings: self.bindings.len(),
            registered_types: self.types.len(),
            active_singletons: self
                .bindings
                .values()
                .filter(|binding| binding.is_constructed_singleton())
                .count(),
            resolutions: counters.resolutions,
            resolution_errors: counters.errors,
        }
    }

    /// 静态验证容器
    ///
    /// 不创建任何实例，检查：具体类型的参数是否都可解析、绑定目标是否存在、
    /// 是否存在循环依赖。工厂内部的依赖不可见，不在检查范围内。
    pub fn validate(&self) -> Result<(), Vec<ResolutionError>> {
        info!("验证容器状态");
        let mut errors = Vec::new();

        let mut type_keys: Vec<&ServiceKey> = self.types.keys().collect();
        type_keys.sort();
        for key in type_keys {
            for parameter in &self.types[key].parameters {
                match parameter {
                    Parameter::Scalar { name, type_name } => {
                        errors.push(ResolutionError::not_instantiable(
                            key,
                            format!("无法自动解析标量参数 {}: {}", name, type_name),
                        ));
                    }
                    Parameter::Service(dependency) if !self.has(dependency) => {
                        errors.push(ResolutionError::not_instantiable_because(
                            key,
                            format!("参数 {} 无法解析", dependency),
                            ResolutionError::UnresolvableBinding {
                                key: dependency.clone(),
                            },
                        ));
                    }
                    Parameter::Service(_) => {}
                }
            }
        }

        let mut binding_keys: Vec<&ServiceKey> = self.bindings.keys().collect();
        binding_keys.sort();
        for key in &binding_keys {
            if let BindingTarget::Concrete(concrete) = &self.bindings[*key].target {
                if concrete == *key && !self.types.contains_key(concrete) {
                    errors.push(ResolutionError::not_instantiable(
                        concrete,
                        "绑定到自身但没有注册构造函数",
                    ));
                } else if concrete != *key && !self.has(concrete) {
                    errors.push(ResolutionError::UnresolvableBinding {
                        key: concrete.clone(),
                    });
                }
            }
        }

        let detector = DefaultCircularDependencyDetector;
        let bindings: Vec<(ServiceKey, BindingTarget)> = binding_keys
            .iter()
            .map(|key| ((*key).clone(), self.bindings[*key].target.clone()))
            .collect();
        let types: Vec<&TypeRegistration> = self.types.values().collect();
        let graph = detector.build_dependency_graph(&bindings, &types);
        if let Err(error) = detector.detect_circular_dependencies(&graph) {
            errors.push(error);
        }

        if errors.is_empty() {
            info!(
                "容器验证通过: {} 个绑定, {} 个具体类型",
                self.bindings.len(),
                self.types.len()
            );
            Ok(())
        } else {
            warn!("容器验证失败: {} 个问题", errors.len());
            Err(errors)
        }
    }

    fn insert_binding(&mut self, key: &str, binding: Binding) {
        info!(
            "注册绑定: {} -> {} ({})",
            key,
            binding.target.kind(),
            binding.lifetime
        );
        if let Some(previous) = self.bindings.insert(ServiceKey::from(key), binding) {
            if self.config.warn_on_rebind {
                warn!("覆盖已有绑定: {} (原目标 {})", key, previous.target.kind());
            }
        }
    }

    fn record(&self, key: &str, result: &ResolutionResult<Instance>) {
        let mut counters = self.counters.lock();
        match result {
            Ok(_) => counters.resolutions += 1,
            Err(error) => {
                counters.errors += 1;
                debug!("解析失败: {}, 原因: {}", key, error);
            }
        }
    }

    fn resolve_entry(&self, key: &str, context: &mut ResolveContext) -> ResolutionResult<Instance> {
        if let Some(binding) = self.bindings.get(key) {
            return match binding.lifetime {
                Lifetime::Singleton => binding
                    .shared
                    .get_or_try_init(|| self.produce(key, &binding.target, context))
                    .map(Instance::clone),
                Lifetime::Transient => self.produce(key, &binding.target, context),
            };
        }

        if self.types.contains_key(key) {
            return self.build(key, context);
        }

        Err(ResolutionError::UnresolvableBinding {
            key: ServiceKey::from(key),
        })
    }

    fn produce(
        &self,
        key: &str,
        target: &BindingTarget,
        context: &mut ResolveContext,
    ) -> ResolutionResult<Instance> {
        match target {
            BindingTarget::Instance(instance) => Ok(instance.clone()),
            BindingTarget::Factory(factory) => {
                debug!("调用工厂: {}", key);
                let mut resolving = Resolving::new(self, context);
                factory(&mut resolving)
            }
            BindingTarget::Concrete(concrete) if concrete == key => self.build(key, context),
            BindingTarget::Concrete(concrete) => self.resolve_with(concrete, context),
        }
    }

    /// 按注册的参数列表构造具体类型
    fn build(&self, key: &str, context: &mut ResolveContext) -> ResolutionResult<Instance> {
        let Some(registration) = self.types.get(key) else {
            let reason = if self.contracts.contains(key) {
                "抽象契约没有绑定任何实现"
            } else {
                "没有注册构造函数"
            };
            return Err(ResolutionError::not_instantiable(key, reason));
        };

        let mut values = Vec::with_capacity(registration.parameters.len());
        for parameter in &registration.parameters {
            match parameter {
                Parameter::Scalar { name, type_name } => {
                    return Err(ResolutionError::not_instantiable(
                        key,
                        format!("无法自动解析标量参数 {}: {}", name, type_name),
                    ));
                }
                Parameter::Service(dependency) => {
                    let instance = self.resolve_with(dependency, context).map_err(|error| {
                        if error.is_chain_failure() {
                            error
                        } else {
                            ResolutionError::not_instantiable_because(
                                key,
                                format!("参数 {} 无法解析", dependency),
                                error,
                            )
                        }
                    })?;
                    values.push((dependency.clone(), instance));
                }
            }
        }

        let instance = registration
            .construct(Arguments::new(registration.key.clone(), values))
            .map_err(|error| match error {
                ResolutionError::NotInstantiable { .. } => error,
                other => ResolutionError::not_instantiable_because(key, "构造函数执行失败", other),
            })?;
        debug!("创建实例: {}", key);
        Ok(instance)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.config)
            .field("bindings", &self.bindings.len())
            .field("types", &self.types.len())
            .field("contracts", &self.contracts.len())
            .finish()
    }
}

impl BindingRegistry for Container {
    fn bind(&mut self, abstract_key: &str, concrete_key: &str) {
        let target = BindingTarget::Concrete(ServiceKey::from(concrete_key));
        self.insert_binding(abstract_key, Binding::new(target, Lifetime::Transient));
    }

    fn bind_factory<F>(&mut self, abstract_key: &str, factory: F)
    where
        F: Fn(&mut Resolving<'_>) -> ResolutionResult<Instance> + Send + Sync + 'static,
    {
        let target = BindingTarget::Factory(Arc::new(factory));
        self.insert_binding(abstract_key, Binding::new(target, Lifetime::Transient));
    }

    fn singleton(&mut self, abstract_key: &str, concrete_key: &str) {
        let target = BindingTarget::Concrete(ServiceKey::from(concrete_key));
        self.insert_binding(abstract_key, Binding::new(target, Lifetime::Singleton));
    }

    fn singleton_factory<F>(&mut self, abstract_key: &str, factory: F)
    where
        F: Fn(&mut Resolving<'_>) -> ResolutionResult<Instance> + Send + Sync + 'static,
    {
        let target = BindingTarget::Factory(Arc::new(factory));
        self.insert_binding(abstract_key, Binding::new(target, Lifetime::Singleton));
    }

    fn instance(&mut self, abstract_key: &str, instance: Instance) {
        let mut binding = Binding::new(
            BindingTarget::Instance(instance.clone()),
            Lifetime::Singleton,
        );
        binding.shared = OnceCell::with_value(instance);
        self.insert_binding(abstract_key, binding);
    }

    fn register_type<T>(&mut self, concrete: ConcreteType<T>) -> RegistrationResult<()>
    where
        T: Send + Sync + 'static,
    {
        let registration = concrete.into_registration()?;
        if self.contracts.contains(&registration.key) {
            return Err(RegistrationError::ContractConflict {
                key: registration.key,
            });
        }

        info!(
            "注册具体类型: {} ({}, {} 个参数)",
            registration.key,
            registration.type_info.module_path,
            registration.parameters.len()
        );
        self.types.insert(registration.key.clone(), registration);
        Ok(())
    }

    fn register_contract(&mut self, key: &str) -> RegistrationResult<()> {
        if key.is_empty() {
            return Err(RegistrationError::EmptyKey);
        }
        if self.types.contains_key(key) {
            return Err(RegistrationError::ConcreteConflict {
                key: ServiceKey::from(key),
            });
        }

        debug!("声明抽象契约: {}", key);
        self.contracts.insert(ServiceKey::from(key));
        Ok(())
    }

    fn forget(&mut self, key: &str) -> bool {
        let removed = self.bindings.remove(key).is_some();
        if removed {
            info!("移除绑定: {}", key);
        }
        removed
    }

    fn is_bound(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    fn has(&self, key: &str) -> bool {
        self.bindings.contains_key(key) || self.types.contains_key(key)
    }

    fn bindings(&self) -> Vec<BindingDescriptor> {
        let mut descriptors: Vec<BindingDescriptor> = self
            .bindings
            .iter()
            .map(|(key, binding)| BindingDescriptor {
                key: key.clone(),
                kind: binding.target.kind(),
                lifetime: binding.lifetime,
                resolved: binding.shared.get().is_some(),
                registered_at: binding.registered_at,
            })
            .collect();
        descriptors.sort_by(|a, b| a.key.cmp(&b.key));
        descriptors
    }
}

impl Resolver for Container {
    fn resolve_with(&self, key: &str, context: &mut ResolveContext) -> ResolutionResult<Instance> {
        context.enter(key)?;
        debug!("解析服务: {} (深度 {})", key, context.depth());
        let result = self.resolve_entry(key, context);
        context.exit();
        result
    }

    fn resolve_options(&self) -> ResolveOptions {
        self.config.resolve_options()
    }

    fn resolve(&self, key: &str) -> ResolutionResult<Instance> {
        let mut context = ResolveContext::new(self.resolve_options());
        let result = self.resolve_with(key, &mut context);
        self.record(key, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    #[derive(Debug)]
    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            42
        }
    }

    struct Scheduler {
        clock: Arc<dyn Clock>,
    }

    fn container() -> Container {
        let mut container = Container::new();
        container
            .register_type(
                ConcreteType::<FixedClock>::new("FixedClock")
                    .constructor(|_| Ok(FixedClock))
                    .provides(|c| c as Arc<dyn Clock>),
            )
            .unwrap();
        container
            .register_type(
                ConcreteType::<Scheduler>::new("Scheduler")
                    .depends_on("ClockInterface")
                    .constructor(|args| {
                        Ok(Scheduler {
                            clock: args.next::<dyn Clock>()?,
                        })
                    }),
            )
            .unwrap();
        container.register_contract("ClockInterface").unwrap();
        container
    }

    #[test]
    fn bound_contract_resolves_through_concrete() {
        let mut container = container();
        container.bind("ClockInterface", "FixedClock");

        let scheduler = container.resolve_as::<Scheduler>("Scheduler").unwrap();
        assert_eq!(scheduler.clock.now(), 42);
    }

    #[test]
    fn binding_chains_are_followed() {
        let mut container = container();
        container.bind("ClockInterface", "DefaultClock");
        container.bind("DefaultClock", "FixedClock");

        let instance = container.resolve("ClockInterface").unwrap();
        assert_eq!(instance.type_name(), "FixedClock");
    }

    #[test]
    fn singleton_is_cached_until_forgotten() {
        let mut container = container();
        container.singleton("ClockInterface", "FixedClock");

        let first = container.resolve("ClockInterface").unwrap();
        let second = container.resolve("ClockInterface").unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(container.stats().active_singletons, 1);

        assert!(container.forget("ClockInterface"));
        assert!(!container.is_bound("ClockInterface"));
        assert!(container
            .resolve("ClockInterface")
            .unwrap_err()
            .is_unresolvable_binding());
    }

    #[test]
    fn transient_factory_runs_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut container = Container::new();
        container.bind_factory("Counter", move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Instance::new("Counter", n))
        });

        assert_eq!(*container.resolve_as::<usize>("Counter").unwrap(), 0);
        assert_eq!(*container.resolve_as::<usize>("Counter").unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn factory_can_resolve_its_own_dependencies() {
        let mut container = container();
        container.bind("ClockInterface", "FixedClock");
        container.bind_factory("Timestamp", |resolving| {
            let clock = resolving.resolve_as::<dyn Clock>("ClockInterface")?;
            Ok(Instance::new("Timestamp", clock.now()))
        });

        assert_eq!(*container.resolve_as::<u64>("Timestamp").unwrap(), 42);
    }

    #[test]
    fn instance_binding_returns_the_same_object() {
        let mut container = Container::new();
        let shared = Instance::new("Config", String::from("prod"));
        container.instance("Config", shared.clone());

        assert!(container.resolve("Config").unwrap().ptr_eq(&shared));
        assert!(container.bindings()[0].resolved);
    }

    #[test]
    fn instance_bindings_are_not_counted_as_active_singletons() {
        let mut container = container();
        container.instance("Config", Instance::new("Config", String::from("prod")));
        container.singleton("ClockInterface", "FixedClock");
        assert_eq!(container.stats().active_singletons, 0);

        container.resolve("ClockInterface").unwrap();
        container.resolve("Config").unwrap();
        assert_eq!(container.stats().active_singletons, 1);
    }

    #[test]
    fn zero_max_depth_is_raised_to_one() {
        let mut container =
            Container::with_config(ContainerConfig::default().with_max_resolution_depth(0));
        assert_eq!(container.config().max_resolution_depth, 1);

        container
            .register_type(
                ConcreteType::<FixedClock>::new("FixedClock")
                    .constructor(|_| Ok(FixedClock)),
            )
            .unwrap();
        container.bind("ClockInterface", "FixedClock");
        assert!(container.resolve("FixedClock").is_ok());
        assert!(matches!(
            container.resolve("ClockInterface").unwrap_err(),
            ResolutionError::DepthExceeded { max_depth: 1, .. }
        ));
    }

    #[test]
    fn contract_and_concrete_names_do_not_overlap() {
        let mut container = container();
        let error = container
            .register_type(
                ConcreteType::<FixedClock>::new("ClockInterface")
                    .constructor(|_| Ok(FixedClock)),
            )
            .unwrap_err();
        assert!(matches!(error, RegistrationError::ContractConflict { .. }));
        assert!(matches!(
            container.register_contract("FixedClock").unwrap_err(),
            RegistrationError::ConcreteConflict { .. }
        ));
    }

    #[test]
    fn self_binding_builds_the_registered_type() {
        let mut container = container();
        container.bind("FixedClock", "FixedClock");
        assert_eq!(
            container.resolve("FixedClock").unwrap().type_name(),
            "FixedClock"
        );
    }

    #[test]
    fn stats_count_top_level_resolutions() {
        let mut container = container();
        container.bind("ClockInterface", "FixedClock");
        container.resolve("Scheduler").unwrap();
        let _ = container.resolve("Missing");

        let stats = container.stats();
        assert_eq!(stats.resolutions, 1);
        assert_eq!(stats.resolution_errors, 1);
        assert_eq!(stats.registered_types, 2);
        assert_eq!(stats.registered_bindings, 1);
    }

    #[test]
    fn depth_limit_applies_to_long_chains() {
        let mut container =
            Container::with_config(ContainerConfig::default().with_max_resolution_depth(2));
        container.bind("A", "B");
        container.bind("B", "C");
        container.bind("C", "FixedClock");

        assert!(matches!(
            container.resolve("A").unwrap_err(),
            ResolutionError::DepthExceeded { max_depth: 2, .. }
        ));
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut container = container();
        container
            .register_type(
                ConcreteType::<String>::new("ApiClient")
                    .scalar("api_key", "string")
                    .constructor(|_| Ok(String::new())),
            )
            .unwrap();
        container.bind("Loop", "Back");
        container.bind("Back", "Loop");

        let errors = container.validate().unwrap_err();
        // ApiClient 标量参数、Scheduler 缺少 ClockInterface 绑定、Loop 循环
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ResolutionError::CircularDependency { .. })));
    }

    #[test]
    fn validate_passes_for_complete_graph() {
        let mut container = container();
        container.bind("ClockInterface", "FixedClock");
        assert!(container.validate().is_ok());
    }
}
