//! 具体类型注册与工厂
//!
//! 没有运行时反射，具体类型通过 [`ConcreteType`] 显式声明构造参数列表
//! 和构造函数；抽象标识符也可以直接绑定到 [`FactoryFn`]。

use crate::instance::{Arguments, Instance, InstanceBuilder};
use crate::resolver::Resolving;
use di_common::{
    Parameter, RegistrationError, RegistrationResult, ResolutionError, ResolutionResult,
    ServiceKey, TypeInfo,
};
use std::sync::Arc;
use tracing::debug;

/// 工厂函数类型
pub type FactoryFn = Arc<dyn Fn(&mut Resolving<'_>) -> ResolutionResult<Instance> + Send + Sync>;

/// 类型擦除后的构造函数
pub type ConstructorFn = Arc<dyn Fn(Arguments) -> ResolutionResult<Instance> + Send + Sync>;

type TypedConstructor<T> = Box<dyn Fn(&mut Arguments) -> ResolutionResult<T> + Send + Sync>;
type ViewFn<T> = Box<dyn Fn(&Arc<T>, InstanceBuilder) -> InstanceBuilder + Send + Sync>;

/// 具体类型注册构建器
///
/// ```
/// use di_abstractions::ConcreteType;
/// use std::sync::Arc;
///
/// trait Payment: Send + Sync {}
/// struct CreditCard;
/// impl Payment for CreditCard {}
///
/// let registration = ConcreteType::<CreditCard>::new("CreditCardPayment")
///     .constructor(|_| Ok(CreditCard))
///     .provides(|c| c as Arc<dyn Payment>)
///     .into_registration()
///     .unwrap();
/// assert!(registration.parameters.is_empty());
/// ```
pub struct ConcreteType<T> {
    key: ServiceKey,
    parameters: Vec<Parameter>,
    constructor: Option<TypedConstructor<T>>,
    views: Vec<ViewFn<T>>,
}

impl<T> ConcreteType<T>
where
    T: Send + Sync + 'static,
{
    /// 创建新的具体类型注册
    pub fn new(key: impl Into<ServiceKey>) -> Self {
        Self {
            key: key.into(),
            parameters: Vec::new(),
            constructor: None,
            views: Vec::new(),
        }
    }

    /// 声明一个服务参数
    pub fn depends_on(mut self, key: impl Into<ServiceKey>) -> Self {
        self.parameters.push(Parameter::service(key));
        self
    }

    /// 声明一个标量参数
    pub fn scalar(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::scalar(name, type_name));
        self
    }

    /// 设置构造函数，参数按声明顺序传入
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&mut Arguments) -> ResolutionResult<T> + Send + Sync + 'static,
    {
        self.constructor = Some(Box::new(constructor));
        self
    }

    /// 声明该类型可以作为 `I` 使用
    pub fn provides<I, F>(mut self, cast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        let view: ViewFn<T> = Box::new(move |value: &Arc<T>, builder: InstanceBuilder| {
            builder.view(cast(value.clone()))
        });
        self.views.push(view);
        self
    }

    /// 生成类型擦除后的注册信息
    pub fn into_registration(self) -> RegistrationResult<TypeRegistration> {
        if self.key.is_empty() {
            return Err(RegistrationError::EmptyKey);
        }
        let Some(constructor) = self.constructor else {
            return Err(RegistrationError::MissingConstructor { key: self.key });
        };
        let views = self.views;
        let key = self.key.clone();
        debug!(
            "生成具体类型注册: {} ({} 个参数, {} 个视图)",
            key,
            self.parameters.len(),
            views.len()
        );

        let erased: ConstructorFn =
            Arc::new(move |mut args: Arguments| -> ResolutionResult<Instance> {
                let value = Arc::new(constructor(&mut args)?);
                if args.remaining() > 0 {
                    return Err(ResolutionError::not_instantiable(
                        key.clone(),
                        format!("构造函数遗留了 {} 个未使用的参数", args.remaining()),
                    ));
                }
                let initial = Instance::builder(key.clone()).view(value.clone());
                let builder = views
                    .iter()
                    .fold(initial, |builder, view| view(&value, builder));
                Ok(builder.build())
            });

        Ok(TypeRegistration {
            key: self.key,
            type_info: TypeInfo::of::<T>(),
            parameters: self.parameters,
            constructor: erased,
        })
    }
}

/// 具体类型注册信息
#[derive(Clone)]
pub struct TypeRegistration {
    /// 具体类型标识符
    pub key: ServiceKey,
    /// Rust 类型信息
    pub type_info: TypeInfo,
    /// 构造参数，按声明顺序
    pub parameters: Vec<Parameter>,
    constructor: ConstructorFn,
}

impl TypeRegistration {
    /// 使用已解析的参数调用构造函数
    pub fn construct(&self, args: Arguments) -> ResolutionResult<Instance> {
        (self.constructor)(args)
    }

    /// 依赖的服务标识符
    pub fn dependencies(&self) -> impl Iterator<Item = &ServiceKey> {
        self.parameters.iter().filter_map(Parameter::service_key)
    }
}

impl std::fmt::Debug for TypeRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistration")
            .field("key", &self.key)
            .field("type_info", &self.type_info.module_path)
            .field("parameters", &self.parameters)
            .field("constructor", &"<function>")
            .finish()
    }
}
