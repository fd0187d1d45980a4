//! 解析结果与构造参数
//!
//! [`Instance`] 保存一个已创建的对象及其所有可用视图：具体类型本身，
//! 以及注册时声明的接口视图（例如 `Arc<dyn PaymentMethod>`）。

use di_common::{ResolutionError, ResolutionResult, ServiceKey};
use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

type ViewMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

struct InstanceInner {
    type_name: ServiceKey,
    views: ViewMap,
}

/// 类型擦除后的实例
///
/// 克隆只增加引用计数，单例绑定返回的所有克隆指向同一个对象。
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    /// 使用具体值创建实例，只包含具体类型视图
    pub fn new<T>(type_name: impl Into<ServiceKey>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self::builder(type_name).view(Arc::new(value)).build()
    }

    /// 创建实例构建器
    pub fn builder(type_name: impl Into<ServiceKey>) -> InstanceBuilder {
        InstanceBuilder {
            type_name: type_name.into(),
            views: HashMap::new(),
        }
    }

    /// 创建实例的具体类型标识符
    pub fn type_name(&self) -> &ServiceKey {
        &self.inner.type_name
    }

    /// 以 `T` 视图获取实例，`T` 可以是具体类型或 `dyn Trait`
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner
            .views
            .get(&TypeId::of::<Arc<T>>())
            .and_then(|view| (**view).downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// 以 `T` 视图获取实例，视图不存在时返回类型不匹配错误
    pub fn require<T>(&self) -> ResolutionResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.get::<T>() {
            Some(value) => Ok(value),
            None => Err(ResolutionError::TypeMismatch {
                key: self.inner.type_name.clone(),
                expected: std::any::type_name::<T>(),
            }),
        }
    }

    /// 是否与另一个实例指向同一个对象
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.inner.type_name)
            .field("views", &self.inner.views.len())
            .finish()
    }
}

/// 实例构建器
pub struct InstanceBuilder {
    type_name: ServiceKey,
    views: ViewMap,
}

impl InstanceBuilder {
    /// 添加一个视图，同一类型的视图后添加者覆盖先添加者
    pub fn view<T>(mut self, view: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.views.insert(TypeId::of::<Arc<T>>(), Box::new(view));
        self
    }

    /// 构建实例
    pub fn build(self) -> Instance {
        Instance {
            inner: Arc::new(InstanceInner {
                type_name: self.type_name,
                views: self.views,
            }),
        }
    }
}

/// 按声明顺序传给构造函数的已解析参数
#[derive(Debug)]
pub struct Arguments {
    owner: ServiceKey,
    values: VecDeque<(ServiceKey, Instance)>,
}

impl Arguments {
    /// 创建参数列表
    pub fn new(owner: impl Into<ServiceKey>, values: Vec<(ServiceKey, Instance)>) -> Self {
        Self {
            owner: owner.into(),
            values: values.into(),
        }
    }

    /// 剩余参数个数
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// 取出下一个参数，并以 `T` 视图返回
    pub fn next<T>(&mut self) -> ResolutionResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let (key, instance) = self.next_instance()?;
        match instance.get::<T>() {
            Some(value) => Ok(value),
            None => Err(ResolutionError::TypeMismatch {
                key,
                expected: std::any::type_name::<T>(),
            }),
        }
    }

    /// 取出下一个未转换的参数
    pub fn next_instance(&mut self) -> ResolutionResult<(ServiceKey, Instance)> {
        match self.values.pop_front() {
            Some(argument) => Ok(argument),
            None => Err(ResolutionError::not_instantiable(
                self.owner.clone(),
                "构造函数读取的参数多于声明的参数",
            )),
        }
    }
}
