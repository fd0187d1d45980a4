//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义绑定注册和递归解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`BindingRegistry`] - 绑定注册表接口
//! - [`Resolver`] - 解析器接口
//! - [`ConcreteType`] - 具体类型的显式注册（参数列表 + 构造函数）
//! - [`Instance`] - 类型擦除后的解析结果

pub mod container;
pub mod factory;
pub mod instance;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use factory::*;
pub use instance::*;
pub use registry::*;
pub use resolver::*;
