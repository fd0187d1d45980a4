//! # DI Common
//!
//! 绑定容器各层共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`ServiceKey`] - 抽象标识符（接口名、契约名或具体类型名）
//! - [`Parameter`] - 构造函数参数声明
//! - [`Lifetime`] - 绑定的生命周期（瞬时 / 单例）
//! - [`ResolutionError`] - 解析失败时返回的错误
//!
//! ## 设计原则
//!
//! - 没有运行时反射，构造参数由注册方显式声明
//! - 没有全局状态，所有绑定都属于一个显式的容器对象

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
