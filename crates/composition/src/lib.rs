//! # 容器组合层
//!
//! 负责把服务提供者、绑定清单和环境变量组合成一个可共享的容器。
//!
//! ## 主要功能
//!
//! - **容器启动器**: 使用构建者模式组装容器
//! - **绑定清单**: 从 TOML / JSON 文件和环境变量加载绑定
//! - **日志初始化**: 基于 `tracing-subscriber` 的开发和生产预设
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_composition::{ContainerBootstrapper, LoggingConfig};
//! use di_impl::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = ContainerBootstrapper::new()
//!         .with_logging(LoggingConfig::development())
//!         .add_manifest_file("bindings.toml")?
//!         .with_env_prefix("CHECKOUT")
//!         .build()?;
//!
//!     let payment = container.resolve("PaymentInterface")?;
//!     println!("支付方式: {}", payment.type_name());
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod logging;
pub mod manifest;

pub use bootstrapper::{ContainerBootstrapper, ServiceProvider};
pub use logging::{init_logging, LoggingConfig};
pub use manifest::{BindingManifest, ContainerSection};

#[cfg(test)]
mod tests;
