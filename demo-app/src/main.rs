//! # 结账演示
//!
//! 通过绑定容器组装支付、运费和通知服务，并演示换绑与并发解析

mod shop;

use anyhow::Context;
use clap::Parser;
use di_composition::{ContainerBootstrapper, LoggingConfig};
use di_impl::prelude::*;
use shop::{
    CheckoutController, NotificationController, ShippingController, ShopServiceProvider,
    StoreProfile,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "checkout-demo")]
#[command(about = "绑定容器结账演示")]
struct Args {
    /// 绑定清单路径 (TOML 或 JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 覆盖 PaymentInterface 绑定的具体类型
    #[arg(short, long)]
    payment: Option<String>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 输出 JSON 日志
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig::default()
        .with_level(parse_log_level(&args.log_level))
        .with_json_format(args.json_logs);

    let profile = StoreProfile {
        name: "Dhaka Books".to_string(),
        base_rate: 12.5,
    };
    let store_name = profile.name.clone();

    let mut bootstrapper = ContainerBootstrapper::new()
        .with_logging(logging)
        .add_provider(ShopServiceProvider::new(profile))
        .with_env_prefix("CHECKOUT");
    if let Some(path) = &args.config {
        bootstrapper = bootstrapper
            .add_manifest_file(path)
            .with_context(|| format!("加载绑定清单失败: {}", path.display()))?;
    }

    let mut container = bootstrapper.build_container()?;
    info!("启动结账演示: {}", store_name);

    // 命令行参数优先于清单和环境变量
    if let Some(payment) = &args.payment {
        container.bind("PaymentInterface", payment);
    }
    let container = Arc::new(container);

    let checkout = container.resolve_as::<CheckoutController>("CheckoutController")?;
    println!("支付方式: {}", checkout.payment_method());
    for line in checkout.checkout(1250.0) {
        println!("  {}", line);
    }

    let shipping = container.resolve_as::<ShippingController>("ShippingController")?;
    println!("3.2 公斤运费: {:.2}", shipping.quote(3.2));

    let notifications = container.resolve_as::<NotificationController>("NotificationController")?;
    println!("{}", notifications.shipped(1001));

    demonstrate_concurrent_resolution(Arc::clone(&container)).await?;

    let stats = container.stats();
    println!(
        "解析 {} 次, 失败 {} 次, 单例 {} 个",
        stats.resolutions, stats.resolution_errors, stats.active_singletons
    );
    Ok(())
}

/// 多个任务同时解析同一个单例通知渠道
async fn demonstrate_concurrent_resolution(container: Arc<Container>) -> anyhow::Result<()> {
    let mut handles = Vec::new();
    for order in 1..=4 {
        let container = Arc::clone(&container);
        handles.push(tokio::spawn(async move {
            let checkout = container.resolve_as::<CheckoutController>("CheckoutController")?;
            let notifier = container.resolve("NotifierInterface")?;
            let lines = checkout.checkout(order as f64 * 100.0);
            Ok::<_, ResolutionError>((notifier, lines))
        }));
    }

    let mut notifiers = Vec::new();
    for handle in handles {
        let (notifier, lines) = handle.await??;
        for line in lines {
            println!("  {}", line);
        }
        notifiers.push(notifier);
    }

    if let Some(first) = notifiers.first() {
        let shared = notifiers.iter().all(|n| n.ptr_eq(first));
        println!("通知渠道 ({}) 在任务间共享: {}", first.type_name(), shared);
    }
    Ok(())
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
