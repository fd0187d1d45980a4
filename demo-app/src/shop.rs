//! 演示用的支付、运费和通知服务

use di_common::{RegistrationResult, ResolutionError};
use di_composition::ServiceProvider;
use di_impl::prelude::*;
use std::sync::Arc;

/// 支付方式
pub trait PaymentMethod: Send + Sync {
    /// 支付方式名称
    fn name(&self) -> &'static str;
    /// 完成支付，返回交易描述
    fn pay(&self, amount: f64) -> String;
}

/// 运费计算
pub trait ShippingCalculator: Send + Sync {
    /// 按重量计算运费
    fn cost(&self, weight_kg: f64) -> f64;
}

/// 通知渠道
pub trait Notifier: Send + Sync {
    /// 发送通知，返回发送记录
    fn send(&self, message: &str) -> String;
}

/// 信用卡支付
pub struct CreditCardPayment;

impl PaymentMethod for CreditCardPayment {
    fn name(&self) -> &'static str {
        "credit-card"
    }

    fn pay(&self, amount: f64) -> String {
        format!("信用卡支付 {:.2} 元", amount)
    }
}

/// bKash 移动支付
pub struct BkashPayment;

impl PaymentMethod for BkashPayment {
    fn name(&self) -> &'static str {
        "bkash"
    }

    fn pay(&self, amount: f64) -> String {
        format!("bKash 支付 {:.2} 元", amount)
    }
}

/// Nagad 移动支付
pub struct NagadPayment;

impl PaymentMethod for NagadPayment {
    fn name(&self) -> &'static str {
        "nagad"
    }

    fn pay(&self, amount: f64) -> String {
        format!("Nagad 支付 {:.2} 元", amount)
    }
}

/// 店铺信息，以实例绑定注册
#[derive(Debug, Clone)]
pub struct StoreProfile {
    /// 店铺名称
    pub name: String,
    /// 每公斤基础运费
    pub base_rate: f64,
}

/// 标准运费
pub struct StandardShipping {
    rate: f64,
}

impl ShippingCalculator for StandardShipping {
    fn cost(&self, weight_kg: f64) -> f64 {
        self.rate * weight_kg
    }
}

/// 加急运费
pub struct ExpressShipping {
    rate: f64,
    surcharge: f64,
}

impl ShippingCalculator for ExpressShipping {
    fn cost(&self, weight_kg: f64) -> f64 {
        self.rate * weight_kg * 1.5 + self.surcharge
    }
}

/// 邮件通知
pub struct EmailNotifier;

impl Notifier for EmailNotifier {
    fn send(&self, message: &str) -> String {
        format!("[email] {}", message)
    }
}

/// 短信通知
pub struct SmsNotifier;

impl Notifier for SmsNotifier {
    fn send(&self, message: &str) -> String {
        format!("[sms] {}", message)
    }
}

/// 结账控制器
pub struct CheckoutController {
    payment: Arc<dyn PaymentMethod>,
    notifier: Arc<dyn Notifier>,
}

impl CheckoutController {
    /// 当前使用的支付方式
    pub fn payment_method(&self) -> &'static str {
        self.payment.name()
    }

    /// 结账并通知
    pub fn checkout(&self, amount: f64) -> Vec<String> {
        let receipt = self.payment.pay(amount);
        let notice = self.notifier.send(&receipt);
        vec![receipt, notice]
    }
}

/// 运费控制器
pub struct ShippingController {
    calculator: Arc<dyn ShippingCalculator>,
}

impl ShippingController {
    /// 报价
    pub fn quote(&self, weight_kg: f64) -> f64 {
        self.calculator.cost(weight_kg)
    }
}

/// 通知控制器
pub struct NotificationController {
    notifier: Arc<dyn Notifier>,
}

impl NotificationController {
    /// 通知发货
    pub fn shipped(&self, order_id: u32) -> String {
        self.notifier.send(&format!("订单 {} 已发货", order_id))
    }
}

/// 商店服务提供者
pub struct ShopServiceProvider {
    profile: StoreProfile,
}

impl ShopServiceProvider {
    /// 创建服务提供者
    pub fn new(profile: StoreProfile) -> Self {
        Self { profile }
    }
}

impl ServiceProvider for ShopServiceProvider {
    fn name(&self) -> &str {
        "shop"
    }

    fn register(&self, container: &mut Container) -> RegistrationResult<()> {
        for contract in ["PaymentInterface", "ShippingInterface", "NotifierInterface"] {
            container.register_contract(contract)?;
        }

        container.register_type(
            ConcreteType::<CreditCardPayment>::new("CreditCardPayment")
                .constructor(|_| Ok(CreditCardPayment))
                .provides(|p| p as Arc<dyn PaymentMethod>),
        )?;
        container.register_type(
            ConcreteType::<BkashPayment>::new("BkashPayment")
                .constructor(|_| Ok(BkashPayment))
                .provides(|p| p as Arc<dyn PaymentMethod>),
        )?;
        container.register_type(
            ConcreteType::<NagadPayment>::new("NagadPayment")
                .constructor(|_| Ok(NagadPayment))
                .provides(|p| p as Arc<dyn PaymentMethod>),
        )?;

        container.register_type(
            ConcreteType::<StandardShipping>::new("StandardShipping")
                .depends_on("StoreProfile")
                .constructor(|args| {
                    let profile = args.next::<StoreProfile>()?;
                    Ok(StandardShipping {
                        rate: profile.base_rate,
                    })
                })
                .provides(|s| s as Arc<dyn ShippingCalculator>),
        )?;

        container.register_type(
            ConcreteType::<EmailNotifier>::new("EmailNotifier")
                .constructor(|_| Ok(EmailNotifier))
                .provides(|n| n as Arc<dyn Notifier>),
        )?;
        container.register_type(
            ConcreteType::<SmsNotifier>::new("SmsNotifier")
                .constructor(|_| Ok(SmsNotifier))
                .provides(|n| n as Arc<dyn Notifier>),
        )?;

        container.register_type(
            ConcreteType::<CheckoutController>::new("CheckoutController")
                .depends_on("PaymentInterface")
                .depends_on("NotifierInterface")
                .constructor(|args| {
                    Ok(CheckoutController {
                        payment: args.next::<dyn PaymentMethod>()?,
                        notifier: args.next::<dyn Notifier>()?,
                    })
                }),
        )?;
        container.register_type(
            ConcreteType::<ShippingController>::new("ShippingController")
                .depends_on("ShippingInterface")
                .constructor(|args| {
                    Ok(ShippingController {
                        calculator: args.next::<dyn ShippingCalculator>()?,
                    })
                }),
        )?;

        container.register_type(
            ConcreteType::<NotificationController>::new("NotificationController")
                .depends_on("NotifierInterface")
                .constructor(|args| {
                    Ok(NotificationController {
                        notifier: args.next::<dyn Notifier>()?,
                    })
                }),
        )?;

        container.instance(
            "StoreProfile",
            Instance::new("StoreProfile", self.profile.clone()),
        );

        // 加急运费没有固定的构造参数列表，由工厂读取店铺信息
        container.bind_factory("ExpressShipping", |resolver| {
            let profile = resolver.resolve_as::<StoreProfile>("StoreProfile")?;
            if profile.base_rate <= 0.0 {
                return Err(ResolutionError::factory_failed(
                    "ExpressShipping",
                    "基础运费必须为正数",
                ));
            }
            let shipping: Arc<dyn ShippingCalculator> = Arc::new(ExpressShipping {
                rate: profile.base_rate,
                surcharge: 20.0,
            });
            Ok(Instance::builder("ExpressShipping").view(shipping).build())
        });

        container.bind("PaymentInterface", "CreditCardPayment");
        container.bind("ShippingInterface", "StandardShipping");
        container.singleton("NotifierInterface", "EmailNotifier");
        Ok(())
    }
}
