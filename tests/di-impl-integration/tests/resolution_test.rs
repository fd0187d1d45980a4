//! 容器解析行为的集成测试

use di_abstractions::{BindingRegistry, ConcreteType, ContainerConfig, Instance, Resolver};
use di_common::{BindingKind, Lifetime, ResolutionError};
use di_impl::Container;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait PaymentMethod: Send + Sync {
    fn name(&self) -> &'static str;
}

struct CreditCardPayment;

impl PaymentMethod for CreditCardPayment {
    fn name(&self) -> &'static str {
        "credit-card"
    }
}

struct NagadPayment;

impl PaymentMethod for NagadPayment {
    fn name(&self) -> &'static str {
        "nagad"
    }
}

struct CheckoutController {
    payment: Arc<dyn PaymentMethod>,
}

struct Mailer {
    id: usize,
}

fn shop() -> Container {
    let mut container = Container::new();
    container.register_contract("PaymentInterface").unwrap();
    container
        .register_type(
            ConcreteType::<CreditCardPayment>::new("CreditCardPayment")
                .constructor(|_| Ok(CreditCardPayment))
                .provides(|p| p as Arc<dyn PaymentMethod>),
        )
        .unwrap();
    container
        .register_type(
            ConcreteType::<NagadPayment>::new("NagadPayment")
                .constructor(|_| Ok(NagadPayment))
                .provides(|p| p as Arc<dyn PaymentMethod>),
        )
        .unwrap();
    container
        .register_type(
            ConcreteType::<CheckoutController>::new("CheckoutController")
                .depends_on("PaymentInterface")
                .constructor(|args| {
                    Ok(CheckoutController {
                        payment: args.next::<dyn PaymentMethod>()?,
                    })
                }),
        )
        .unwrap();
    container
}

/// 每次构造都分配新编号的 Mailer
fn register_counting_mailer(container: &mut Container) -> Arc<AtomicUsize> {
    let counter = Arc::new(AtomicUsize::new(0));
    let constructed = Arc::clone(&counter);
    container
        .register_type(ConcreteType::<Mailer>::new("Mailer").constructor(move |_| {
            Ok(Mailer {
                id: constructed.fetch_add(1, Ordering::SeqCst),
            })
        }))
        .unwrap();
    counter
}

#[test]
fn test_bound_key_resolves_to_concrete() {
    let mut container = shop();
    container.bind("PaymentInterface", "CreditCardPayment");

    let instance = container.resolve("PaymentInterface").unwrap();
    assert_eq!(instance.type_name(), "CreditCardPayment");
    assert!(instance.get::<CreditCardPayment>().is_some());
    assert_eq!(
        instance.require::<dyn PaymentMethod>().unwrap().name(),
        "credit-card"
    );
}

#[test]
fn test_zero_parameter_type_is_fresh_each_call() {
    let mut container = Container::new();
    let counter = register_counting_mailer(&mut container);

    let first = container.resolve_as::<Mailer>("Mailer").unwrap();
    let second = container.resolve_as::<Mailer>("Mailer").unwrap();

    assert_ne!(first.id, second.id);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unbound_abstract_parameter_is_not_instantiable() {
    let container = shop();

    match container.resolve("CheckoutController").unwrap_err() {
        ResolutionError::NotInstantiable {
            type_name, source, ..
        } => {
            assert_eq!(type_name, "CheckoutController");
            let source = source.expect("missing underlying error");
            assert!(source.is_unresolvable_binding());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_key_is_unresolvable() {
    let container = shop();

    match container.resolve("ShippingInterface").unwrap_err() {
        ResolutionError::UnresolvableBinding { key } => assert_eq!(key, "ShippingInterface"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_checkout_controller_receives_bound_payment() {
    let mut container = shop();
    container.bind("PaymentInterface", "CreditCardPayment");

    let controller = container
        .resolve_as::<CheckoutController>("CheckoutController")
        .unwrap();
    assert_eq!(controller.payment.name(), "credit-card");
}

#[test]
fn test_rebinding_is_last_write_wins() {
    let mut container = shop();
    container.bind("PaymentInterface", "CreditCardPayment");
    container.bind("PaymentInterface", "NagadPayment");

    let payment = container
        .resolve_as::<dyn PaymentMethod>("PaymentInterface")
        .unwrap();
    assert_eq!(payment.name(), "nagad");

    let controller = container
        .resolve_as::<CheckoutController>("CheckoutController")
        .unwrap();
    assert_eq!(controller.payment.name(), "nagad");
}

#[test]
fn test_binding_cycle_is_reported() {
    let mut container = Container::new();
    container.bind("A", "B");
    container.bind("B", "A");

    match container.resolve("A").unwrap_err() {
        ResolutionError::CircularDependency { chain } => assert_eq!(chain, "A -> B -> A"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(container.validate().is_err());
}

#[test]
fn test_constructor_cycle_is_reported_without_wrapping() {
    struct Left;
    struct Right;

    let mut container = Container::new();
    container
        .register_type(
            ConcreteType::<Left>::new("Left")
                .depends_on("RightInterface")
                .constructor(|_| Ok(Left)),
        )
        .unwrap();
    container
        .register_type(
            ConcreteType::<Right>::new("Right")
                .depends_on("LeftInterface")
                .constructor(|_| Ok(Right)),
        )
        .unwrap();
    container.bind("LeftInterface", "Left");
    container.bind("RightInterface", "Right");

    match container.resolve("LeftInterface").unwrap_err() {
        ResolutionError::CircularDependency { chain } => {
            assert_eq!(
                chain,
                "LeftInterface -> Left -> RightInterface -> Right -> LeftInterface"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cycle_through_factory_is_reported() {
    let mut container = Container::new();
    container.bind_factory("Clock", |resolver| resolver.resolve("Clock"));

    let error = container.resolve("Clock").unwrap_err();
    assert!(matches!(error, ResolutionError::CircularDependency { .. }));
}

#[test]
fn test_scalar_parameter_is_not_instantiable() {
    struct ApiClient;

    let mut container = Container::new();
    container
        .register_type(
            ConcreteType::<ApiClient>::new("ApiClient")
                .scalar("api_key", "String")
                .constructor(|_| Ok(ApiClient)),
        )
        .unwrap();

    let error = container.resolve("ApiClient").unwrap_err();
    assert!(error.is_not_instantiable());
    assert!(error.to_string().contains("api_key"));
}

#[test]
fn test_constructor_runs_only_after_every_argument_resolves() {
    struct Owner;

    let mut container = Container::new();
    let mailers = register_counting_mailer(&mut container);
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    container
        .register_type(
            ConcreteType::<Owner>::new("Owner")
                .depends_on("Mailer")
                .depends_on("Missing")
                .constructor(move |_| {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(Owner)
                }),
        )
        .unwrap();

    let error = container.resolve("Owner").unwrap_err();
    assert!(error.is_not_instantiable());
    assert_eq!(mailers.load(Ordering::SeqCst), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_depth_limit_from_config() {
    let mut container =
        Container::with_config(ContainerConfig::default().with_max_resolution_depth(3));
    register_counting_mailer(&mut container);
    container.bind("L1", "L2");
    container.bind("L2", "L3");
    container.bind("L3", "Mailer");

    let error = container.resolve("L1").unwrap_err();
    assert!(matches!(
        error,
        ResolutionError::DepthExceeded { max_depth: 3, .. }
    ));
    assert!(container.resolve("L3").is_ok());
}

#[test]
fn test_singleton_is_reset_by_forget_and_rebind() {
    let mut container = Container::new();
    let counter = register_counting_mailer(&mut container);
    container.singleton("MailerInterface", "Mailer");

    let first = container.resolve("MailerInterface").unwrap();
    let second = container.resolve("MailerInterface").unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    assert!(container.forget("MailerInterface"));
    assert!(container.resolve("MailerInterface").is_err());

    container.singleton("MailerInterface", "Mailer");
    let third = container.resolve("MailerInterface").unwrap();
    assert!(!third.ptr_eq(&first));
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    container.singleton("MailerInterface", "Mailer");
    let fourth = container.resolve("MailerInterface").unwrap();
    assert!(!fourth.ptr_eq(&third));
}

#[test]
fn test_instance_binding_returns_registered_value() {
    let mut container = shop();
    let payment: Arc<dyn PaymentMethod> = Arc::new(NagadPayment);
    container.instance(
        "PaymentInterface",
        Instance::builder("NagadPayment").view(payment).build(),
    );

    let first = container.resolve("PaymentInterface").unwrap();
    let second = container.resolve("PaymentInterface").unwrap();
    assert!(first.ptr_eq(&second));

    let controller = container
        .resolve_as::<CheckoutController>("CheckoutController")
        .unwrap();
    assert_eq!(controller.payment.name(), "nagad");
}

#[test]
fn test_binding_descriptors() {
    let mut container = shop();
    container.bind("PaymentInterface", "CreditCardPayment");
    container.singleton("Checkout", "CheckoutController");
    container.resolve("Checkout").unwrap();

    let descriptors = container.bindings();
    assert_eq!(descriptors.len(), 2);

    assert_eq!(descriptors[0].key, "Checkout");
    assert_eq!(descriptors[0].lifetime, Lifetime::Singleton);
    assert!(descriptors[0].resolved);

    assert_eq!(descriptors[1].key, "PaymentInterface");
    assert_eq!(
        descriptors[1].kind,
        BindingKind::Concrete("CreditCardPayment".into())
    );
    assert!(!descriptors[1].resolved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_singleton_is_shared_across_tasks() {
    let mut container = Container::new();
    let counter = register_counting_mailer(&mut container);
    container.singleton("MailerInterface", "Mailer");
    let container = Arc::new(container);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let container = Arc::clone(&container);
        handles.push(tokio::spawn(async move {
            container.resolve_as::<Mailer>("MailerInterface").unwrap()
        }));
    }

    let mut mailers = Vec::new();
    for handle in handles {
        mailers.push(handle.await.unwrap());
    }

    assert!(mailers.iter().all(|m| Arc::ptr_eq(m, &mailers[0])));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(container.stats().active_singletons, 1);
}

#[tokio::test]
async fn test_transient_resolution_from_tasks() {
    let mut container = shop();
    container.bind("PaymentInterface", "NagadPayment");
    let container = Arc::new(container);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let container = Arc::clone(&container);
            tokio::spawn(async move {
                container
                    .resolve_as::<CheckoutController>("CheckoutController")
                    .map(|controller| controller.payment.name())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "nagad");
    }
    assert_eq!(container.stats().resolutions, 4);
}
