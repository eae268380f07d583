//! # 示例应用程序
//!
//! 演示组件解析运行时：三种实例作用域、组件配置对象、委托接口，
//! 以及通过延迟绑定解决的循环依赖。

use anyhow::Context;
use clap::Parser;
use component_macros::component_interface;
use di_abstractions::{Binding, ComponentResolverExt};
use di_impl::{
    Component, ComponentDefinition, ComponentOptions, Container, Disposable, InstanceScope,
    Repository,
};
use infrastructure_common::{bind_section, ContainerConfig};
use parking_lot::Mutex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "组件解析运行时示例应用")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 并发解析共享组件的容器数
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[component_interface]
pub trait IClock: Send + Sync {
    fn tick(&self) -> u64;
}

#[component_interface]
pub trait IMessageStore: Send + Sync {
    fn append(&self, message: String);
    fn messages(&self) -> Vec<String>;
}

#[component_interface]
pub trait IGreeter: Send + Sync {
    fn greet(&self) -> String;
}

#[component_interface]
pub trait IPublisher: Send + Sync {
    fn publish(&self, topic: &str);
}

#[component_interface]
pub trait ISubscriber: Send + Sync {
    fn receive(&self, topic: &str);
    fn acknowledge(&self);
}

/// 全局时钟
struct SystemClock {
    ticks: AtomicU64,
}

impl IClock for SystemClock {
    fn tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Component for SystemClock {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .name("Clock")
            .implements::<dyn IClock>(|this| this)
            .constructor("new")
            .build(|_| {
                Ok(SystemClock {
                    ticks: AtomicU64::new(0),
                })
            });
    }
}

/// 仓库内共享的消息存储
struct MemoryStore {
    messages: Mutex<Vec<String>>,
}

impl IMessageStore for MemoryStore {
    fn append(&self, message: String) {
        self.messages.lock().push(message);
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Disposable for MemoryStore {
    fn dispose(&self) {
        info!("消息存储释放，共 {} 条消息", self.messages.lock().len());
    }
}

impl Component for MemoryStore {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .implements::<dyn IMessageStore>(|this| this)
            .disposable()
            .constructor("new")
            .build(|_| {
                Ok(MemoryStore {
                    messages: Mutex::new(Vec::new()),
                })
            });
    }
}

/// 问候组件配置
#[derive(Debug, Clone, Deserialize)]
struct GreeterConfig {
    greeting: String,
    audience: String,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello".to_string(),
            audience: "world".to_string(),
        }
    }
}

struct Greeter {
    config: Arc<GreeterConfig>,
    clock: Arc<dyn IClock>,
    store: Arc<dyn IMessageStore>,
}

impl IGreeter for Greeter {
    fn greet(&self) -> String {
        let message = format!(
            "[{}] {}, {}!",
            self.clock.tick(),
            self.config.greeting,
            self.config.audience
        );
        self.store.append(message.clone());
        message
    }
}

impl Component for Greeter {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .implements::<dyn IGreeter>(|this| this)
            .constructor("with_config")
            .config::<GreeterConfig>("config")
            .interface::<dyn IClock>("clock")
            .interface::<dyn IMessageStore>("store")
            .build(|args| {
                Ok(Greeter {
                    config: args.config::<GreeterConfig>(0)?,
                    clock: args.interface::<dyn IClock>(1)?,
                    store: args.interface::<dyn IMessageStore>(2)?,
                })
            });
    }
}

/// 发布者通过构造函数依赖订阅者
struct Publisher {
    subscriber: Arc<dyn ISubscriber>,
    store: Arc<dyn IMessageStore>,
}

impl IPublisher for Publisher {
    fn publish(&self, topic: &str) {
        self.store.append(format!("publish {topic}"));
        self.subscriber.receive(topic);
    }
}

impl Component for Publisher {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .implements::<dyn IPublisher>(|this| this)
            .constructor("new")
            .interface::<dyn ISubscriber>("subscriber")
            .interface::<dyn IMessageStore>("store")
            .build(|args| {
                Ok(Publisher {
                    subscriber: args.interface::<dyn ISubscriber>(0)?,
                    store: args.interface::<dyn IMessageStore>(1)?,
                })
            });
    }
}

/// 订阅者通过延迟绑定槽回指发布者
struct Subscriber {
    publisher: Binding<dyn IPublisher>,
    received: Mutex<Vec<String>>,
}

impl ISubscriber for Subscriber {
    fn receive(&self, topic: &str) {
        self.received.lock().push(topic.to_string());
    }

    fn acknowledge(&self) {
        match self.publisher.get() {
            Some(publisher) => publisher.publish("ack"),
            None => warn!("订阅者尚未绑定发布者"),
        }
    }
}

impl Component for Subscriber {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .implements::<dyn ISubscriber>(|this| this)
            .binding::<dyn IPublisher>("publisher", |this| &this.publisher)
            .constructor("new")
            .build(|_| {
                Ok(Subscriber {
                    publisher: Binding::new(),
                    received: Mutex::new(Vec::new()),
                })
            });
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("启动组件解析运行时示例");

    let container_config = ContainerConfig::load(args.config.as_deref())
        .context("加载容器配置失败")?;
    let greeter_config = load_greeter_config(args.config.as_deref())?;
    info!("容器配置: {:?}", container_config);

    let repository = build_repository(greeter_config)?;
    let container = Container::builder(Arc::clone(&repository))
        .config(container_config.clone())
        .build();

    demonstrate_resolution(&container)?;
    demonstrate_cycle(&container)?;
    demonstrate_shared_scope(&repository, &container_config, args.workers).await?;

    container.dispose();
    info!("示例结束");
    Ok(())
}

/// 读取 `[greeter]` 配置节；没有配置文件或配置节时使用默认值
fn load_greeter_config(path: Option<&std::path::Path>) -> anyhow::Result<GreeterConfig> {
    let Some(path) = path else {
        return Ok(GreeterConfig::default());
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .context("读取配置文件失败")?;

    match bind_section::<GreeterConfig>(&settings, "greeter") {
        Ok(config) => Ok(config),
        Err(infrastructure_common::ConfigError::KeyNotFound { key }) => {
            warn!("配置节 {} 不存在，使用默认问候配置", key);
            Ok(GreeterConfig::default())
        }
        Err(e) => Err(e).context("绑定问候组件配置失败"),
    }
}

fn build_repository(greeter_config: GreeterConfig) -> anyhow::Result<Arc<Repository>> {
    let repository = Repository::new();
    repository.add_component::<SystemClock>(InstanceScope::Global)?;
    repository.add_component::<MemoryStore>(InstanceScope::Repository)?;
    repository.add_component_with::<Greeter>(
        ComponentOptions::new(InstanceScope::Container).with_config(greeter_config),
    )?;
    repository.add_component::<Publisher>(InstanceScope::Container)?;
    repository.add_component::<Subscriber>(InstanceScope::Container)?;
    info!("已注册 {} 个组件", repository.descriptors().len());
    Ok(repository)
}

fn demonstrate_resolution(container: &Container) -> anyhow::Result<()> {
    info!("=== 组件解析 ===");
    let greeter = container.resolve::<dyn IGreeter>()?;
    info!("{}", greeter.greet());
    info!("{}", greeter.greet());

    for instance in container.component_instances()? {
        info!(
            "实例: {} (作用域: {}, 共享: {}, 创建于 {})",
            instance.descriptor().name(),
            instance.descriptor().scope(),
            instance.is_shared(),
            instance.realized_at()
        );
    }
    Ok(())
}

fn demonstrate_cycle(container: &Container) -> anyhow::Result<()> {
    info!("=== 循环依赖 ===");
    let publisher = container.resolve::<dyn IPublisher>()?;
    let subscriber = container.resolve::<dyn ISubscriber>()?;

    publisher.publish("orders");
    subscriber.acknowledge();

    let store = container.resolve::<dyn IMessageStore>()?;
    for message in store.messages() {
        info!("消息: {}", message);
    }
    Ok(())
}

async fn demonstrate_shared_scope(
    repository: &Arc<Repository>,
    config: &ContainerConfig,
    workers: usize,
) -> anyhow::Result<()> {
    info!("=== 共享作用域 ===");
    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let repository = Arc::clone(repository);
        let config = config.clone();
        handles.push(tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let container = Container::builder(repository).config(config).build();
            let store = container.resolve::<dyn IMessageStore>()?;
            store.append(format!("worker {worker}"));
            let count = store.messages().len();
            container.dispose();
            Ok(count)
        }));
    }

    for handle in handles {
        let count = handle.await.context("工作线程异常退出")??;
        info!("共享存储当前消息数: {}", count);
    }
    Ok(())
}
