//! 跨 crate 集成测试使用的组件

use component_macros::component_interface;
use di_abstractions::Binding;
use di_impl::{Component, ComponentDefinition, Disposable};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// 记录组件创建与释放次数
#[derive(Debug, Default)]
pub struct Probe {
    created: AtomicUsize,
    disposed: AtomicUsize,
}

impl Probe {
    /// 创建次数
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// 释放次数
    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// 计数组件接口
#[component_interface]
pub trait ICounter: Send + Sync {
    /// 第几次创建的实例
    fn generation(&self) -> usize;
}

/// 构造较慢的组件，用于放大并发创建的竞争窗口
pub struct SlowCounter {
    probe: Arc<Probe>,
    generation: usize,
}

impl ICounter for SlowCounter {
    fn generation(&self) -> usize {
        self.generation
    }
}

impl Disposable for SlowCounter {
    fn dispose(&self) {
        self.probe.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Component for SlowCounter {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .implements::<dyn ICounter>(|this| this)
            .disposable()
            .constructor("new")
            .config::<Arc<Probe>>("probe")
            .build(|args| {
                let probe = args.config::<Arc<Probe>>(0)?.as_ref().clone();
                thread::sleep(Duration::from_millis(5));
                let generation = probe.created.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(SlowCounter { probe, generation })
            });
    }
}

/// 任务调度接口
#[component_interface]
pub trait IScheduler: Send + Sync {
    /// 提交任务，返回执行者名称
    fn submit(&self, job: &str) -> String;
}

/// 任务执行接口
#[component_interface]
pub trait IExecutor: Send + Sync {
    /// 执行任务
    fn execute(&self, job: &str) -> String;
    /// 回指的调度器
    fn scheduler(&self) -> Option<Arc<dyn IScheduler>>;
}

/// 调度器通过构造函数依赖全部执行者
pub struct Scheduler {
    executors: Vec<Arc<dyn IExecutor>>,
}

impl IScheduler for Scheduler {
    fn submit(&self, job: &str) -> String {
        self.executors
            .iter()
            .map(|executor| executor.execute(job))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Component for Scheduler {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .implements::<dyn IScheduler>(|this| this)
            .constructor("new")
            .interfaces::<dyn IExecutor>("executors")
            .build(|args| {
                Ok(Scheduler {
                    executors: args.interfaces::<dyn IExecutor>(0)?,
                })
            });
    }
}

/// 执行者通过延迟绑定回指调度器
pub struct LocalExecutor {
    scheduler: Binding<dyn IScheduler>,
}

impl IExecutor for LocalExecutor {
    fn execute(&self, job: &str) -> String {
        format!("local:{job}")
    }

    fn scheduler(&self) -> Option<Arc<dyn IScheduler>> {
        self.scheduler.get()
    }
}

impl Component for LocalExecutor {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .implements::<dyn IExecutor>(|this| this)
            .binding::<dyn IScheduler>("scheduler", |this| &this.scheduler)
            .constructor("new")
            .build(|_| {
                Ok(LocalExecutor {
                    scheduler: Binding::new(),
                })
            });
    }
}

/// 另一个执行者，同样回指调度器
pub struct RemoteExecutor {
    scheduler: Binding<dyn IScheduler>,
}

impl IExecutor for RemoteExecutor {
    fn execute(&self, job: &str) -> String {
        format!("remote:{job}")
    }

    fn scheduler(&self) -> Option<Arc<dyn IScheduler>> {
        self.scheduler.get()
    }
}

impl Component for RemoteExecutor {
    fn describe(definition: &mut ComponentDefinition<Self>) {
        definition
            .implements::<dyn IExecutor>(|this| this)
            .binding::<dyn IScheduler>("scheduler", |this| &this.scheduler)
            .constructor("new")
            .build(|_| {
                Ok(RemoteExecutor {
                    scheduler: Binding::new(),
                })
            });
    }
}
