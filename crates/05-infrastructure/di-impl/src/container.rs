//! 组件容器
//!
//! 容器是解析上下文：向仓库查询候选描述符，在自身的实例缓存中创建或复用实例，
//! 并负责实例的引用生命周期。容器句柄可以廉价克隆，所有克隆共享同一个上下文。

use crate::descriptor::Descriptor;
use crate::instance::Instance;
use crate::instance_cache::{BindingWirer, InstanceCache, InstanceObserver};
use crate::repository::Repository;
use di_abstractions::{
    ComponentResolver, InterfaceObject, ProgressSink, ResolveContext, TracingProgressSink,
};
use infrastructure_common::{ContainerConfig, DependencyError, DependencyResult, TypeInfo};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// 容器标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(Uuid);

impl ContainerId {
    /// 生成新的标识
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ContainerState {
    cache: InstanceCache,
    context: RefCell<ResolveContext>,
}

struct ContainerInner {
    id: ContainerId,
    repository: Arc<Repository>,
    config: ContainerConfig,
    progress: Arc<dyn ProgressSink>,
    state: ReentrantMutex<ContainerState>,
    disposed: AtomicBool,
}

impl ContainerInner {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let instances = self.state.lock().cache.drain();
        for instance in instances.iter().rev() {
            instance.release(self.id);
        }
        info!("容器已释放: {} ({} 个实例)", self.id, instances.len());
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// 组件容器
///
/// 组件的构造函数可以接收 `Container` 参数；持有容器句柄的组件会让容器一直存活，
/// 这种情况下需要显式调用 [`Container::dispose`]。
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// 使用默认配置创建容器
    pub fn new(repository: Arc<Repository>) -> Self {
        Self::builder(repository).build()
    }

    /// 容器构建器
    pub fn builder(repository: Arc<Repository>) -> ContainerBuilder {
        ContainerBuilder::new(repository)
    }

    /// 容器标识
    pub fn id(&self) -> ContainerId {
        self.inner.id
    }

    /// 容器使用的仓库
    pub fn repository(&self) -> &Arc<Repository> {
        &self.inner.repository
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// 是否已释放
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// 释放容器：按创建的逆序释放全部实例（幂等）
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// 容器内已创建的实例（按创建顺序）
    pub fn component_instances(&self) -> DependencyResult<Vec<Arc<Instance>>> {
        self.ensure_active()?;
        Ok(self.inner.state.lock().cache.instances())
    }

    fn ensure_active(&self) -> DependencyResult<()> {
        if self.is_disposed() {
            return Err(DependencyError::ContainerDisposed {
                container_id: self.inner.id.to_string(),
            });
        }
        Ok(())
    }

    fn effective_progress<'a>(
        &'a self,
        explicit: Option<&'a dyn ProgressSink>,
    ) -> Option<&'a dyn ProgressSink> {
        match explicit {
            Some(sink) => Some(sink),
            None if self.inner.config.report_progress => Some(self.inner.progress.as_ref()),
            None => None,
        }
    }

    fn resolve_descriptor(
        &self,
        descriptor: &Arc<Descriptor>,
        interface: &TypeInfo,
        progress: Option<&dyn ProgressSink>,
    ) -> DependencyResult<InterfaceObject> {
        let state = self.inner.state.lock();
        self.ensure_active()?;

        let instance = state.cache.get_or_create(descriptor, || {
            state
                .context
                .borrow_mut()
                .push(descriptor.id().value(), descriptor.name())?;
            let realized = Instance::realize(descriptor, self, progress);
            state.context.borrow_mut().pop();
            realized
        })?;

        instance.cast_to(interface)
    }
}

impl ComponentResolver for Container {
    fn can_resolve(&self, interface: &TypeInfo) -> bool {
        !self.is_disposed()
            && !self
                .inner
                .repository
                .component_descriptors(interface)
                .is_empty()
    }

    fn resolve_interface(
        &self,
        interface: &TypeInfo,
        required: bool,
        progress: Option<&dyn ProgressSink>,
    ) -> DependencyResult<Option<InterfaceObject>> {
        self.ensure_active()?;
        let progress = self.effective_progress(progress);

        let descriptors = self.inner.repository.component_descriptors(interface);
        match descriptors.first() {
            Some(descriptor) => self
                .resolve_descriptor(descriptor, interface, progress)
                .map(Some),
            None if required => Err(DependencyError::ComponentNotRegistered {
                type_name: interface.name.clone(),
            }),
            None => Ok(None),
        }
    }

    fn resolve_interfaces(
        &self,
        interface: &TypeInfo,
        progress: Option<&dyn ProgressSink>,
    ) -> DependencyResult<Vec<InterfaceObject>> {
        self.ensure_active()?;
        let progress = self.effective_progress(progress);

        self.inner
            .repository
            .component_descriptors(interface)
            .iter()
            .map(|descriptor| self.resolve_descriptor(descriptor, interface, progress))
            .collect()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// 容器构建器
pub struct ContainerBuilder {
    repository: Arc<Repository>,
    config: ContainerConfig,
    progress: Option<Arc<dyn ProgressSink>>,
    observers: Vec<Box<dyn InstanceObserver>>,
}

impl ContainerBuilder {
    /// 创建构建器
    pub fn new(repository: Arc<Repository>) -> Self {
        Self {
            repository,
            config: ContainerConfig::default(),
            progress: None,
            observers: Vec::new(),
        }
    }

    /// 设置容器配置
    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置进度接收器（默认输出到 tracing）
    pub fn progress_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    /// 添加实例创建观察者
    pub fn observer(mut self, observer: impl InstanceObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// 构建容器
    pub fn build(self) -> Container {
        let mut cache = InstanceCache::new();
        if self.config.wire_bindings {
            cache.add_observer(BindingWirer);
        }
        for observer in self.observers {
            cache.add_boxed_observer(observer);
        }

        let id = ContainerId::new();
        debug!("创建容器: {}", id);

        Container {
            inner: Arc::new(ContainerInner {
                id,
                repository: self.repository,
                progress: self
                    .progress
                    .unwrap_or_else(|| Arc::new(TracingProgressSink)),
                state: ReentrantMutex::new(ContainerState {
                    cache,
                    context: RefCell::new(ResolveContext::new(self.config.max_resolution_depth)),
                }),
                config: self.config,
                disposed: AtomicBool::new(false),
            }),
        }
    }
}
