//! 组件实例
//!
//! 实例把描述符与已创建的对象配对。容器作用域的对象只属于一个容器；
//! 仓库/全局作用域的对象保存在共享缓存中，实例只持有对共享包装的引用。
//!
//! 构造过程：选择最优构造函数 → 通过容器递归解析每个参数 → 上报进度 → 调用构造函数。

use crate::arguments::{Argument, Arguments};
use crate::container::{Container, ContainerId};
use crate::definition::{ConstructorDef, ErasedObject, ParameterKind};
use crate::descriptor::Descriptor;
use crate::shared_cache::{InstanceKey, SharedInstance, SharedInstanceCache};
use chrono::{DateTime, Utc};
use di_abstractions::{ComponentResolver, InterfaceObject, ProgressSink};
use infrastructure_common::{
    ConstructorRejection, DependencyError, DependencyResult, RejectionReason, TypeInfo,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// 实例的对象持有方式
enum Realized {
    /// 容器作用域：对象由实例独占
    Owned(ErasedObject),
    /// 仓库/全局作用域：对象由共享缓存持有
    Shared {
        cache: Arc<SharedInstanceCache>,
        key: InstanceKey,
        entry: Arc<SharedInstance>,
    },
}

/// 组件实例
pub struct Instance {
    descriptor: Arc<Descriptor>,
    realized: Realized,
    realized_at: DateTime<Utc>,
    disposed: AtomicBool,
}

impl Instance {
    /// 为容器创建（或取得共享的）实例
    pub(crate) fn realize(
        descriptor: &Arc<Descriptor>,
        container: &Container,
        progress: Option<&dyn ProgressSink>,
    ) -> DependencyResult<Self> {
        let realized = match descriptor.shared_slot() {
            None => Realized::Owned(construct(descriptor, container, progress)?),
            Some((cache, key)) => {
                let entry = cache.get_or_create(
                    key,
                    descriptor.name(),
                    descriptor.dispose_hook(),
                    container.id(),
                    || construct(descriptor, container, progress),
                )?;
                Realized::Shared {
                    cache: Arc::clone(cache),
                    key,
                    entry,
                }
            }
        };

        Ok(Self {
            descriptor: Arc::clone(descriptor),
            realized,
            realized_at: Utc::now(),
            disposed: AtomicBool::new(false),
        })
    }

    /// 描述符
    pub fn descriptor(&self) -> &Arc<Descriptor> {
        &self.descriptor
    }

    /// 组件对象
    pub fn object(&self) -> &ErasedObject {
        match &self.realized {
            Realized::Owned(object) => object,
            Realized::Shared { entry, .. } => entry.object(),
        }
    }

    /// 按具体组件类型取回对象
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(self.object()).downcast::<T>().ok()
    }

    /// 实例进入当前容器的时间
    pub fn realized_at(&self) -> DateTime<Utc> {
        self.realized_at
    }

    /// 是否跨容器共享
    pub fn is_shared(&self) -> bool {
        matches!(self.realized, Realized::Shared { .. })
    }

    /// 是否已释放
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// 把对象适配为指定接口
    ///
    /// 描述符声明提供该接口但转换失败，属于内部一致性错误。
    pub fn cast_to(&self, interface: &TypeInfo) -> DependencyResult<InterfaceObject> {
        if self.is_disposed() {
            return Err(DependencyError::InstanceDisposed {
                component: self.descriptor.name().to_string(),
            });
        }

        self.descriptor
            .try_cast_to(self.object(), interface)
            .ok_or_else(|| {
                error!(
                    "组件 {} 声明提供接口 {}，但类型转换失败",
                    self.descriptor.name(),
                    interface.name
                );
                DependencyError::CastFailed {
                    component: self.descriptor.name().to_string(),
                    interface: interface.name.clone(),
                }
            })
    }

    /// 容器释放实例
    ///
    /// 容器作用域直接调用释放钩子；共享作用域释放引用，最后一个引用释放时才调用钩子。
    pub(crate) fn release(&self, container: ContainerId) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        match &self.realized {
            Realized::Owned(object) => {
                debug!("释放容器实例: {}", self.descriptor.name());
                self.descriptor.dispose_object(object);
            }
            Realized::Shared { cache, key, .. } => {
                if cache.release(key, container) {
                    debug!("共享实例最后一个引用已释放: {}", self.descriptor.name());
                }
            }
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("component", &self.descriptor.name())
            .field("scope", &self.descriptor.scope())
            .field("realized_at", &self.realized_at)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// 选择构造函数并创建对象
fn construct(
    descriptor: &Arc<Descriptor>,
    container: &Container,
    progress: Option<&dyn ProgressSink>,
) -> DependencyResult<ErasedObject> {
    let constructor = select_constructor(descriptor, container)?;
    debug!("选择构造函数: {}", constructor.signature());

    let mut values = Vec::with_capacity(constructor.parameters().len());
    for parameter in constructor.parameters() {
        let value = match parameter.kind() {
            ParameterKind::Interface(interface) => {
                let object = container
                    .resolve_interface(interface, true, progress)?
                    .ok_or_else(|| DependencyError::ComponentNotRegistered {
                        type_name: interface.name.clone(),
                    })?;
                Argument::Interface(object)
            }
            ParameterKind::InterfaceList(interface) => {
                Argument::InterfaceList(container.resolve_interfaces(interface, progress)?)
            }
            ParameterKind::Repository => Argument::Repository(
                descriptor
                    .bound_repository()
                    .ok_or_else(|| DependencyError::RepositoryUnavailable {
                        component: descriptor.name().to_string(),
                    })?,
            ),
            ParameterKind::Container => Argument::Container(container.clone()),
            ParameterKind::Config(config_type) => Argument::Config(
                descriptor
                    .config()
                    .cloned()
                    .ok_or_else(|| DependencyError::ArgumentMismatch {
                        component: descriptor.name().to_string(),
                        index: values.len(),
                        expected: config_type.name.clone(),
                    })?,
            ),
        };
        values.push(value);
    }

    if let Some(progress) = progress {
        progress.report(descriptor.name());
    }

    let arguments = Arguments::new(descriptor.name(), values);
    constructor
        .invoke(&arguments)
        .map_err(|source| DependencyError::ComponentCreationFailed {
            type_name: descriptor.type_info().module_path.clone(),
            source,
        })
}

/// 在可用构造函数中选择参数最多的一个；参数数相同时取先声明者
pub(crate) fn select_constructor<'d>(
    descriptor: &'d Descriptor,
    resolver: &dyn ComponentResolver,
) -> DependencyResult<&'d ConstructorDef> {
    let mut best: Option<&ConstructorDef> = None;
    let mut rejections = Vec::new();

    for constructor in descriptor.constructors() {
        match check_eligibility(descriptor, constructor, resolver) {
            Ok(()) => {
                let richer = best.map_or(true, |current| {
                    constructor.parameters().len() > current.parameters().len()
                });
                if richer {
                    best = Some(constructor);
                }
            }
            Err(rejection) => rejections.push(rejection),
        }
    }

    best.ok_or_else(|| DependencyError::NoEligibleConstructor {
        component: descriptor.name().to_string(),
        rejections,
    })
}

/// 检查构造函数的每个参数；返回第一个不满足条件的参数
fn check_eligibility(
    descriptor: &Descriptor,
    constructor: &ConstructorDef,
    resolver: &dyn ComponentResolver,
) -> Result<(), ConstructorRejection> {
    for parameter in constructor.parameters() {
        let reason = match parameter.kind() {
            ParameterKind::Interface(interface) if !resolver.can_resolve(interface) => {
                Some(RejectionReason::UnregisteredInterface)
            }
            ParameterKind::Config(expected) => match descriptor.config_type() {
                None => Some(RejectionReason::ConfigurationMissing),
                Some(actual) if actual != expected => {
                    Some(RejectionReason::ConfigurationTypeMismatch {
                        actual: actual.name.clone(),
                    })
                }
                Some(_) => None,
            },
            _ => None,
        };

        if let Some(reason) = reason {
            return Err(ConstructorRejection {
                constructor: constructor.signature().to_string(),
                parameter: parameter.name().to_string(),
                parameter_type: parameter.kind().to_string(),
                reason,
            });
        }
    }
    Ok(())
}
