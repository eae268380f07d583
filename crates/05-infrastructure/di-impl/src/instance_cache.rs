//! 容器内实例缓存
//!
//! 每个容器持有一个缓存：描述符到实例的映射，首次解析时惰性创建。
//! 新实例加入缓存后向观察者发出通知，延迟绑定接线由 [`BindingWirer`] 完成。

use crate::descriptor::{Descriptor, DescriptorId};
use crate::instance::Instance;
use infrastructure_common::DependencyResult;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 实例创建通知的接收者
pub trait InstanceObserver: Send + Sync {
    /// 新实例已加入容器；`realized` 包含容器内全部实例（含新实例），按创建顺序排列
    fn on_instance_created(&self, created: &Arc<Instance>, realized: &[Arc<Instance>]);
}

/// 容器内实例缓存
///
/// 自身不加锁，由容器在可重入锁内访问。
#[derive(Default)]
pub struct InstanceCache {
    index: RefCell<HashMap<DescriptorId, Arc<Instance>>>,
    ordered: RefCell<Vec<Arc<Instance>>>,
    observers: Vec<Box<dyn InstanceObserver>>,
}

impl InstanceCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加观察者
    pub fn add_observer(&mut self, observer: impl InstanceObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub(crate) fn add_boxed_observer(&mut self, observer: Box<dyn InstanceObserver>) {
        self.observers.push(observer);
    }

    /// 查找实例
    pub fn get(&self, descriptor: &Descriptor) -> Option<Arc<Instance>> {
        self.index.borrow().get(&descriptor.id()).cloned()
    }

    /// 取得已有实例，或调用 `create` 创建并通知观察者
    ///
    /// `create` 执行期间不持有任何内部借用，构造函数可以递归解析其他组件。
    pub fn get_or_create<F>(&self, descriptor: &Descriptor, create: F) -> DependencyResult<Arc<Instance>>
    where
        F: FnOnce() -> DependencyResult<Instance>,
    {
        if let Some(instance) = self.get(descriptor) {
            return Ok(instance);
        }

        let instance = Arc::new(create()?);
        self.index
            .borrow_mut()
            .insert(descriptor.id(), Arc::clone(&instance));
        self.ordered.borrow_mut().push(Arc::clone(&instance));

        let realized = self.instances();
        for observer in &self.observers {
            observer.on_instance_created(&instance, &realized);
        }
        Ok(instance)
    }

    /// 全部实例（按创建顺序）
    pub fn instances(&self) -> Vec<Arc<Instance>> {
        self.ordered.borrow().clone()
    }

    /// 实例数
    pub fn len(&self) -> usize {
        self.ordered.borrow().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取出全部实例并清空缓存（按创建顺序）
    pub fn drain(&self) -> Vec<Arc<Instance>> {
        self.index.borrow_mut().clear();
        std::mem::take(&mut *self.ordered.borrow_mut())
    }
}

/// 延迟绑定接线
///
/// 新实例出现时：
/// - 对容器内每个其他实例，若任一方的绑定槽能被另一方满足，则赋值；
/// - 因此无论 A、B 谁先创建，两端都存在后都会完成接线。
///
/// 已绑定的槽不会被覆盖；共享组件的槽因此保持指向第一个满足它的对象。
#[derive(Debug, Default, Clone, Copy)]
pub struct BindingWirer;

impl BindingWirer {
    /// 用候选实例满足请求方尚未绑定的槽，返回赋值次数
    pub fn wire(requester: &Instance, candidate: &Instance) -> usize {
        let mut wired = 0;
        for slot in requester.descriptor().bindings() {
            if slot.is_bound(requester.object())
                || !candidate.descriptor().provides_interface(slot.interface())
            {
                continue;
            }

            let Some(value) = candidate
                .descriptor()
                .try_cast_to(candidate.object(), slot.interface())
            else {
                continue;
            };

            if slot.try_satisfy(requester.object(), &value) {
                debug!(
                    "延迟绑定: {}.{} <- {}",
                    requester.descriptor().name(),
                    slot.name(),
                    candidate.descriptor().name()
                );
                wired += 1;
            }
        }
        wired
    }
}

impl InstanceObserver for BindingWirer {
    fn on_instance_created(&self, created: &Arc<Instance>, realized: &[Arc<Instance>]) {
        for other in realized {
            if Arc::ptr_eq(other, created) {
                continue;
            }
            Self::wire(created, other);
            Self::wire(other, created);
        }
    }
}
