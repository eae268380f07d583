//! 共享实例缓存
//!
//! 仓库作用域与全局作用域的实例保存在这里：键到（对象, 引用容器集合）的映射。
//! 引用计数即引用容器集合的大小；最后一个容器释放时调用释放钩子并移除条目，
//! 之后的解析会重新创建实例。

use crate::container::ContainerId;
use crate::definition::{DisposeFn, ErasedObject};
use crate::descriptor::DescriptorId;
use chrono::{DateTime, Utc};
use infrastructure_common::{DependencyError, DependencyResult};
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// 进程默认的全局作用域缓存
static PROCESS_GLOBAL: Lazy<Arc<SharedInstanceCache>> =
    Lazy::new(|| SharedInstanceCache::new("global"));

/// 共享实例的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceKey {
    /// 仓库作用域：按描述符区分
    Descriptor(DescriptorId),
    /// 全局作用域：按组件实现类型区分，与仓库无关
    Type(TypeId),
}

/// 共享实例包装
pub struct SharedInstance {
    key: InstanceKey,
    component: String,
    object: ErasedObject,
    holders: Mutex<HashSet<ContainerId>>,
    disposed: AtomicBool,
    dispose: Option<DisposeFn>,
    realized_at: DateTime<Utc>,
}

impl SharedInstance {
    fn new(key: InstanceKey, component: &str, object: ErasedObject, dispose: Option<DisposeFn>) -> Self {
        Self {
            key,
            component: component.to_string(),
            object,
            holders: Mutex::new(HashSet::new()),
            disposed: AtomicBool::new(false),
            dispose,
            realized_at: Utc::now(),
        }
    }

    /// 缓存键
    pub fn key(&self) -> InstanceKey {
        self.key
    }

    /// 组件对象
    pub fn object(&self) -> &ErasedObject {
        &self.object
    }

    /// 创建时间
    pub fn realized_at(&self) -> DateTime<Utc> {
        self.realized_at
    }

    /// 当前引用容器数
    pub fn reference_count(&self) -> usize {
        self.holders.lock().len()
    }

    /// 是否已释放
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// 登记引用容器（幂等）
    pub fn add_reference(&self, container: ContainerId) -> DependencyResult<()> {
        if self.is_disposed() {
            return Err(DependencyError::InstanceDisposed {
                component: self.component.clone(),
            });
        }
        self.holders.lock().insert(container);
        Ok(())
    }

    /// 移除引用容器；移除后集合变空时返回 `true`
    ///
    /// 移除一个从未登记的容器只记录警告，返回 `false`。
    pub fn release_reference(&self, container: ContainerId) -> bool {
        let mut holders = self.holders.lock();
        if !holders.remove(&container) {
            warn!(
                "释放未登记的引用: 组件 {}, 容器 {}",
                self.component, container
            );
            return false;
        }
        holders.is_empty()
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("释放共享实例: {}", self.component);
        if let Some(dispose) = &self.dispose {
            dispose(&self.object);
        }
    }
}

impl fmt::Debug for SharedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedInstance")
            .field("key", &self.key)
            .field("component", &self.component)
            .field("references", &self.reference_count())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// 每个键的创建槽：只有一个线程执行创建，同键的其他线程等待结果
type Slot = Arc<OnceCell<Arc<SharedInstance>>>;

/// 共享实例缓存
///
/// 映射表的锁只在查找、登记引用和移除条目时短暂持有；对象的创建在锁外进行，
/// 由每个键自己的 [`OnceCell`] 保证只创建一次。不同键的创建互不阻塞，
/// 因此共享组件之间任意方向的（无环）依赖都不会互相等待。
pub struct SharedInstanceCache {
    name: String,
    entries: Mutex<HashMap<InstanceKey, Slot>>,
}

impl SharedInstanceCache {
    /// 创建新的缓存
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// 进程默认的全局作用域缓存
    pub fn process_global() -> Arc<Self> {
        Arc::clone(&PROCESS_GLOBAL)
    }

    /// 缓存名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 已创建的条目数
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 查找条目
    pub fn get(&self, key: &InstanceKey) -> Option<Arc<SharedInstance>> {
        self.entries
            .lock()
            .get(key)
            .and_then(|slot| slot.get().cloned())
    }

    /// 取得已有实例并登记引用，或调用 `create` 创建新实例
    ///
    /// 创建失败时槽保持为空，下一次解析会重新尝试。
    /// 取得实例后、登记引用前条目可能已被最后一个引用移除，此时换用新槽重试。
    pub fn get_or_create<F>(
        &self,
        key: InstanceKey,
        component: &str,
        dispose: Option<DisposeFn>,
        container: ContainerId,
        create: F,
    ) -> DependencyResult<Arc<SharedInstance>>
    where
        F: Fn() -> DependencyResult<ErasedObject>,
    {
        loop {
            let slot = Arc::clone(self.entries.lock().entry(key).or_default());

            let instance = Arc::clone(slot.get_or_try_init(|| {
                let object = create()?;
                debug!("[{}] 创建共享实例: {}", self.name, component);
                Ok::<_, DependencyError>(Arc::new(SharedInstance::new(
                    key,
                    component,
                    object,
                    dispose.clone(),
                )))
            })?);

            let entries = self.entries.lock();
            if entries
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &slot))
            {
                instance.add_reference(container)?;
                return Ok(instance);
            }
            debug!("[{}] 共享实例已在登记前释放，重新解析: {}", self.name, component);
        }
    }

    /// 释放容器对条目的引用；最后一个引用释放时调用释放钩子并移除条目，返回 `true`
    pub fn release(&self, key: &InstanceKey, container: ContainerId) -> bool {
        let mut entries = self.entries.lock();

        let existing = entries.get(key).and_then(|slot| slot.get().cloned());
        let Some(instance) = existing else {
            warn!("[{}] 释放不存在的共享实例: {:?}", self.name, key);
            return false;
        };

        if !instance.release_reference(container) {
            return false;
        }

        entries.remove(key);
        drop(entries);
        instance.dispose();
        true
    }
}

impl fmt::Debug for SharedInstanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedInstanceCache")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}
