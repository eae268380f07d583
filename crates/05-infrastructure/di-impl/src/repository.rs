//! 组件仓库
//!
//! 仓库持有有序的描述符集合和可选的父仓库。按接口查找时先查本地，
//! 本地没有任何提供者时才委托给父仓库：子仓库可以覆盖父仓库的提供者，
//! 两者的结果不会合并。

use crate::definition::{Component, ComponentDefinition};
use crate::descriptor::{Descriptor, RegisteredConfig};
use crate::shared_cache::SharedInstanceCache;
use dashmap::DashMap;
use infrastructure_common::{ConfigurationError, ConfigurationResult, InstanceScope, TypeInfo};
use parking_lot::RwLock;
use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::info;

/// 注册选项
#[derive(Default)]
pub struct ComponentOptions {
    scope: InstanceScope,
    config: Option<RegisteredConfig>,
    private_repository: Option<Arc<Repository>>,
}

impl ComponentOptions {
    /// 指定作用域
    pub fn new(scope: InstanceScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// 附带配置对象；构造函数的配置参数类型必须与之一致
    pub fn with_config<C>(mut self, config: C) -> Self
    where
        C: Send + Sync + 'static,
    {
        self.config = Some(RegisteredConfig {
            value: Arc::new(config),
            type_info: TypeInfo::of::<C>(),
        });
        self
    }

    /// 附带私有仓库；构造函数的仓库参数将绑定到它
    pub fn with_private_repository(mut self, repository: Arc<Repository>) -> Self {
        self.private_repository = Some(repository);
        self
    }
}

/// 组件仓库
pub struct Repository {
    self_ref: Weak<Repository>,
    parent: Option<Arc<Repository>>,
    descriptors: RwLock<Vec<Arc<Descriptor>>>,
    /// 本地查找结果缓存，注册新组件时清空
    lookup: DashMap<TypeId, Vec<Arc<Descriptor>>>,
    shared: Arc<SharedInstanceCache>,
    global: Arc<SharedInstanceCache>,
}

impl Repository {
    /// 创建根仓库，全局作用域使用进程默认缓存
    pub fn new() -> Arc<Self> {
        Self::with_global_cache(SharedInstanceCache::process_global())
    }

    /// 创建根仓库，全局作用域使用指定缓存
    pub fn with_global_cache(global: Arc<SharedInstanceCache>) -> Arc<Self> {
        Self::create(None, global)
    }

    /// 创建子仓库，继承父仓库的全局缓存
    pub fn with_parent(parent: &Arc<Repository>) -> Arc<Self> {
        Self::create(Some(Arc::clone(parent)), Arc::clone(&parent.global))
    }

    fn create(parent: Option<Arc<Repository>>, global: Arc<SharedInstanceCache>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            parent,
            descriptors: RwLock::new(Vec::new()),
            lookup: DashMap::new(),
            shared: SharedInstanceCache::new("repository"),
            global,
        })
    }

    /// 父仓库
    pub fn parent(&self) -> Option<&Arc<Repository>> {
        self.parent.as_ref()
    }

    /// 仓库作用域缓存
    pub fn shared_cache(&self) -> &Arc<SharedInstanceCache> {
        &self.shared
    }

    /// 全局作用域缓存
    pub fn global_cache(&self) -> &Arc<SharedInstanceCache> {
        &self.global
    }

    /// 以指定作用域注册组件
    pub fn add_component<T: Component>(
        &self,
        scope: InstanceScope,
    ) -> ConfigurationResult<Arc<Descriptor>> {
        self.add_component_with::<T>(ComponentOptions::new(scope))
    }

    /// 以完整选项注册组件
    ///
    /// 同一仓库内重复注册同一类型，或组件没有声明任何构造函数，都返回配置错误。
    pub fn add_component_with<T: Component>(
        &self,
        options: ComponentOptions,
    ) -> ConfigurationResult<Arc<Descriptor>> {
        let type_info = TypeInfo::of::<T>();
        let definition = ComponentDefinition::<T>::collect();
        if definition.constructors.is_empty() {
            return Err(ConfigurationError::NoConstructors {
                type_name: type_info.module_path,
            });
        }

        let mut descriptors = self.descriptors.write();
        if descriptors
            .iter()
            .any(|descriptor| descriptor.type_info().id == type_info.id)
        {
            return Err(ConfigurationError::DuplicateRegistration {
                type_name: type_info.module_path,
            });
        }

        let shared_cache = match options.scope {
            InstanceScope::Container => None,
            InstanceScope::Repository => Some(Arc::clone(&self.shared)),
            InstanceScope::Global => Some(Arc::clone(&self.global)),
        };
        let descriptor = Arc::new(Descriptor::new(
            definition,
            options.scope,
            options.config,
            self.self_ref.clone(),
            options.private_repository,
            shared_cache,
        ));

        descriptors.push(Arc::clone(&descriptor));
        self.lookup.clear();

        info!(
            "注册组件: {} ({}, 作用域: {})",
            descriptor.name(),
            type_info.module_path,
            options.scope
        );
        Ok(descriptor)
    }

    /// 本地全部描述符（按注册顺序）
    pub fn descriptors(&self) -> Vec<Arc<Descriptor>> {
        self.descriptors.read().clone()
    }

    /// 本地注册的指定组件类型的描述符
    pub fn descriptor_of<T: Component>(&self) -> Option<Arc<Descriptor>> {
        let id = TypeId::of::<T>();
        self.descriptors
            .read()
            .iter()
            .find(|descriptor| descriptor.type_info().id == id)
            .cloned()
    }

    /// 提供指定接口的描述符
    ///
    /// 第一个有提供者的仓库（自身、父仓库、……）独占结果；都没有时返回空列表。
    pub fn component_descriptors(&self, interface: &TypeInfo) -> Vec<Arc<Descriptor>> {
        let local = self.local_descriptors(interface);
        if !local.is_empty() {
            return local;
        }

        match &self.parent {
            Some(parent) => parent.component_descriptors(interface),
            None => Vec::new(),
        }
    }

    fn local_descriptors(&self, interface: &TypeInfo) -> Vec<Arc<Descriptor>> {
        let cached = self
            .lookup
            .get(&interface.id)
            .map(|entry| entry.value().clone());
        if let Some(hit) = cached {
            return hit;
        }

        let descriptors = self.descriptors.read();
        let matches = descriptors
            .iter()
            .filter(|descriptor| descriptor.provides_interface(interface))
            .cloned()
            .collect::<Vec<_>>();
        self.lookup.insert(interface.id, matches.clone());
        matches
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("components", &self.descriptors.read().len())
            .field("has_parent", &self.parent.is_some())
            .field("global_cache", &self.global.name())
            .finish_non_exhaustive()
    }
}
