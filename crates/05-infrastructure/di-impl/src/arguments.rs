//! 构造参数

use crate::container::Container;
use crate::definition::ErasedObject;
use crate::repository::Repository;
use di_abstractions::{ComponentInterface, InterfaceObject};
use infrastructure_common::{DependencyError, DependencyResult};
use std::sync::Arc;

/// 已解析的单个构造参数
#[derive(Debug, Clone)]
pub enum Argument {
    /// 单个接口对象
    Interface(InterfaceObject),
    /// 接口对象列表
    InterfaceList(Vec<InterfaceObject>),
    /// 仓库
    Repository(Arc<Repository>),
    /// 容器
    Container(Container),
    /// 配置对象
    Config(ErasedObject),
}

/// 传给构造函数的参数表（顺序与声明一致）
#[derive(Debug)]
pub struct Arguments {
    component: String,
    values: Vec<Argument>,
}

impl Arguments {
    pub(crate) fn new(component: &str, values: Vec<Argument>) -> Self {
        Self {
            component: component.to_string(),
            values,
        }
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 第 `index` 个参数（单个接口）
    pub fn interface<I>(&self, index: usize) -> DependencyResult<Arc<I>>
    where
        I: ComponentInterface + ?Sized,
    {
        match self.values.get(index) {
            Some(Argument::Interface(object)) => object
                .downcast::<I>()
                .ok_or_else(|| self.mismatch::<I>(index)),
            _ => Err(self.mismatch::<I>(index)),
        }
    }

    /// 第 `index` 个参数（接口列表）
    pub fn interfaces<I>(&self, index: usize) -> DependencyResult<Vec<Arc<I>>>
    where
        I: ComponentInterface + ?Sized,
    {
        match self.values.get(index) {
            Some(Argument::InterfaceList(objects)) => objects
                .iter()
                .map(|object| object.downcast::<I>().ok_or_else(|| self.mismatch::<I>(index)))
                .collect(),
            _ => Err(self.mismatch::<I>(index)),
        }
    }

    /// 第 `index` 个参数（仓库）
    pub fn repository(&self, index: usize) -> DependencyResult<Arc<Repository>> {
        match self.values.get(index) {
            Some(Argument::Repository(repository)) => Ok(Arc::clone(repository)),
            _ => Err(self.mismatch_named(index, "Repository")),
        }
    }

    /// 第 `index` 个参数（容器）
    pub fn container(&self, index: usize) -> DependencyResult<Container> {
        match self.values.get(index) {
            Some(Argument::Container(container)) => Ok(container.clone()),
            _ => Err(self.mismatch_named(index, "Container")),
        }
    }

    /// 第 `index` 个参数（配置对象）
    pub fn config<C>(&self, index: usize) -> DependencyResult<Arc<C>>
    where
        C: Send + Sync + 'static,
    {
        match self.values.get(index) {
            Some(Argument::Config(config)) => Arc::clone(config)
                .downcast::<C>()
                .map_err(|_| self.mismatch_named(index, std::any::type_name::<C>())),
            _ => Err(self.mismatch_named(index, std::any::type_name::<C>())),
        }
    }

    fn mismatch<I>(&self, index: usize) -> DependencyError
    where
        I: ComponentInterface + ?Sized,
    {
        self.mismatch_named(index, &I::info().name)
    }

    fn mismatch_named(&self, index: usize, expected: &str) -> DependencyError {
        DependencyError::ArgumentMismatch {
            component: self.component.clone(),
            index,
            expected: expected.to_string(),
        }
    }
}
