//! 组件解析器抽象接口
//!
//! 容器契约：判断接口是否可解析（不创建对象），解析单个或全部提供者。

use crate::interface::{ComponentInterface, InterfaceObject};
use crate::progress::ProgressSink;
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::sync::Arc;

/// 组件解析器 trait
///
/// 由容器实现，构造函数参数的解析会递归回到这里。
pub trait ComponentResolver: Send + Sync {
    /// 是否存在指定接口的提供者（不会创建任何对象）
    fn can_resolve(&self, interface: &TypeInfo) -> bool;

    /// 解析并创建单个依赖
    ///
    /// `required` 为 `false` 时，没有提供者返回 `Ok(None)`。
    /// `progress` 为 `None` 时使用容器自身的进度接收器。
    fn resolve_interface(
        &self,
        interface: &TypeInfo,
        required: bool,
        progress: Option<&dyn ProgressSink>,
    ) -> DependencyResult<Option<InterfaceObject>>;

    /// 解析指定接口的全部提供者，用于列表类型的构造参数
    fn resolve_interfaces(
        &self,
        interface: &TypeInfo,
        progress: Option<&dyn ProgressSink>,
    ) -> DependencyResult<Vec<InterfaceObject>>;
}

/// 类型化的解析入口
pub trait ComponentResolverExt: ComponentResolver {
    /// 解析组件接口
    fn resolve<I>(&self) -> DependencyResult<Arc<I>>
    where
        I: ComponentInterface + ?Sized,
    {
        let info = I::info();
        let object = self
            .resolve_interface(&info, true, None)?
            .ok_or_else(|| DependencyError::ComponentNotRegistered {
                type_name: info.name.clone(),
            })?;
        typed::<I>(&object)
    }

    /// 解析组件接口，没有提供者时返回 `None`
    fn try_resolve<I>(&self) -> DependencyResult<Option<Arc<I>>>
    where
        I: ComponentInterface + ?Sized,
    {
        self.resolve_interface(&I::info(), false, None)?
            .map(|object| typed::<I>(&object))
            .transpose()
    }

    /// 解析组件接口的全部提供者
    fn resolve_all<I>(&self) -> DependencyResult<Vec<Arc<I>>>
    where
        I: ComponentInterface + ?Sized,
    {
        self.resolve_interfaces(&I::info(), None)?
            .iter()
            .map(typed::<I>)
            .collect()
    }

    /// 是否存在指定接口的提供者
    fn can_resolve_interface<I>(&self) -> bool
    where
        I: ComponentInterface + ?Sized,
    {
        self.can_resolve(&I::info())
    }
}

impl<R: ComponentResolver + ?Sized> ComponentResolverExt for R {}

fn typed<I>(object: &InterfaceObject) -> DependencyResult<Arc<I>>
where
    I: ComponentInterface + ?Sized,
{
    object
        .downcast::<I>()
        .ok_or_else(|| DependencyError::CastFailed {
            component: object.interface().name.clone(),
            interface: I::info().name,
        })
}

/// 解析链中的一帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveFrame {
    /// 描述符标识
    pub id: u64,
    /// 组件显示名
    pub name: String,
}

/// 解析上下文
///
/// 记录正在构造中的组件链，用于检测构造函数之间的循环依赖。
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链
    pub resolution_chain: Vec<ResolveFrame>,
    /// 最大递归深度
    pub max_depth: usize,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(max_depth: usize) -> Self {
        Self {
            resolution_chain: Vec::new(),
            max_depth,
        }
    }

    /// 进入组件构造
    pub fn push(&mut self, id: u64, name: &str) -> DependencyResult<()> {
        if self.resolution_chain.iter().any(|frame| frame.id == id) {
            return Err(DependencyError::CircularDependency {
                dependency_chain: self.describe_chain(name),
            });
        }
        if self.resolution_chain.len() >= self.max_depth {
            return Err(DependencyError::MaxDepthExceeded {
                max_depth: self.max_depth,
                dependency_chain: self.describe_chain(name),
            });
        }
        self.resolution_chain.push(ResolveFrame {
            id,
            name: name.to_string(),
        });
        Ok(())
    }

    /// 离开组件构造
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    fn describe_chain(&self, next: &str) -> String {
        self.resolution_chain
            .iter()
            .map(|frame| frame.name.as_str())
            .chain(std::iter::once(next))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_is_detected() {
        let mut context = ResolveContext::default();
        context.push(1, "A").unwrap();
        context.push(2, "B").unwrap();

        let error = context.push(1, "A").unwrap_err();
        match error {
            DependencyError::CircularDependency { dependency_chain } => {
                assert_eq!(dependency_chain, "A -> B -> A");
            }
            other => panic!("unexpected error: {other}"),
        }

        context.pop();
        assert_eq!(context.depth(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let mut context = ResolveContext::new(2);
        context.push(1, "A").unwrap();
        context.push(2, "B").unwrap();
        assert!(matches!(
            context.push(3, "C"),
            Err(DependencyError::MaxDepthExceeded { max_depth: 2, .. })
        ));
    }
}
