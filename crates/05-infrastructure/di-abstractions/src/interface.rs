//! 组件接口标记
//!
//! 只有实现了 [`ComponentInterface`] 的 `dyn Trait` 才能作为解析键，
//! 也只有这样的接口才能满足构造函数依赖。

use infrastructure_common::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 组件接口标记 trait
///
/// 为 `dyn Trait` 实现。通常由 [`component_interface!`](crate::component_interface)
/// 或 `#[component_interface]` 属性宏生成，不需要手写。
pub trait ComponentInterface: Send + Sync + 'static {
    /// 接口类型信息
    fn info() -> TypeInfo {
        TypeInfo::of::<Self>()
    }

    /// 直接基接口（即同样被标记为组件接口的父 trait）
    fn bases() -> Vec<BaseInterface> {
        Vec::new()
    }
}

/// 接口对象之间的转换函数
pub type UpcastFn = Arc<dyn Fn(&InterfaceObject) -> Option<InterfaceObject> + Send + Sync>;

/// 基接口描述
///
/// 记录基接口的类型信息，以及把子接口对象向上转换为基接口对象的方法。
#[derive(Clone)]
pub struct BaseInterface {
    info: TypeInfo,
    upcast: UpcastFn,
    bases: fn() -> Vec<BaseInterface>,
}

impl BaseInterface {
    /// 描述 `W` 的基接口 `N`
    pub fn of<W, N>(upcast: fn(Arc<W>) -> Arc<N>) -> Self
    where
        W: ComponentInterface + ?Sized,
        N: ComponentInterface + ?Sized,
    {
        Self {
            info: N::info(),
            upcast: Arc::new(move |object: &InterfaceObject| {
                object
                    .downcast::<W>()
                    .map(|wide| InterfaceObject::new(upcast(wide)))
            }),
            bases: N::bases,
        }
    }

    /// 基接口类型信息
    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    /// 向上转换函数
    pub fn upcast(&self) -> &UpcastFn {
        &self.upcast
    }

    /// 基接口自身的基接口
    pub fn bases(&self) -> Vec<BaseInterface> {
        (self.bases)()
    }
}

impl fmt::Debug for BaseInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseInterface")
            .field("info", &self.info)
            .field("upcast", &"<function>")
            .finish()
    }
}

/// 类型擦除后的接口对象
///
/// 内部保存 `Arc<dyn I>`，可以按接口类型取回。
#[derive(Clone)]
pub struct InterfaceObject {
    interface: TypeInfo,
    value: Arc<dyn Any + Send + Sync>,
}

impl InterfaceObject {
    /// 包装一个接口引用
    pub fn new<I>(value: Arc<I>) -> Self
    where
        I: ComponentInterface + ?Sized,
    {
        Self {
            interface: I::info(),
            value: Arc::new(value),
        }
    }

    /// 对象对应的接口
    pub fn interface(&self) -> &TypeInfo {
        &self.interface
    }

    /// 取回接口引用；接口类型不一致时返回 `None`
    pub fn downcast<I>(&self) -> Option<Arc<I>>
    where
        I: ComponentInterface + ?Sized,
    {
        self.value.downcast_ref::<Arc<I>>().cloned()
    }
}

impl fmt::Debug for InterfaceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceObject")
            .field("interface", &self.interface.name)
            .finish_non_exhaustive()
    }
}

/// 为 `dyn Trait` 声明组件接口标记
///
/// ```ignore
/// pub trait INarrow: Send + Sync { fn ping(&self) -> u32; }
/// pub trait IWide: INarrow { fn pong(&self) -> u32; }
///
/// component_interface!(dyn INarrow);
/// component_interface!(dyn IWide: dyn INarrow);
/// ```
#[macro_export]
macro_rules! component_interface {
    ($iface:ty : $($base:ty),+ $(,)?) => {
        impl $crate::ComponentInterface for $iface {
            fn bases() -> ::std::vec::Vec<$crate::BaseInterface> {
                ::std::vec![$($crate::BaseInterface::of::<$iface, $base>(|this| this)),+]
            }
        }
    };
    ($iface:ty) => {
        impl $crate::ComponentInterface for $iface {}
    };
}
