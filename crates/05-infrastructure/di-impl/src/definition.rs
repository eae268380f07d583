//! 组件定义
//!
//! 组件通过 [`Component::describe`] 一次性声明自己的能力表：显示名、直接实现的接口、
//! 委托属性、延迟绑定槽、构造函数以及释放钩子。注册时据此构建描述符，
//! 解析路径上不再做任何反射式的查找。

use crate::arguments::Arguments;
use di_abstractions::{BaseInterface, Binding, ComponentInterface, InterfaceObject};
use infrastructure_common::{BoxError, Disposable, TypeInfo};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除后的组件对象（内部为具体组件类型 `T`）
pub type ErasedObject = Arc<dyn Any + Send + Sync>;

/// 从组件对象取得某个接口对象
pub(crate) type CastFn = Arc<dyn Fn(&ErasedObject) -> Option<InterfaceObject> + Send + Sync>;
pub(crate) type FactoryFn = Arc<dyn Fn(&Arguments) -> Result<ErasedObject, BoxError> + Send + Sync>;
pub(crate) type DisposeFn = Arc<dyn Fn(&ErasedObject) + Send + Sync>;
type ProbeFn = Arc<dyn Fn(&ErasedObject) -> bool + Send + Sync>;
type BindFn = Arc<dyn Fn(&ErasedObject, &InterfaceObject) -> bool + Send + Sync>;

/// 组件标记 trait
///
/// 只有实现了此 trait 的类型才能注册到仓库。
///
/// ```ignore
/// impl Component for Widget {
///     fn describe(definition: &mut ComponentDefinition<Self>) {
///         definition
///             .implements::<dyn IWidget>(|this| this)
///             .constructor("new")
///             .interface::<dyn IFoo>("foo")
///             .build(|args| Ok(Widget::new(args.interface(0)?)));
///     }
/// }
/// ```
pub trait Component: Send + Sync + Sized + 'static {
    /// 声明组件能力
    fn describe(definition: &mut ComponentDefinition<Self>);
}

/// 构造参数种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// 单个组件接口
    Interface(TypeInfo),
    /// 组件接口列表（没有提供者时为空列表）
    InterfaceList(TypeInfo),
    /// 组件仓库（私有仓库优先，否则为所属仓库）
    Repository,
    /// 当前容器
    Container,
    /// 注册时提供的配置对象
    Config(TypeInfo),
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interface(info) | Self::Config(info) => write!(f, "{}", info.name),
            Self::InterfaceList(info) => write!(f, "[{}]", info.name),
            Self::Repository => f.write_str("Repository"),
            Self::Container => f.write_str("Container"),
        }
    }
}

/// 构造参数声明
#[derive(Debug, Clone)]
pub struct ParameterDef {
    name: String,
    kind: ParameterKind,
}

impl ParameterDef {
    /// 参数名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 参数种类
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }
}

/// 构造函数声明
#[derive(Clone)]
pub struct ConstructorDef {
    signature: String,
    parameters: Vec<ParameterDef>,
    factory: FactoryFn,
}

impl ConstructorDef {
    /// 构造函数签名，例如 `Widget::new(foo: IFoo)`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// 参数列表（按声明顺序）
    pub fn parameters(&self) -> &[ParameterDef] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, arguments: &Arguments) -> Result<ErasedObject, BoxError> {
        (self.factory)(arguments)
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("signature", &self.signature)
            .field("parameters", &self.parameters)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 接口提供方式（直接实现或委托属性），附带基接口
#[derive(Clone)]
pub(crate) struct InterfaceCast {
    pub(crate) info: TypeInfo,
    pub(crate) bases: Vec<BaseInterface>,
    pub(crate) cast: CastFn,
    pub(crate) delegate: Option<String>,
}

/// 延迟绑定槽声明
#[derive(Clone)]
pub struct BindingDef {
    name: String,
    interface: TypeInfo,
    probe: ProbeFn,
    bind: BindFn,
}

impl BindingDef {
    /// 属性名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 槽接受的接口
    pub fn interface(&self) -> &TypeInfo {
        &self.interface
    }

    /// 组件对象上的该槽是否已绑定
    pub fn is_bound(&self, object: &ErasedObject) -> bool {
        (self.probe)(object)
    }

    /// 尝试把候选接口对象赋给组件对象上的该槽
    pub fn try_satisfy(&self, object: &ErasedObject, candidate: &InterfaceObject) -> bool {
        (self.bind)(object, candidate)
    }
}

impl fmt::Debug for BindingDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingDef")
            .field("name", &self.name)
            .field("interface", &self.interface.name)
            .finish_non_exhaustive()
    }
}

/// 组件定义
pub struct ComponentDefinition<T> {
    pub(crate) name: Option<String>,
    pub(crate) interfaces: Vec<InterfaceCast>,
    pub(crate) delegates: Vec<InterfaceCast>,
    pub(crate) bindings: Vec<BindingDef>,
    pub(crate) constructors: Vec<ConstructorDef>,
    pub(crate) dispose: Option<DisposeFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentDefinition<T> {
    pub(crate) fn collect() -> Self {
        let mut definition = Self {
            name: None,
            interfaces: Vec::new(),
            delegates: Vec::new(),
            bindings: Vec::new(),
            constructors: Vec::new(),
            dispose: None,
            _marker: PhantomData,
        };
        T::describe(&mut definition);
        definition
    }

    /// 设置显示名（默认为类型名）
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// 声明直接实现的组件接口
    ///
    /// `cast` 通常写作 `|this| this`，由编译器完成 `Arc<T>` 到 `Arc<dyn I>` 的转换。
    pub fn implements<I>(
        &mut self,
        cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    ) -> &mut Self
    where
        I: ComponentInterface + ?Sized,
    {
        self.interfaces.push(InterfaceCast {
            info: I::info(),
            bases: I::bases(),
            cast: Arc::new(move |object: &ErasedObject| {
                object
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|this| InterfaceObject::new(cast(this)))
            }),
            delegate: None,
        });
        self
    }

    /// 声明委托属性：该属性返回的对象作为组件的额外接口
    pub fn delegate<I>(
        &mut self,
        name: &str,
        getter: impl Fn(&T) -> Option<Arc<I>> + Send + Sync + 'static,
    ) -> &mut Self
    where
        I: ComponentInterface + ?Sized,
    {
        self.delegates.push(InterfaceCast {
            info: I::info(),
            bases: I::bases(),
            cast: Arc::new(move |object: &ErasedObject| {
                object
                    .downcast_ref::<T>()
                    .and_then(|this| getter(this))
                    .map(InterfaceObject::new)
            }),
            delegate: Some(name.to_string()),
        });
        self
    }

    /// 声明延迟绑定槽：容器中出现能满足该接口的实例时自动赋值
    pub fn binding<I>(
        &mut self,
        name: &str,
        slot: impl Fn(&T) -> &Binding<I> + Send + Sync + 'static,
    ) -> &mut Self
    where
        I: ComponentInterface + ?Sized,
    {
        let slot = Arc::new(slot);
        let probe_slot = Arc::clone(&slot);
        self.bindings.push(BindingDef {
            name: name.to_string(),
            interface: I::info(),
            probe: Arc::new(move |object: &ErasedObject| {
                object
                    .downcast_ref::<T>()
                    .is_some_and(|this| (*probe_slot)(this).is_bound())
            }),
            bind: Arc::new(move |object: &ErasedObject, candidate: &InterfaceObject| {
                match (object.downcast_ref::<T>(), candidate.downcast::<I>()) {
                    (Some(this), Some(value)) => (*slot)(this).bind(value),
                    _ => false,
                }
            }),
        });
        self
    }

    /// 启用释放钩子
    pub fn disposable(&mut self) -> &mut Self
    where
        T: Disposable,
    {
        self.dispose = Some(Arc::new(|object: &ErasedObject| {
            if let Some(this) = object.downcast_ref::<T>() {
                this.dispose();
            }
        }));
        self
    }

    /// 开始声明一个构造函数
    pub fn constructor(&mut self, name: &str) -> ConstructorBuilder<'_, T> {
        ConstructorBuilder {
            definition: self,
            name: name.to_string(),
            parameters: Vec::new(),
        }
    }
}

/// 构造函数构建器
pub struct ConstructorBuilder<'a, T> {
    definition: &'a mut ComponentDefinition<T>,
    name: String,
    parameters: Vec<ParameterDef>,
}

impl<'a, T: Component> ConstructorBuilder<'a, T> {
    fn parameter(mut self, name: &str, kind: ParameterKind) -> Self {
        self.parameters.push(ParameterDef {
            name: name.to_string(),
            kind,
        });
        self
    }

    /// 单个组件接口参数
    pub fn interface<I>(self, name: &str) -> Self
    where
        I: ComponentInterface + ?Sized,
    {
        self.parameter(name, ParameterKind::Interface(I::info()))
    }

    /// 组件接口列表参数
    pub fn interfaces<I>(self, name: &str) -> Self
    where
        I: ComponentInterface + ?Sized,
    {
        self.parameter(name, ParameterKind::InterfaceList(I::info()))
    }

    /// 仓库参数
    pub fn repository(self, name: &str) -> Self {
        self.parameter(name, ParameterKind::Repository)
    }

    /// 容器参数
    pub fn container(self, name: &str) -> Self {
        self.parameter(name, ParameterKind::Container)
    }

    /// 配置对象参数
    pub fn config<C>(self, name: &str) -> Self
    where
        C: Send + Sync + 'static,
    {
        self.parameter(name, ParameterKind::Config(TypeInfo::of::<C>()))
    }

    /// 完成声明
    pub fn build(
        self,
        factory: impl Fn(&Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    ) -> &'a mut ComponentDefinition<T> {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| format!("{}: {}", parameter.name, parameter.kind))
            .collect::<Vec<_>>()
            .join(", ");
        let signature = format!("{}::{}({})", TypeInfo::of::<T>().name, self.name, parameters);

        self.definition.constructors.push(ConstructorDef {
            signature,
            parameters: self.parameters,
            factory: Arc::new(move |arguments: &Arguments| {
                factory(arguments).map(|component| Arc::new(component) as ErasedObject)
            }),
        });
        self.definition
    }
}
