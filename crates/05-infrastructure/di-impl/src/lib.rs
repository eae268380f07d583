//! # 依赖注入具体实现
//!
//! 提供组件仓库、描述符、实例及容器的具体实现。
//!
//! ## 解析流程
//!
//! 调用方向容器请求接口 → 容器向仓库查询提供该接口的描述符 →
//! 描述符对应的实例（按作用域新建或复用）创建对象 → 实例选择构造函数、
//! 通过容器递归解析每个参数、构造对象，并完成延迟绑定接线。
//!
//! ## 作用域
//!
//! - [`InstanceScope::Container`] - 每个容器一个实例
//! - [`InstanceScope::Repository`] - 同一描述符在所有容器间共享
//! - [`InstanceScope::Global`] - 按实现类型在进程内共享
//!
//! 共享实例按引用它的容器集合计数，最后一个容器释放时调用释放钩子。
//!
//! ```ignore
//! let repository = Repository::new();
//! repository.add_component::<ConsoleLogger>(InstanceScope::Global)?;
//! let container = Container::new(repository);
//! let logger = container.resolve::<dyn ILogger>()?;
//! ```

pub mod arguments;
pub mod container;
pub mod definition;
pub mod descriptor;
pub mod instance;
pub mod instance_cache;
pub mod repository;
pub mod shared_cache;

pub use arguments::{Argument, Arguments};
pub use container::{Container, ContainerBuilder, ContainerId};
pub use definition::{
    BindingDef, Component, ComponentDefinition, ConstructorBuilder, ConstructorDef, ErasedObject,
    ParameterDef, ParameterKind,
};
pub use descriptor::{Descriptor, DescriptorId};
pub use instance::Instance;
pub use instance_cache::{BindingWirer, InstanceCache, InstanceObserver};
pub use repository::{ComponentOptions, Repository};
pub use shared_cache::{InstanceKey, SharedInstance, SharedInstanceCache};

pub use di_abstractions::*;
pub use infrastructure_common::{
    ConfigurationError, ContainerConfig, DependencyError, Disposable, InstanceScope,
};
