//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件接口标记和依赖解析的核心契约。
//!
//! ## 核心接口
//!
//! - [`ComponentInterface`] - 组件接口标记（可作为解析键的 `dyn Trait`）
//! - [`InterfaceObject`] - 类型擦除后的接口对象
//! - [`Binding`] - 延迟绑定槽，用于打破循环依赖
//! - [`ComponentResolver`] - 容器契约（判断可解析性、解析单个/全部提供者）
//! - [`ProgressSink`] - 组件构造进度上报

pub mod binding;
pub mod interface;
pub mod progress;
pub mod resolver;

pub use binding::*;
pub use interface::*;
pub use progress::*;
pub use resolver::*;

pub use infrastructure_common::TypeInfo;
