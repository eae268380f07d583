//! # Infrastructure Common
//!
//! 这个 crate 提供了组件解析运行时各层共用的基础类型。
//!
//! ## 核心内容
//!
//! - [`TypeInfo`] - 类型元数据（组件类型、组件接口、配置类型）
//! - [`InstanceScope`] - 实例共享策略
//! - [`Disposable`] - 组件释放钩子
//! - [`ContainerConfig`] - 容器配置及其加载
//! - [`DependencyError`] / [`ConfigurationError`] - 错误分类
//!
//! ## 设计原则
//!
//! - 注册期错误与解析期错误分开建模
//! - 诊断信息携带类型名、参数名与构造函数签名

pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
