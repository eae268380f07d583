//! 错误类型定义

use std::fmt;
use thiserror::Error;

/// 组件工厂返回的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置加载错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 注册期（配置）错误
///
/// 在组件注册阶段立即失败，不会重试。
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("组件重复注册: {type_name} 已在该仓库中注册")]
    DuplicateRegistration { type_name: String },

    #[error("组件未声明任何构造函数: {type_name}")]
    NoConstructors { type_name: String },
}

/// 构造函数被判定为不可用的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// 参数接口没有任何已注册的提供者
    UnregisteredInterface,
    /// 参数需要配置对象，但注册时没有提供
    ConfigurationMissing,
    /// 注册时提供的配置对象类型与参数类型不一致
    ConfigurationTypeMismatch { actual: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnregisteredInterface => write!(f, "接口未注册"),
            Self::ConfigurationMissing => write!(f, "注册时未提供配置对象"),
            Self::ConfigurationTypeMismatch { actual } => {
                write!(f, "配置对象类型不匹配 (实际为 {actual})")
            }
        }
    }
}

/// 单个构造函数的拒绝诊断
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorRejection {
    /// 构造函数签名，例如 `Widget::new(foo: IFoo, bar: IBar)`
    pub constructor: String,
    /// 第一个不满足条件的参数名
    pub parameter: String,
    /// 该参数的类型名
    pub parameter_type: String,
    /// 拒绝原因
    pub reason: RejectionReason,
}

impl fmt::Display for ConstructorRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: 参数 `{}` ({}) 不可用 - {}",
            self.constructor, self.parameter, self.parameter_type, self.reason
        )
    }
}

fn format_rejections(rejections: &[ConstructorRejection]) -> String {
    rejections
        .iter()
        .map(|rejection| format!("\n  - {rejection}"))
        .collect()
}

/// 依赖解析错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    #[error("没有可用的构造函数: {component}{}", format_rejections(.rejections))]
    NoEligibleConstructor {
        component: String,
        rejections: Vec<ConstructorRejection>,
    },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: BoxError,
    },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("解析深度超过上限 {max_depth}: {dependency_chain}")]
    MaxDepthExceeded {
        max_depth: usize,
        dependency_chain: String,
    },

    #[error("内部一致性错误: 组件 {component} 声明提供接口 {interface}，但类型转换失败")]
    CastFailed { component: String, interface: String },

    #[error("构造参数类型不匹配: {component} 第 {index} 个参数, 期望 {expected}")]
    ArgumentMismatch {
        component: String,
        index: usize,
        expected: String,
    },

    #[error("组件 {component} 的所属仓库已被释放")]
    RepositoryUnavailable { component: String },

    #[error("容器已释放: {container_id}")]
    ContainerDisposed { container_id: String },

    #[error("实例已释放: {component}")]
    InstanceDisposed { component: String },
}

impl DependencyError {
    /// 是否属于内部一致性错误（编程契约被破坏，而非注册错误）
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::CastFailed { .. } | Self::InstanceDisposed { .. } | Self::ArgumentMismatch { .. }
        )
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
