//! 组件实例生命周期

use serde::{Deserialize, Serialize};
use std::fmt;

/// 组件实例的共享策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceScope {
    /// 容器作用域 - 每个容器各自持有一个实例，不跨容器共享
    #[default]
    Container,
    /// 仓库作用域 - 通过同一描述符解析的所有容器共享一个实例，按引用容器计数
    Repository,
    /// 全局作用域 - 进程内共享一个实例，与仓库层级无关
    Global,
}

impl InstanceScope {
    /// 是否为跨容器共享（需要引用计数）的作用域
    pub fn is_shared(self) -> bool {
        !matches!(self, Self::Container)
    }
}

impl fmt::Display for InstanceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Container => "container",
            Self::Repository => "repository",
            Self::Global => "global",
        };
        f.write_str(name)
    }
}

/// 组件释放钩子
///
/// 实例最后一个引用者释放它时调用，且只调用一次。
pub trait Disposable: Send + Sync {
    /// 释放组件持有的资源
    fn dispose(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_scopes() {
        assert!(!InstanceScope::Container.is_shared());
        assert!(InstanceScope::Repository.is_shared());
        assert!(InstanceScope::Global.is_shared());
        assert_eq!(InstanceScope::default(), InstanceScope::Container);
    }

    #[test]
    fn test_scope_deserializes_from_snake_case() {
        let scope: InstanceScope = serde_json::from_str("\"repository\"").unwrap();
        assert_eq!(scope, InstanceScope::Repository);
        assert_eq!(InstanceScope::Global.to_string(), "global");
    }
}
