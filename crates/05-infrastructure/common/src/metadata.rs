//! 元数据定义
//!
//! 提供组件类型、组件接口和配置类型的元数据信息

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型信息
///
/// 相等性只由 [`TypeId`] 决定，名称仅用于诊断输出。
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// 类型名称（不包含模块路径）
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整类型路径
    pub module_path: String,
}

impl TypeInfo {
    /// 创建新的类型信息
    pub fn new(type_id: TypeId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            module_path: name.clone(),
            name,
            id: type_id,
        }
    }

    /// 从类型获取类型信息
    ///
    /// 同时支持具体类型和 `dyn Trait` 这类非定长类型。
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full_name = std::any::type_name::<T>();
        Self {
            name: short_type_name(full_name),
            id: TypeId::of::<T>(),
            module_path: full_name.to_string(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// 判断是否为指定类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 去掉模块路径和 `dyn ` 前缀，保留泛型参数的简短名称
fn short_type_name(full_name: &str) -> String {
    let trimmed = full_name.trim_start_matches("dyn ");
    let (head, generics) = match trimmed.find('<') {
        Some(index) => trimmed.split_at(index),
        None => (trimmed, ""),
    };
    let base = head.rsplit("::").next().unwrap_or(head);
    if generics.is_empty() {
        return base.to_string();
    }

    let inner = &generics[1..generics.len().saturating_sub(1)];
    let arguments = inner
        .split(',')
        .map(|argument| short_type_name(argument.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{base}<{arguments}>")
}
