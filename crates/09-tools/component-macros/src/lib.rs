//! # Component Macros
//!
//! 这个 crate 提供了用于声明组件接口标记的过程宏。
//!
//! ## 核心宏
//!
//! - [`component_interface`] - 把 trait 标记为组件接口，并把同样被标记的父 trait 登记为基接口
//!
//! ## 使用示例
//!
//! ```ignore
//! use component_macros::component_interface;
//!
//! #[component_interface]
//! pub trait IBackend: Send + Sync {
//!     fn endpoint(&self) -> String;
//! }
//!
//! #[component_interface(name = "Storage")]
//! pub trait IStorage: IBackend {
//!     fn capacity(&self) -> usize;
//! }
//! ```
//!
//! 生成的代码引用 `::di_abstractions`，使用方需要直接依赖该 crate。

use proc_macro::TokenStream;

mod interface;
mod utils;

/// 组件接口标记宏
///
/// 为 `dyn Trait` 实现 `di_abstractions::ComponentInterface`。
///
/// # 参数
///
/// - `name = "DisplayName"` - 自定义诊断信息中的接口名称（默认为 trait 名）
///
/// # 基接口
///
/// 除 `Send`、`Sync`、`Any`、`Debug` 等标准标记 trait 外，所有父 trait 都视为基接口，
/// 它们本身也必须是组件接口。没有任何基接口时，trait 必须显式声明 `Send + Sync`。
///
/// 泛型 trait 不能作为组件接口。
#[proc_macro_attribute]
pub fn component_interface(args: TokenStream, input: TokenStream) -> TokenStream {
    interface::component_interface_impl(args.into(), input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
