//! 延迟绑定槽
//!
//! 构造函数注入无法表达循环依赖：A 的构造函数需要 B，而 B 又需要引用 A。
//! 此时 B 可以暴露一个 [`Binding`] 槽，在两端都创建完成后由容器填充。

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// 延迟绑定槽
///
/// 只能赋值一次；从未被满足的槽保持为空，这不是错误。
///
/// 仓库或全局作用域的组件被多个容器共享，它的槽由第一个满足它的容器赋值，
/// 此后始终指向那个对象；即使该容器已释放，槽仍持有原对象的引用，
/// 其他容器中的同类对象不会替换它。需要按容器区分的回指应使用容器作用域。
pub struct Binding<I: ?Sized> {
    slot: OnceCell<Arc<I>>,
}

impl<I: ?Sized> Binding<I> {
    /// 创建空槽
    pub fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// 当前绑定的对象
    pub fn get(&self) -> Option<Arc<I>> {
        self.slot.get().cloned()
    }

    /// 是否已绑定
    pub fn is_bound(&self) -> bool {
        self.slot.get().is_some()
    }

    /// 绑定对象；槽已被占用时返回 `false` 且保持原值
    pub fn bind(&self, value: Arc<I>) -> bool {
        self.slot.set(value).is_ok()
    }
}

impl<I: ?Sized> Default for Binding<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized> fmt::Debug for Binding<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("bound", &self.is_bound())
            .finish()
    }
}
