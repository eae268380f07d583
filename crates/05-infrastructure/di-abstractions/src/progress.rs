//! 组件构造进度上报

use tracing::debug;

/// 进度接收器
///
/// 容器在调用组件构造函数之前，以组件显示名上报一次进度。
pub trait ProgressSink: Send + Sync {
    /// 即将创建指定组件
    fn report(&self, component_name: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, component_name: &str) {
        self(component_name);
    }
}

/// 默认进度接收器，输出到 tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn report(&self, component_name: &str) {
        debug!("正在创建组件: {}", component_name);
    }
}
