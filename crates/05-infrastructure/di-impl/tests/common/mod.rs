//! 测试公共工具

#![allow(dead_code)]

use di_impl::{Repository, SharedInstanceCache};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// 初始化测试日志输出（多次调用只生效一次）
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// 使用独立全局缓存的根仓库，避免测试之间共享全局作用域实例
pub fn isolated_repository() -> Arc<Repository> {
    init_tracing();
    Repository::with_global_cache(SharedInstanceCache::new("test-global"))
}

/// 计数器
#[derive(Debug, Default)]
pub struct Counter(AtomicUsize);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
