//! 容器并发解析与端到端集成测试

use di_abstractions::ComponentResolverExt;
use di_impl::{
    ComponentOptions, Container, DependencyError, InstanceScope, Repository, SharedInstanceCache,
};
use di_impl_integration_tests::{
    ICounter, IExecutor, IScheduler, LocalExecutor, Probe, RemoteExecutor, Scheduler, SlowCounter,
};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    });
}

fn register_counter(repository: &Repository, scope: InstanceScope, probe: &Arc<Probe>) {
    repository
        .add_component_with::<SlowCounter>(
            ComponentOptions::new(scope).with_config(Arc::clone(probe)),
        )
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_repository_scope_constructs_once() -> anyhow::Result<()> {
    init_tracing();
    let probe = Arc::new(Probe::default());
    let repository = Repository::with_global_cache(SharedInstanceCache::new("concurrent"));
    register_counter(&repository, InstanceScope::Repository, &probe);

    let mut handles = Vec::new();
    for _ in 0..32 {
        let repository = Arc::clone(&repository);
        handles.push(tokio::task::spawn_blocking(move || {
            let container = Container::new(repository);
            let counter = container.resolve::<dyn ICounter>()?;
            Ok::<_, DependencyError>((container, counter))
        }));
    }

    let mut resolved = Vec::with_capacity(handles.len());
    for handle in handles {
        resolved.push(handle.await??);
    }

    assert_eq!(probe.created(), 1);
    let (_, first) = &resolved[0];
    assert!(resolved
        .iter()
        .all(|(_, counter)| Arc::ptr_eq(counter, first) && counter.generation() == 1));

    for (container, _) in &resolved {
        container.dispose();
    }
    assert_eq!(probe.disposed(), 1);
    assert!(repository.shared_cache().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_global_scope_across_repositories() -> anyhow::Result<()> {
    init_tracing();
    let probe = Arc::new(Probe::default());
    let global = SharedInstanceCache::new("concurrent-global");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let repository = Repository::with_global_cache(Arc::clone(&global));
        register_counter(&repository, InstanceScope::Global, &probe);
        handles.push(tokio::task::spawn_blocking(move || {
            let container = Container::new(repository);
            let counter = container.resolve::<dyn ICounter>()?;
            Ok::<_, DependencyError>((container, counter))
        }));
    }

    let mut resolved = Vec::with_capacity(handles.len());
    for handle in handles {
        resolved.push(handle.await??);
    }

    assert_eq!(probe.created(), 1);
    assert_eq!(global.len(), 1);
    drop(resolved);
    assert_eq!(probe.disposed(), 1);
    assert!(global.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolution_within_one_container() -> anyhow::Result<()> {
    init_tracing();
    let probe = Arc::new(Probe::default());
    let repository = Repository::with_global_cache(SharedInstanceCache::new("single-container"));
    register_counter(&repository, InstanceScope::Container, &probe);

    let container = Container::new(repository);
    let mut handles = Vec::new();
    for _ in 0..16 {
        let container = container.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            container.resolve::<dyn ICounter>()
        }));
    }

    let mut counters = Vec::with_capacity(handles.len());
    for handle in handles {
        counters.push(handle.await??);
    }

    assert_eq!(probe.created(), 1);
    assert!(counters.iter().all(|counter| Arc::ptr_eq(counter, &counters[0])));
    assert_eq!(container.component_instances()?.len(), 1);

    container.dispose();
    assert_eq!(probe.disposed(), 1);
    Ok(())
}

#[test]
fn test_scheduler_graph_is_fully_wired() -> anyhow::Result<()> {
    init_tracing();
    let repository = Repository::with_global_cache(SharedInstanceCache::new("scheduler"));
    repository.add_component::<Scheduler>(InstanceScope::Container)?;
    repository.add_component::<LocalExecutor>(InstanceScope::Container)?;
    repository.add_component::<RemoteExecutor>(InstanceScope::Container)?;

    let container = Container::new(repository);
    let scheduler = container.resolve::<dyn IScheduler>()?;
    assert_eq!(scheduler.submit("build"), "local:build,remote:build");

    let executors = container.resolve_all::<dyn IExecutor>()?;
    assert_eq!(executors.len(), 2);
    for executor in &executors {
        let back = executor
            .scheduler()
            .ok_or_else(|| anyhow::anyhow!("executor was not wired"))?;
        assert!(Arc::ptr_eq(&back, &scheduler));
    }

    let names = container
        .component_instances()?
        .iter()
        .map(|instance| instance.descriptor().name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["LocalExecutor", "RemoteExecutor", "Scheduler"]);

    container.dispose();
    Ok(())
}

#[test]
fn test_child_container_overrides_executors() -> anyhow::Result<()> {
    init_tracing();
    let parent = Repository::with_global_cache(SharedInstanceCache::new("override"));
    parent.add_component::<Scheduler>(InstanceScope::Container)?;
    parent.add_component::<LocalExecutor>(InstanceScope::Container)?;
    parent.add_component::<RemoteExecutor>(InstanceScope::Container)?;

    let child = Repository::with_parent(&parent);
    child.add_component::<RemoteExecutor>(InstanceScope::Container)?;

    let container = Container::new(child);
    let scheduler = container.resolve::<dyn IScheduler>()?;
    assert_eq!(scheduler.submit("deploy"), "remote:deploy");
    Ok(())
}
