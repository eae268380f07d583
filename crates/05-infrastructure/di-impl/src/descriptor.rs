//! 组件描述符
//!
//! 每个已注册组件类型对应一个描述符。提供的接口集合在注册时一次性计算：
//! 直接实现的组件接口，加上委托属性的接口类型，再沿基接口传递闭包。

use crate::definition::{
    BindingDef, CastFn, Component, ComponentDefinition, ConstructorDef, DisposeFn, ErasedObject,
    InterfaceCast,
};
use crate::repository::Repository;
use crate::shared_cache::{InstanceKey, SharedInstanceCache};
use di_abstractions::{BaseInterface, InterfaceObject};
use infrastructure_common::{InstanceScope, TypeInfo};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_DESCRIPTOR_ID: AtomicU64 = AtomicU64::new(1);

/// 描述符标识（进程内唯一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(u64);

impl DescriptorId {
    fn next() -> Self {
        Self(NEXT_DESCRIPTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// 数值形式
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 接口提供项
#[derive(Clone)]
struct Provision {
    interface: TypeInfo,
    cast: CastFn,
    delegate: Option<String>,
}

/// 注册时的组件配置对象
#[derive(Clone)]
pub(crate) struct RegisteredConfig {
    pub(crate) value: ErasedObject,
    pub(crate) type_info: TypeInfo,
}

/// 组件描述符
pub struct Descriptor {
    id: DescriptorId,
    type_info: TypeInfo,
    name: String,
    scope: InstanceScope,
    config: Option<RegisteredConfig>,
    repository: Weak<Repository>,
    private_repository: Option<Arc<Repository>>,
    shared_cache: Option<Arc<SharedInstanceCache>>,
    provisions: Vec<Provision>,
    bindings: Vec<BindingDef>,
    constructors: Vec<ConstructorDef>,
    dispose: Option<DisposeFn>,
}

impl Descriptor {
    pub(crate) fn new<T: Component>(
        definition: ComponentDefinition<T>,
        scope: InstanceScope,
        config: Option<RegisteredConfig>,
        repository: Weak<Repository>,
        private_repository: Option<Arc<Repository>>,
        shared_cache: Option<Arc<SharedInstanceCache>>,
    ) -> Self {
        let type_info = TypeInfo::of::<T>();
        let name = definition
            .name
            .clone()
            .unwrap_or_else(|| type_info.name.clone());

        let mut provisions = Vec::new();
        for cast in definition.interfaces.iter().chain(&definition.delegates) {
            add_provision(&mut provisions, cast);
        }

        Self {
            id: DescriptorId::next(),
            type_info,
            name,
            scope,
            config,
            repository,
            private_repository,
            shared_cache,
            provisions,
            bindings: definition.bindings,
            constructors: definition.constructors,
            dispose: definition.dispose,
        }
    }

    /// 描述符标识
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// 显示名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 组件实现类型
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 实例共享策略
    pub fn scope(&self) -> InstanceScope {
        self.scope
    }

    /// 注册时提供的配置对象
    pub fn config(&self) -> Option<&ErasedObject> {
        self.config.as_ref().map(|config| &config.value)
    }

    /// 配置对象的运行时类型
    pub fn config_type(&self) -> Option<&TypeInfo> {
        self.config.as_ref().map(|config| &config.type_info)
    }

    /// 所属仓库
    pub fn repository(&self) -> Option<Arc<Repository>> {
        self.repository.upgrade()
    }

    /// 注册时提供的私有仓库
    pub fn private_repository(&self) -> Option<&Arc<Repository>> {
        self.private_repository.as_ref()
    }

    /// 仓库类型参数绑定的仓库：私有仓库优先，否则为所属仓库
    pub fn bound_repository(&self) -> Option<Arc<Repository>> {
        self.private_repository
            .clone()
            .or_else(|| self.repository())
    }

    /// 是否提供指定接口
    pub fn provides_interface(&self, interface: &TypeInfo) -> bool {
        self.provisions
            .iter()
            .any(|provision| provision.interface == *interface)
    }

    /// 提供的全部接口（直接实现的在前，委托的在后）
    pub fn provided_interfaces(&self) -> impl Iterator<Item = &TypeInfo> {
        self.provisions.iter().map(|provision| &provision.interface)
    }

    /// 通过委托属性提供指定接口时，返回属性名
    pub fn delegate_for(&self, interface: &TypeInfo) -> Option<&str> {
        self.provisions
            .iter()
            .find(|provision| provision.interface == *interface)
            .and_then(|provision| provision.delegate.as_deref())
    }

    /// 把组件对象适配为指定接口
    ///
    /// 组件类型本身实现了该接口时返回自身；否则查找类型匹配的委托属性并返回其当前值；
    /// 都不满足时返回 `None`，由调用方决定是否视为错误。
    pub fn try_cast_to(&self, object: &ErasedObject, interface: &TypeInfo) -> Option<InterfaceObject> {
        self.provisions
            .iter()
            .find(|provision| provision.interface == *interface)
            .and_then(|provision| (provision.cast)(object))
    }

    /// 延迟绑定槽
    pub fn bindings(&self) -> &[BindingDef] {
        &self.bindings
    }

    /// 构造函数（按声明顺序）
    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    /// 对组件对象调用释放钩子（未声明时不做任何事）
    pub(crate) fn dispose_object(&self, object: &ErasedObject) {
        if let Some(dispose) = &self.dispose {
            dispose(object);
        }
    }

    pub(crate) fn dispose_hook(&self) -> Option<DisposeFn> {
        self.dispose.clone()
    }

    /// 共享实例所在的缓存及键；容器作用域返回 `None`
    pub(crate) fn shared_slot(&self) -> Option<(&Arc<SharedInstanceCache>, InstanceKey)> {
        let key = match self.scope {
            InstanceScope::Container => return None,
            InstanceScope::Repository => InstanceKey::Descriptor(self.id),
            InstanceScope::Global => InstanceKey::Type(self.type_info.id),
        };
        self.shared_cache.as_ref().map(|cache| (cache, key))
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.type_info.name)
            .field("scope", &self.scope)
            .field(
                "provides",
                &self.provided_interfaces().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            )
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}

fn add_provision(provisions: &mut Vec<Provision>, cast: &InterfaceCast) {
    push_closure(
        provisions,
        &cast.info,
        &cast.bases,
        &cast.cast,
        cast.delegate.as_deref(),
    );
}

/// 加入接口本身，再递归加入它的基接口；已存在的接口保持先到者
fn push_closure(
    provisions: &mut Vec<Provision>,
    interface: &TypeInfo,
    bases: &[BaseInterface],
    cast: &CastFn,
    delegate: Option<&str>,
) {
    if !provisions.iter().any(|p| p.interface == *interface) {
        provisions.push(Provision {
            interface: interface.clone(),
            cast: Arc::clone(cast),
            delegate: delegate.map(str::to_string),
        });
    }

    for base in bases {
        let parent = Arc::clone(cast);
        let upcast = Arc::clone(base.upcast());
        let through_base: CastFn = Arc::new(move |object: &ErasedObject| {
            parent(object).and_then(|wide| upcast(&wide))
        });
        push_closure(provisions, base.info(), &base.bases(), &through_base, delegate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::component_interface;

    trait IBackend: Send + Sync {
        fn id(&self) -> u32;
    }

    trait IStorage: IBackend {
        fn capacity(&self) -> usize;
    }

    trait IFacade: Send + Sync {}

    component_interface!(dyn IBackend);
    component_interface!(dyn IStorage: dyn IBackend);
    component_interface!(dyn IFacade);

    struct Disk;

    impl IBackend for Disk {
        fn id(&self) -> u32 {
            7
        }
    }

    impl IStorage for Disk {
        fn capacity(&self) -> usize {
            1024
        }
    }

    struct Facade {
        storage: Arc<Disk>,
    }

    impl IFacade for Facade {}

    impl Component for Facade {
        fn describe(definition: &mut ComponentDefinition<Self>) {
            definition
                .name("Front")
                .implements::<dyn IFacade>(|this| this)
                .delegate::<dyn IStorage>("storage", |this| {
                    Some(Arc::clone(&this.storage) as Arc<dyn IStorage>)
                })
                .constructor("new")
                .build(|_| {
                    Ok(Facade {
                        storage: Arc::new(Disk),
                    })
                });
        }
    }

    fn descriptor() -> Descriptor {
        Descriptor::new(
            ComponentDefinition::<Facade>::collect(),
            InstanceScope::Container,
            None,
            Weak::new(),
            None,
            None,
        )
    }

    #[test]
    fn test_provided_interfaces_include_delegates_and_bases() {
        let descriptor = descriptor();
        assert_eq!(descriptor.name(), "Front");
        assert!(descriptor.provides_interface(&TypeInfo::of::<dyn IFacade>()));
        assert!(descriptor.provides_interface(&TypeInfo::of::<dyn IStorage>()));
        assert!(descriptor.provides_interface(&TypeInfo::of::<dyn IBackend>()));

        let names = descriptor
            .provided_interfaces()
            .map(|i| i.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["IFacade", "IStorage", "IBackend"]);
        assert_eq!(descriptor.delegate_for(&TypeInfo::of::<dyn IBackend>()), Some("storage"));
        assert_eq!(descriptor.delegate_for(&TypeInfo::of::<dyn IFacade>()), None);
    }

    #[test]
    fn test_try_cast_to_uses_delegate_value() {
        let descriptor = descriptor();
        let object: ErasedObject = Arc::new(Facade {
            storage: Arc::new(Disk),
        });

        let backend = descriptor
            .try_cast_to(&object, &TypeInfo::of::<dyn IBackend>())
            .and_then(|o| o.downcast::<dyn IBackend>())
            .unwrap();
        assert_eq!(backend.id(), 7);

        let storage = descriptor
            .try_cast_to(&object, &TypeInfo::of::<dyn IStorage>())
            .and_then(|o| o.downcast::<dyn IStorage>())
            .unwrap();
        assert_eq!(storage.capacity(), 1024);
    }

    #[test]
    fn test_try_cast_to_unknown_interface() {
        trait IOther: Send + Sync {}
        component_interface!(dyn IOther);

        let descriptor = descriptor();
        let object: ErasedObject = Arc::new(Facade {
            storage: Arc::new(Disk),
        });
        assert!(!descriptor.provides_interface(&TypeInfo::of::<dyn IOther>()));
        assert!(descriptor
            .try_cast_to(&object, &TypeInfo::of::<dyn IOther>())
            .is_none());
    }

    #[test]
    fn test_constructor_signature() {
        let descriptor = descriptor();
        assert_eq!(descriptor.constructors()[0].signature(), "Facade::new()");
    }
}
