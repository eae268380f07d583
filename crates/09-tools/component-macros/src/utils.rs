//! 宏工具函数

use syn::punctuated::Punctuated;
use syn::{Path, Token, TraitBoundModifier, TypeParamBound};

/// 不视为基接口的标准 trait
const MARKER_TRAITS: &[&str] = &[
    "Send", "Sync", "Sized", "Unpin", "Any", "Debug", "Display", "Clone", "Copy",
];

/// 路径最后一段的名称
pub fn last_segment(path: &Path) -> Option<String> {
    path.segments.last().map(|segment| segment.ident.to_string())
}

/// 是否为标准标记 trait
pub fn is_marker_trait(path: &Path) -> bool {
    last_segment(path).is_some_and(|name| MARKER_TRAITS.contains(&name.as_str()))
}

/// 父 trait 中的组件基接口（保持声明顺序）
pub fn component_bases(supertraits: &Punctuated<TypeParamBound, Token![+]>) -> Vec<&Path> {
    supertraits
        .iter()
        .filter_map(|bound| match bound {
            TypeParamBound::Trait(trait_bound)
                if matches!(trait_bound.modifier, TraitBoundModifier::None)
                    && !is_marker_trait(&trait_bound.path) =>
            {
                Some(&trait_bound.path)
            }
            _ => None,
        })
        .collect()
}

/// 父 trait 中是否直接声明了指定的标记 trait
pub fn has_marker_bound(supertraits: &Punctuated<TypeParamBound, Token![+]>, name: &str) -> bool {
    supertraits.iter().any(|bound| match bound {
        TypeParamBound::Trait(trait_bound) => {
            last_segment(&trait_bound.path).is_some_and(|last| last == name)
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{parse_quote, ItemTrait};

    #[test]
    fn test_component_bases_skip_markers() {
        let item: ItemTrait = parse_quote! {
            pub trait IStorage: IBackend + std::fmt::Debug + Send + Sync + 'static + crate::IMetrics {}
        };

        let bases = component_bases(&item.supertraits)
            .into_iter()
            .filter_map(last_segment)
            .collect::<Vec<_>>();
        assert_eq!(bases, vec!["IBackend", "IMetrics"]);
    }

    #[test]
    fn test_has_marker_bound() {
        let item: ItemTrait = parse_quote! {
            pub trait ILogger: Send + std::marker::Sync {}
        };
        assert!(has_marker_bound(&item.supertraits, "Send"));
        assert!(has_marker_bound(&item.supertraits, "Sync"));
        assert!(!has_marker_bound(&item.supertraits, "Debug"));
    }

    #[test]
    fn test_is_marker_trait() {
        assert!(is_marker_trait(&parse_quote!(std::any::Any)));
        assert!(is_marker_trait(&parse_quote!(Display)));
        assert!(!is_marker_trait(&parse_quote!(ILogger)));
    }
}
