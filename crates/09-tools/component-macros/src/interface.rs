//! 组件接口标记宏实现

use crate::utils::{component_bases, has_marker_bound};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, punctuated::Punctuated, Error, Expr, ItemTrait, Lit, Meta,
    Result, Token,
};

/// 组件接口宏参数
#[derive(Debug, Clone, Default)]
pub struct InterfaceArgs {
    /// 自定义接口名称
    pub name: Option<String>,
}

impl Parse for InterfaceArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = InterfaceArgs::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("name") => match nv.value {
                    Expr::Lit(expr_lit) => match expr_lit.lit {
                        Lit::Str(lit_str) => args.name = Some(lit_str.value()),
                        other => return Err(Error::new_spanned(other, "name 必须是字符串字面量")),
                    },
                    other => return Err(Error::new_spanned(other, "name 必须是字符串字面量")),
                },
                other => return Err(Error::new_spanned(other, "未知参数，只支持 name = \"...\"")),
            }
        }

        Ok(args)
    }
}

/// 实现 #[component_interface] 宏
pub fn component_interface_impl(args: TokenStream, input: TokenStream) -> Result<TokenStream> {
    let args = if args.is_empty() {
        InterfaceArgs::default()
    } else {
        syn::parse2::<InterfaceArgs>(args)?
    };
    let item = syn::parse2::<ItemTrait>(input)?;

    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "组件接口不能是泛型 trait",
        ));
    }

    let trait_name = &item.ident;
    let bases = component_bases(&item.supertraits);
    if bases.is_empty()
        && !(has_marker_bound(&item.supertraits, "Send")
            && has_marker_bound(&item.supertraits, "Sync"))
    {
        return Err(Error::new_spanned(
            trait_name,
            "组件接口必须声明 Send + Sync（或继承另一个组件接口）",
        ));
    }

    let info_fn = args.name.map(|name| {
        quote! {
            fn info() -> ::di_abstractions::TypeInfo {
                let mut info = ::di_abstractions::TypeInfo::of::<dyn #trait_name>();
                info.name = ::std::string::String::from(#name);
                info
            }
        }
    });

    let bases_fn = (!bases.is_empty()).then(|| {
        quote! {
            fn bases() -> ::std::vec::Vec<::di_abstractions::BaseInterface> {
                ::std::vec![
                    #(::di_abstractions::BaseInterface::of::<dyn #trait_name, dyn #bases>(|this| this)),*
                ]
            }
        }
    });

    Ok(quote! {
        #item

        impl ::di_abstractions::ComponentInterface for dyn #trait_name {
            #info_fn
            #bases_fn
        }
    })
}
