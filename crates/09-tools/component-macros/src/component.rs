//! 组件元数据宏实现

use crate::utils::{expect_string, option_name};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, punctuated::Punctuated, DeriveInput, Error,
    Generics, Ident, ItemStruct, Meta, Result, Token,
};

/// 组件配置参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentArgs {
    /// 生命周期提示
    pub lifetime: Option<ComponentLifetime>,
    /// 延迟加载提示
    pub lazy: Option<bool>,
    /// 是否排除
    pub excluded: bool,
    /// 自定义服务标识符
    pub name: Option<String>,
    /// 标签
    pub tags: Vec<String>,
    /// 实现的接口
    pub interfaces: Vec<String>,
    /// 标记属性
    pub attributes: Vec<String>,
    /// 描述
    pub description: Option<String>,
}

/// 组件生命周期提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentLifetime {
    Singleton,
    Transient,
}

impl ComponentArgs {
    fn set_lifetime(&mut self, lifetime: ComponentLifetime, span: &syn::Path) -> Result<()> {
        match self.lifetime {
            Some(existing) if existing != lifetime => Err(Error::new_spanned(
                span,
                "`singleton` and `transient` are mutually exclusive",
            )),
            _ => {
                self.lifetime = Some(lifetime);
                Ok(())
            }
        }
    }

    fn set_lazy(&mut self, lazy: bool, span: &syn::Path) -> Result<()> {
        match self.lazy {
            Some(existing) if existing != lazy => Err(Error::new_spanned(
                span,
                "`lazy` and `eager` are mutually exclusive",
            )),
            _ => {
                self.lazy = Some(lazy);
                Ok(())
            }
        }
    }
}

impl Parse for ComponentArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = ComponentArgs::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::Path(path) => match option_name(&path).as_str() {
                    "singleton" => args.set_lifetime(ComponentLifetime::Singleton, &path)?,
                    "transient" => args.set_lifetime(ComponentLifetime::Transient, &path)?,
                    "lazy" => args.set_lazy(true, &path)?,
                    "eager" => args.set_lazy(false, &path)?,
                    "exclude" => args.excluded = true,
                    other => {
                        return Err(Error::new_spanned(
                            &path,
                            format!("unknown component option `{other}`"),
                        ))
                    }
                },
                Meta::NameValue(nv) => {
                    let value = expect_string(&nv.value)?;
                    match option_name(&nv.path).as_str() {
                        "name" => args.name = Some(value),
                        "tag" => args.tags.push(value),
                        "implements" => args.interfaces.push(value),
                        "attribute" => args.attributes.push(value),
                        "description" => args.description = Some(value),
                        other => {
                            return Err(Error::new_spanned(
                                &nv.path,
                                format!("unknown component option `{other}`"),
                            ))
                        }
                    }
                }
                Meta::List(list) => {
                    return Err(Error::new_spanned(
                        &list.path,
                        "component options do not take a list",
                    ))
                }
            }
        }

        Ok(args)
    }
}

/// 实现 #[component] 宏
pub fn component_impl(args: TokenStream, input: TokenStream) -> TokenStream {
    let component_args = if args.is_empty() {
        ComponentArgs::default()
    } else {
        match syn::parse::<ComponentArgs>(args) {
            Ok(args) => args,
            Err(e) => return e.to_compile_error().into(),
        }
    };

    let input_struct = parse_macro_input!(input as ItemStruct);
    let discoverable_impl =
        generate_discoverable_impl(&input_struct.ident, &input_struct.generics, &component_args);

    let expanded = quote! {
        #input_struct

        #discoverable_impl
    };

    TokenStream::from(expanded)
}

/// 实现 #[derive(Discoverable)] 宏
pub fn derive_discoverable_impl(input: DeriveInput) -> TokenStream {
    let mut component_args = ComponentArgs::default();

    for attr in &input.attrs {
        if attr.path().is_ident("component") {
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }
            match attr.parse_args::<ComponentArgs>() {
                Ok(args) => component_args = args,
                Err(e) => return e.to_compile_error().into(),
            }
        }
    }

    generate_discoverable_impl(&input.ident, &input.generics, &component_args).into()
}

/// 生成 `Discoverable` 实现
fn generate_discoverable_impl(
    struct_name: &Ident,
    generics: &Generics,
    args: &ComponentArgs,
) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let struct_name_string = struct_name.to_string();
    let id = match &args.name {
        Some(name) => quote! { #name },
        None => quote! { concat!(module_path!(), "::", #struct_name_string) },
    };

    let lifetime = args.lifetime.map(|lifetime| match lifetime {
        ComponentLifetime::Singleton => quote! { .singleton() },
        ComponentLifetime::Transient => quote! { .transient() },
    });
    let lazy = args.lazy.map(|lazy| quote! { .with_lazy(#lazy) });
    let tags = &args.tags;
    let interfaces = &args.interfaces;
    let attributes = &args.attributes;
    let excluded = args.excluded.then(|| quote! { .excluded() });
    let description = args
        .description
        .as_ref()
        .map(|description| quote! { .with_description(#description) });

    quote! {
        impl #impl_generics ::infrastructure_common::Discoverable for #struct_name #ty_generics #where_clause {
            fn component_metadata() -> ::infrastructure_common::ComponentMetadata {
                ::infrastructure_common::ComponentMetadata::new(#id)
                    #lifetime
                    #lazy
                    #(.with_tag(#tags))*
                    #(.with_interface(#interfaces))*
                    #(.with_attribute(#attributes))*
                    #excluded
                    #description
            }
        }
    }
}
