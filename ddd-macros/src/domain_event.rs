use crate::derive_utils::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[domain_event] 宏实现
/// - 支持结构体与枚举（变体形态不限）
/// - 合并派生：Debug、Clone
/// - 生成 `::ddd_domain::domain_event::DomainEvent` 实现（event_type）
/// - 结构体：`#[domain_event(name = "...")]`，默认为结构体名
/// - 枚举：变体可用 `#[event(name = "...")]` 覆写，默认为 `Enum.Variant`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let required: Vec<syn::Path> = vec![syn::parse_quote!(Debug), syn::parse_quote!(Clone)];

    match &mut input {
        Item::Struct(st) => {
            apply_derives(&mut st.attrs, required);

            let ident = &st.ident;
            let name = cfg
                .name
                .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
            let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

            TokenStream::from(quote! {
                #st

                impl #impl_generics ::ddd_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
                    fn event_type(&self) -> &'static str { #name }
                }
            })
        }
        Item::Enum(en) => {
            if let Some(name) = cfg.name {
                return syn::Error::new(
                    name.span(),
                    "'name' is not allowed on enums; use #[event(name = ...)] on variants",
                )
                .to_compile_error()
                .into();
            }
            apply_derives(&mut en.attrs, required);

            let mut variant_names: HashMap<String, LitStr> = HashMap::new();
            for v in &mut en.variants {
                let mut retained = Vec::with_capacity(v.attrs.len());
                for attr in std::mem::take(&mut v.attrs) {
                    if !attr.path().is_ident("event") {
                        retained.push(attr);
                        continue;
                    }
                    let parsed = match attr.parse_args::<EventAttrConfig>() {
                        Ok(parsed) => parsed,
                        Err(err) => return err.to_compile_error().into(),
                    };
                    if let Some(lit) = parsed.name {
                        if variant_names.insert(v.ident.to_string(), lit).is_some() {
                            return syn::Error::new(
                                attr.span(),
                                "duplicate 'name' specified for this variant",
                            )
                            .to_compile_error()
                            .into();
                        }
                    }
                }
                v.attrs = retained;
            }

            let ident = &en.ident;
            let arms = en.variants.iter().map(|v| {
                let v_ident = &v.ident;
                let lit = variant_names.remove(&v_ident.to_string()).unwrap_or_else(|| {
                    LitStr::new(&format!("{ident}.{v_ident}"), v_ident.span())
                });
                quote! { Self::#v_ident { .. } => #lit }
            });
            let arms: Vec<_> = arms.collect();
            let (impl_generics, ty_generics, where_clause) = en.generics.split_for_impl();

            TokenStream::from(quote! {
                #en

                impl #impl_generics ::ddd_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
                    fn event_type(&self) -> &'static str {
                        match self { #( #arms, )* }
                    }
                }
            })
        }
        other => syn::Error::new(other.span(), "#[domain_event] only supports struct or enum")
            .to_compile_error()
            .into(),
    }
}

// -------- parsing --------

#[derive(Default)]
struct EventAttrConfig {
    name: Option<LitStr>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = Self::default();
        let pairs = Punctuated::<EventAttrKv, Token![,]>::parse_terminated(input)?;
        for kv in pairs {
            if kv.key != "name" {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "unknown key in attribute; expected 'name'",
                ));
            }
            if cfg.name.replace(kv.value).is_some() {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "duplicate key 'name' in attribute",
                ));
            }
        }
        Ok(cfg)
    }
}

struct EventAttrKv {
    key: syn::Ident,
    value: LitStr,
}

impl Parse for EventAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: LitStr = input.parse()?;
        Ok(Self { key, value })
    }
}
