use crate::derive_utils::apply_derives;
use crate::field_utils::{ensure_leading_fields, to_snake_case};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[entity] 宏实现
/// - 若缺失则追加字段 `id`、`audit`，启用事件时追加 `events`，并置于字段最前
/// - 合并派生：Debug（可关闭）、Default、Clone、Serialize、Deserialize
/// - 实现 `::ddd_domain::entity::Entity`；启用事件时额外生成 `events()`/`events_mut()`
/// - 参数：`#[entity(id = IdType, table = "name", events = true|false, debug = true|false)]`
///   - `id` 默认 `String`
///   - `table` 默认为结构体名的 snake_case 形式
///   - `events` 默认 `true`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type = cfg.id_ty.unwrap_or_else(|| syn::parse_quote! { String });
    let with_events = cfg.events.unwrap_or(true);
    let table = cfg
        .table
        .unwrap_or_else(|| LitStr::new(&to_snake_case(&st.ident.to_string()), st.ident.span()));

    let mut required: Vec<syn::Field> = vec![
        syn::parse_quote! { id: #id_type },
        syn::parse_quote! {
            #[serde(flatten)]
            audit: ::ddd_domain::entity::Audit
        },
    ];
    if with_events {
        required.push(syn::parse_quote! {
            #[serde(skip)]
            events: ::ddd_domain::domain_event::DomainEvents
        });
    }
    ensure_leading_fields(fields_named, required);

    let mut derives: Vec<syn::Path> = vec![
        syn::parse_quote!(Default),
        syn::parse_quote!(Clone),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if cfg.derive_debug.unwrap_or(true) {
        derives.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, derives);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let events_impl = if with_events {
        quote! {
            fn domain_events_mut(&mut self) -> ::std::option::Option<&mut ::ddd_domain::domain_event::DomainEvents> {
                ::std::option::Option::Some(&mut self.events)
            }
        }
    } else {
        quote! {}
    };

    let events_accessors = if with_events {
        quote! {
            impl #impl_generics #ident #ty_generics #where_clause {
                /// 尚未发布的领域事件
                pub fn events(&self) -> &::ddd_domain::domain_event::DomainEvents {
                    &self.events
                }

                pub fn events_mut(&mut self) -> &mut ::ddd_domain::domain_event::DomainEvents {
                    &mut self.events
                }
            }
        }
    } else {
        quote! {}
    };

    let expanded = quote! {
        #st

        impl #impl_generics ::ddd_domain::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            const TABLE: &'static str = #table;

            fn id(&self) -> &Self::Id { &self.id }

            fn set_id(&mut self, id: Self::Id) { self.id = id; }

            fn audit(&self) -> &::ddd_domain::entity::Audit { &self.audit }

            fn audit_mut(&mut self) -> &mut ::ddd_domain::entity::Audit { &mut self.audit }

            #events_impl
        }

        #events_accessors
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

#[derive(Default)]
struct EntityAttrConfig {
    id_ty: Option<Type>,
    table: Option<LitStr>,
    events: Option<bool>,
    derive_debug: Option<bool>,
}

impl Parse for EntityAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = Self::default();
        if input.is_empty() {
            return Ok(cfg);
        }

        let elems = Punctuated::<EntityAttrElem, Token![,]>::parse_terminated(input)?;
        for elem in elems {
            let duplicated = match elem {
                EntityAttrElem::Id(key, ty) => cfg.id_ty.replace(*ty).map(|_| key),
                EntityAttrElem::Table(key, lit) => cfg.table.replace(lit).map(|_| key),
                EntityAttrElem::Events(key, b) => cfg.events.replace(b).map(|_| key),
                EntityAttrElem::Debug(key, b) => cfg.derive_debug.replace(b).map(|_| key),
            };
            if let Some(key) = duplicated {
                return Err(syn::Error::new(
                    key.span(),
                    format!("duplicate key '{key}' in attribute"),
                ));
            }
        }

        Ok(cfg)
    }
}

enum EntityAttrElem {
    Id(syn::Ident, Box<Type>),
    Table(syn::Ident, LitStr),
    Events(syn::Ident, bool),
    Debug(syn::Ident, bool),
}

impl Parse for EntityAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        match key.to_string().as_str() {
            "id" => {
                let ty: Type = input.parse()?;
                Ok(EntityAttrElem::Id(key, Box::new(ty)))
            }
            "table" => {
                let lit: LitStr = input.parse()?;
                Ok(EntityAttrElem::Table(key, lit))
            }
            "events" => {
                let b = parse_bool(input, "events")?;
                Ok(EntityAttrElem::Events(key, b))
            }
            "debug" => {
                let b = parse_bool(input, "debug")?;
                Ok(EntityAttrElem::Debug(key, b))
            }
            _ => Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'id' | 'table' | 'events' | 'debug'",
            )),
        }
    }
}

fn parse_bool(input: ParseStream, key: &str) -> Result<bool> {
    let expr: syn::Expr = input.parse()?;
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Bool(b),
            ..
        }) => Ok(b.value()),
        other => Err(syn::Error::new(
            other.span(),
            format!("expected boolean literal for '{key}'"),
        )),
    }
}
