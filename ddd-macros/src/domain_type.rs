use crate::derive_utils::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Fields, Item, LitStr, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[domain_type] 宏实现
/// - 仅支持无字段枚举
/// - 合并派生：Debug、Clone、Copy、PartialEq、Eq、Hash
/// - 生成 `::ddd_domain::domain_type::DomainType` 实现（name / all）
/// - 变体可用 `#[value(name = "...")]` 覆写名称，默认为变体名
/// - 以名称实现 Display、FromStr 与 serde 序列化
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return syn::Error::new(attr.span(), "#[domain_type] takes no arguments")
            .to_compile_error()
            .into();
    }
    let mut input = parse_macro_input!(item as Item);

    let en = match &mut input {
        Item::Enum(en) => en,
        other => {
            return syn::Error::new(other.span(), "#[domain_type] only supports enums")
                .to_compile_error()
                .into();
        }
    };
    if en.variants.is_empty() {
        return syn::Error::new(en.ident.span(), "#[domain_type] requires at least one variant")
            .to_compile_error()
            .into();
    }
    if !en.generics.params.is_empty() {
        return syn::Error::new(en.generics.span(), "#[domain_type] does not support generics")
            .to_compile_error()
            .into();
    }

    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(Copy),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(Eq),
        syn::parse_quote!(Hash),
    ];
    apply_derives(&mut en.attrs, required);

    let mut seen: HashSet<String> = HashSet::new();
    let mut variants = Vec::with_capacity(en.variants.len());
    for v in &mut en.variants {
        if !matches!(v.fields, Fields::Unit) {
            return syn::Error::new(v.fields.span(), "#[domain_type] variants must not carry fields")
                .to_compile_error()
                .into();
        }

        let mut name: Option<LitStr> = None;
        let mut retained = Vec::with_capacity(v.attrs.len());
        for attr in std::mem::take(&mut v.attrs) {
            if !attr.path().is_ident("value") {
                retained.push(attr);
                continue;
            }
            let parsed = match attr.parse_args::<ValueAttrConfig>() {
                Ok(parsed) => parsed,
                Err(err) => return err.to_compile_error().into(),
            };
            if name.replace(parsed.name).is_some() {
                return syn::Error::new(attr.span(), "duplicate 'name' specified for this variant")
                    .to_compile_error()
                    .into();
            }
        }
        v.attrs = retained;

        let name = name.unwrap_or_else(|| LitStr::new(&v.ident.to_string(), v.ident.span()));
        if !seen.insert(name.value()) {
            return syn::Error::new(name.span(), format!("duplicate domain type name '{}'", name.value()))
                .to_compile_error()
                .into();
        }
        variants.push((v.ident.clone(), name));
    }

    let ident = &en.ident;
    let arms = variants
        .iter()
        .map(|(v_ident, name)| quote! { Self::#v_ident => #name });
    let values = variants.iter().map(|(v_ident, _)| quote! { Self::#v_ident });
    let unknown = format!("unknown {ident} '{{}}'");

    TokenStream::from(quote! {
        #en

        impl ::ddd_domain::domain_type::DomainType for #ident {
            fn name(&self) -> &'static str {
                match self { #( #arms, )* }
            }

            fn all() -> &'static [Self] {
                &[ #( #values, )* ]
            }
        }

        impl ::std::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(::ddd_domain::domain_type::DomainType::name(self))
            }
        }

        impl ::std::str::FromStr for #ident {
            type Err = ::ddd_domain::error::DomainError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                <Self as ::ddd_domain::domain_type::DomainType>::parse_name(s)
            }
        }

        impl serde::Serialize for #ident {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(::ddd_domain::domain_type::DomainType::name(self))
            }
        }

        impl<'de> serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let name = <::std::string::String as serde::Deserialize>::deserialize(deserializer)?;
                <Self as ::ddd_domain::domain_type::DomainType>::from_name(&name, false)
                    .ok_or_else(|| <D::Error as serde::de::Error>::custom(format!(#unknown, name)))
            }
        }
    })
}

// -------- parsing --------

struct ValueAttrConfig {
    name: LitStr,
}

impl Parse for ValueAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut name = None;
        let pairs = Punctuated::<ValueAttrKv, Token![,]>::parse_terminated(input)?;
        for kv in pairs {
            if kv.key != "name" {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "unknown key in attribute; expected 'name'",
                ));
            }
            if name.replace(kv.value).is_some() {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "duplicate key 'name' in attribute",
                ));
            }
        }
        name.map(|name| Self { name })
            .ok_or_else(|| input.error("expected `name = \"...\"`"))
    }
}

struct ValueAttrKv {
    key: syn::Ident,
    value: LitStr,
}

impl Parse for ValueAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: LitStr = input.parse()?;
        Ok(Self { key, value })
    }
}
