use quote::ToTokens;
use syn::{Attribute, Path, Token, punctuated::Punctuated};

// 拆分属性：返回非 derive 属性与已声明的 derive 路径
fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<Path>) {
    let mut retained = Vec::new();
    let mut declared = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("derive") {
            retained.push(attr.clone());
            continue;
        }
        if let Ok(list) = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated) {
            declared.extend(list);
        }
    }
    (retained, declared)
}

// 归一化 derive 名称，使 `Serialize` 与 `serde::Serialize` 视为同一项
fn derive_key(path: &Path) -> String {
    match path.segments.last() {
        Some(last) => {
            let name = last.ident.to_string();
            if name == "Serialize" || name == "Deserialize" {
                format!("serde::{name}")
            } else {
                name
            }
        }
        None => path.to_token_stream().to_string(),
    }
}

/// 将宏要求的派生与用户已声明的派生合并为单个 `#[derive(..)]`，去重后置于属性最前
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<Path>) {
    let (retained, declared) = split_derives(attrs);

    let mut seen = std::collections::HashSet::new();
    let merged: Vec<Path> = required
        .into_iter()
        .chain(declared)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();

    let derive: Attribute = syn::parse_quote!(#[derive(#(#merged),*)]);
    *attrs = std::iter::once(derive).chain(retained).collect();
}
