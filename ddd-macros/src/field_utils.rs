use syn::{Field, FieldsNamed, Token, punctuated::Punctuated};

fn field_name_is(field: &Field, name: &str) -> bool {
    field.ident.as_ref().map(|i| i == name).unwrap_or(false)
}

/// 确保具名字段结构体包含给定字段，并按给定顺序置于最前
///
/// 用户已声明的同名字段保留其原始定义（类型与属性），仅调整位置；
/// 其余字段保持原有相对顺序。
pub(crate) fn ensure_leading_fields(fields_named: &mut FieldsNamed, required: Vec<Field>) {
    let old_named = std::mem::take(&mut fields_named.named);
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    let mut names = Vec::with_capacity(required.len());
    for template in required {
        let Some(name) = template.ident.as_ref().map(|i| i.to_string()) else {
            continue;
        };
        match old_named.iter().find(|f| field_name_is(f, &name)) {
            Some(existing) => new_named.push(existing.clone()),
            None => new_named.push(template),
        }
        names.push(name);
    }

    for f in old_named {
        if !names.iter().any(|n| field_name_is(&f, n)) {
            new_named.push(f);
        }
    }

    fields_named.named = new_named;
}

/// `GuestMessage` -> `guest_message`
pub(crate) fn to_snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    let mut prev_lower = false;
    for ch in ident.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_table_names() {
        assert_eq!(to_snake_case("GuestMessage"), "guest_message");
        assert_eq!(to_snake_case("GuestMessagesCounter"), "guest_messages_counter");
        assert_eq!(to_snake_case("Order2Line"), "order2_line");
        assert_eq!(to_snake_case("account"), "account");
    }

    #[test]
    fn leading_fields_keep_user_definitions() {
        let mut fields: FieldsNamed = syn::parse_quote!({
            message: String,
            #[serde(rename = "key")]
            id: u64,
        });
        ensure_leading_fields(
            &mut fields,
            vec![
                syn::parse_quote!(id: String),
                syn::parse_quote!(audit: Audit),
            ],
        );

        let names: Vec<String> = fields
            .named
            .iter()
            .map(|f| f.ident.as_ref().map(|i| i.to_string()).unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["id", "audit", "message"]);
        assert_eq!(fields.named[0].attrs.len(), 1);
    }
}
