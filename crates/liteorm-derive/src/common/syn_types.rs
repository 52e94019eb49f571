//! Type helper utilities for syn type analysis.

/// Extract the single generic argument of a type whose last path segment is `name`.
fn generic_inner<'a>(ty: &'a syn::Type, name: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != name {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    generic_inner(ty, "Option")
}

/// Extract the inner type T from Related<T>.
pub fn related_inner(ty: &syn::Type) -> Option<&syn::Type> {
    generic_inner(ty, "Related")
}

fn last_ident(ty: &syn::Type) -> Option<String> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    type_path.path.segments.last().map(|s| s.ident.to_string())
}

/// Map a field type to the name of its `liteorm::FieldType` variant.
///
/// `Option<T>` maps like `T`. Returns None for unsupported types.
pub fn field_type_variant(ty: &syn::Type) -> Option<&'static str> {
    let ty = option_inner(ty).unwrap_or(ty);
    if let Some(inner) = generic_inner(ty, "Vec") {
        return (last_ident(inner)? == "u8").then_some("Blob");
    }
    let variant = match last_ident(ty)?.as_str() {
        "String" => "Text",
        "i32" => "Int",
        "i64" => "Long",
        "f32" => "Float",
        "f64" => "Double",
        "bool" => "Bool",
        "NaiveDateTime" => "Date",
        _ => return None,
    };
    Some(variant)
}
