//! Attribute parsing for Entity derive macro.
//!
//! Handles struct-level and field-level `#[orm(...)]` attributes.

use syn::Result;

/// Parsed field-level attributes.
#[derive(Default)]
pub(super) struct FieldAttrs {
    pub(super) primary_key: bool,
    pub(super) auto_increment: bool,
    pub(super) one_to_many: Option<String>,
    pub(super) column: Option<String>,
    pub(super) getter: Option<String>,
    pub(super) no_getter: bool,
    pub(super) skip: bool,
}

impl syn::parse::Parse for FieldAttrs {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attrs = FieldAttrs::default();

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let key = ident.to_string();

            if input.peek(syn::Token![=]) {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;

                match key.as_str() {
                    "one_to_many" => attrs.one_to_many = Some(value.value()),
                    "column" => attrs.column = Some(value.value()),
                    "getter" => attrs.getter = Some(value.value()),
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &ident,
                            format!("unknown orm attribute `{key}`"),
                        ));
                    }
                }
            } else {
                match key.as_str() {
                    "primary_key" | "id" => attrs.primary_key = true,
                    "auto_increment" => attrs.auto_increment = true,
                    "no_getter" => attrs.no_getter = true,
                    "skip" => attrs.skip = true,
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &ident,
                            format!("unknown orm flag `{key}`"),
                        ));
                    }
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attrs)
    }
}

impl FieldAttrs {
    /// Merge every `#[orm(...)]` on a field.
    pub(super) fn from_field(field: &syn::Field) -> Result<Self> {
        let mut merged = FieldAttrs::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("orm") {
                continue;
            }
            let parsed: FieldAttrs = attr.parse_args()?;
            merged.primary_key |= parsed.primary_key;
            merged.auto_increment |= parsed.auto_increment;
            merged.no_getter |= parsed.no_getter;
            merged.skip |= parsed.skip;
            merged.one_to_many = parsed.one_to_many.or(merged.one_to_many);
            merged.column = parsed.column.or(merged.column);
            merged.getter = parsed.getter.or(merged.getter);
        }

        if merged.getter.is_some() && merged.no_getter {
            return Err(syn::Error::new_spanned(
                field,
                "`getter` and `no_getter` cannot be combined",
            ));
        }
        if merged.one_to_many.is_some()
            && (merged.primary_key || merged.auto_increment || merged.column.is_some())
        {
            return Err(syn::Error::new_spanned(
                field,
                "a one_to_many field is not a column",
            ));
        }
        Ok(merged)
    }
}

/// Extract table name from struct-level `#[orm(table = "...")]` attribute.
pub(super) fn get_table_name(input: &syn::DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested: syn::MetaNameValue = attr.parse_args()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "only `table = \"...\"` is supported on the struct",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return Ok(Some(lit.value()));
        }
        return Err(syn::Error::new_spanned(
            &nested.value,
            "table name must be a string literal",
        ));
    }
    Ok(None)
}
