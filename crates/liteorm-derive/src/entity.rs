//! Entity derive macro implementation

mod attrs;

use attrs::{FieldAttrs, get_table_name};

use crate::common::syn_types::{field_type_variant, related_inner};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result};

/// A mapped column field
struct ColumnField {
    ident: syn::Ident,
    ty: syn::Type,
    column: String,
    variant: syn::Ident,
    primary_key: bool,
    auto_increment: bool,
    getter: Option<String>,
    /// Getter method named explicitly with `#[orm(getter = "...")]`
    explicit_getter: bool,
}

/// A `Related<T>` field
struct RelationField {
    ident: syn::Ident,
    related: syn::Type,
    foreign_key: String,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let table = get_table_name(&input)?.unwrap_or_else(|| name.to_string().to_lowercase());

    let mut columns = Vec::new();
    let mut relations = Vec::new();

    for field in fields {
        let attrs = FieldAttrs::from_field(field)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let field_name = ident.to_string();

        if let Some(foreign_key) = attrs.one_to_many {
            let Some(related) = related_inner(&field.ty) else {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    format!(
                        "one_to_many field `{field_name}` must be declared as `Related<T>`"
                    ),
                ));
            };
            relations.push(RelationField {
                ident,
                related: related.clone(),
                foreign_key,
            });
            continue;
        }

        let Some(variant) = field_type_variant(&field.ty) else {
            return Err(syn::Error::new_spanned(
                &field.ty,
                format!(
                    "unsupported column type for `{field_name}`; mark the field #[orm(skip)] if it is not a column"
                ),
            ));
        };

        let explicit_getter = attrs.getter.is_some();
        let getter = if attrs.no_getter {
            None
        } else {
            Some(attrs.getter.unwrap_or_else(|| {
                if variant == "Bool" {
                    format!("is_{field_name}")
                } else {
                    format!("get_{field_name}")
                }
            }))
        };

        columns.push(ColumnField {
            column: attrs.column.unwrap_or(field_name),
            ident,
            ty: field.ty.clone(),
            variant: syn::Ident::new(variant, Span::call_site()),
            primary_key: attrs.primary_key,
            auto_increment: attrs.auto_increment,
            getter,
            explicit_getter,
        });
    }

    if columns.iter().filter(|c| c.primary_key).count() > 1 {
        return Err(syn::Error::new_spanned(
            name,
            "only one field can be marked #[orm(primary_key)]",
        ));
    }
    if columns.iter().filter(|c| c.auto_increment).count() > 1 {
        return Err(syn::Error::new_spanned(
            name,
            "only one field can be marked #[orm(auto_increment)]",
        ));
    }

    let name_str = name.to_string();

    let column_defs = columns.iter().map(|c| {
        let column = &c.column;
        let variant = &c.variant;
        let primary_key = c.primary_key;
        let auto_increment = c.auto_increment;
        let getter = match &c.getter {
            Some(g) => quote! { ::core::option::Option::Some(#g) },
            None => quote! { ::core::option::Option::None },
        };
        quote! {
            liteorm::ColumnDef {
                name: #column,
                field_type: liteorm::FieldType::#variant,
                primary_key: #primary_key,
                auto_increment: #auto_increment,
                getter: #getter,
            }
        }
    });

    let relationship_defs = relations.iter().map(|r| {
        let field = r.ident.to_string();
        let foreign_key = &r.foreign_key;
        let related = &r.related;
        quote! {
            liteorm::RelationshipDef {
                field: #field,
                foreign_key: #foreign_key,
                related: <#related as liteorm::Entity>::descriptor,
                related_type: ::std::any::TypeId::of::<#related>,
            }
        }
    });

    let read_arms = columns.iter().filter(|c| c.getter.is_some()).map(|c| {
        let column = &c.column;
        let ident = &c.ident;
        if c.explicit_getter {
            let method = format_ident!("{}", c.getter.as_deref().unwrap_or_default());
            quote! { #column => ::core::option::Option::Some(liteorm::Value::from(self.#method())), }
        } else {
            quote! {
                #column => ::core::option::Option::Some(
                    liteorm::Value::from(::core::clone::Clone::clone(&self.#ident))
                ),
            }
        }
    });

    let write_arms = columns.iter().map(|c| {
        let column = &c.column;
        let ident = &c.ident;
        let ty = &c.ty;
        quote! {
            #column => {
                self.#ident = <#ty as liteorm::FromValue>::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        }
    });

    let relation_methods = if relations.is_empty() {
        quote! {}
    } else {
        let attach = relations.iter().map(|r| {
            let ident = &r.ident;
            let fk = &r.foreign_key;
            quote! { self.#ident.attach(#fk, ::core::clone::Clone::clone(owner_key)); }
        });
        let cascade = relations.iter().map(|r| {
            let ident = &r.ident;
            let fk = &r.foreign_key;
            quote! { self.#ident.cascade(#fk, owner_key)?; }
        });
        quote! {
            fn attach_relations(&mut self, owner_key: &liteorm::Value) {
                #(#attach)*
            }

            fn cascade_relations(&mut self, owner_key: &liteorm::Value) -> liteorm::OrmResult<()> {
                #(#cascade)*
                ::core::result::Result::Ok(())
            }
        }
    };

    Ok(quote! {
        impl liteorm::Entity for #name {
            fn descriptor() -> &'static liteorm::EntityDescriptor {
                static COLUMNS: &[liteorm::ColumnDef] = &[#(#column_defs),*];
                static RELATIONSHIPS: &[liteorm::RelationshipDef] = &[#(#relationship_defs),*];
                static DESCRIPTOR: liteorm::EntityDescriptor = liteorm::EntityDescriptor {
                    name: #name_str,
                    table: #table,
                    columns: COLUMNS,
                    relationships: RELATIONSHIPS,
                };
                &DESCRIPTOR
            }

            fn read_column(&self, column: &str) -> ::core::option::Option<liteorm::Value> {
                match column {
                    #(#read_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn write_column(&mut self, column: &str, value: liteorm::Value) -> liteorm::OrmResult<()> {
                match column {
                    #(#write_arms)*
                    _ => ::core::result::Result::Err(liteorm::OrmError::mapping(
                        ::std::format!("{} has no column '{}'", #name_str, column),
                    )),
                }
            }

            #relation_methods
        }

        // Register this entity for schema checks
        liteorm::inventory::submit! {
            liteorm::EntityRegistration {
                descriptor: <#name as liteorm::Entity>::descriptor,
            }
        }
    })
}
