use proc_macro2 as pm2;

use crate::attributes::{FilterMeta, RelationKind};

fn parse_attrs(attrs: &[syn::Attribute]) -> syn::Result<FilterMeta> {
    let mut meta = FilterMeta::default();
    for attr in attrs.iter() {
        if attr.path.is_ident("filter") {
            let parsed = attr.parse_args::<FilterMeta>()?;
            if parsed.table.is_some() {
                meta.table = parsed.table;
            }
            if parsed.name.is_some() {
                meta.name = parsed.name;
            }
            if parsed.relation.is_some() {
                meta.relation = parsed.relation;
            }
        }
    }
    Ok(meta)
}

pub fn derive_model(input: syn::DeriveInput) -> pm2::TokenStream {
    let syn::DeriveInput {
        ident,
        data,
        generics,
        attrs,
        ..
    } = input;

    let (generics, ty_generics, wc) = generics.split_for_impl();

    let type_meta = match parse_attrs(&attrs) {
        Ok(meta) => meta,
        Err(e) => return e.into_compile_error(),
    };
    if let Some(relation) = type_meta.relation {
        return syn::Error::new(
            relation.table.span(),
            "relations are declared on fields, not on the type",
        )
        .to_compile_error();
    }

    let table = match type_meta.table {
        Some(table) => quote::quote! { #table },
        None => {
            let name = syn::LitStr::new(&ident.to_string(), ident.span());
            quote::quote! { &::filter_operator::case::table_name(#name) }
        }
    };

    let mut body = pm2::TokenStream::new();

    if let syn::Data::Struct(s) = data {
        if let syn::Fields::Named(syn::FieldsNamed { named, .. }) = s.fields {
            for field in named.iter() {
                let fieldid = field.ident.as_ref().unwrap();
                let meta = match parse_attrs(&field.attrs) {
                    Ok(meta) => meta,
                    Err(e) => return e.into_compile_error(),
                };
                if let Some(table) = meta.table {
                    return syn::Error::new(table.span(), "table is declared on the type")
                        .to_compile_error();
                }
                let relation = match meta.relation {
                    Some(relation) => relation,
                    None => continue,
                };

                let name = meta
                    .name
                    .unwrap_or_else(|| syn::LitStr::new(&fieldid.to_string(), fieldid.span()));
                let related_table = &relation.table;
                let foreign_key = &relation.foreign_key;
                let constructor = match relation.kind {
                    RelationKind::BelongsTo => quote::quote! { belongs_to },
                    RelationKind::HasMany => quote::quote! { has_many },
                };
                let key = relation.key.map(|key| quote::quote! { .with_key(#key) });

                body.extend(quote::quote! {
                    .with_relation(
                        ::filter_operator::Relation::#constructor(#name, #related_table, #foreign_key)
                            #key
                    )
                });
            }
        } else {
            return syn::Error::new(
                ident.span(),
                "Model can only be derived for structs with named fields.",
            )
            .to_compile_error();
        }
    } else {
        return syn::Error::new(
            ident.span(),
            "Model can only be derived for structs with named fields.",
        )
        .to_compile_error();
    }

    quote::quote! {
        #[automatically_derived]
        impl #generics ::filter_operator::Model for #ident #ty_generics #wc {
            fn entity() -> ::filter_operator::Entity {
                ::filter_operator::Entity::new(#table)
                    #body
            }
        }
    }
}
