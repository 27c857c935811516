#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasMany,
}

#[derive(Debug)]
pub struct RelationArgs {
    pub kind: RelationKind,
    pub table: syn::LitStr,
    pub foreign_key: syn::LitStr,
    pub key: Option<syn::LitStr>,
}

impl RelationArgs {
    fn parse_with(kind: RelationKind, input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        // belongs_to(table = "users", foreign_key = "author_id", key = "id")
        let content;
        let paren: syn::token::Paren = syn::parenthesized!(content in input);
        let mut table = None;
        let mut foreign_key = None;
        let mut key = None;

        let punc =
            syn::punctuated::Punctuated::<syn::MetaNameValue, syn::Token![,]>::parse_terminated(
                &content,
            )?;
        for nv in punc {
            let value = match &nv.lit {
                syn::Lit::Str(s) => s.clone(),
                other => return Err(syn::Error::new_spanned(other, "expected a string")),
            };
            if nv.path.is_ident("table") {
                table = Some(value);
            } else if nv.path.is_ident("foreign_key") {
                foreign_key = Some(value);
            } else if nv.path.is_ident("key") {
                key = Some(value);
            } else {
                return Err(syn::Error::new_spanned(
                    nv.path,
                    "unsupported relation attribute",
                ));
            }
        }

        let table = table.ok_or_else(|| syn::Error::new(paren.span, "relation needs a table"))?;
        let foreign_key = foreign_key
            .ok_or_else(|| syn::Error::new(paren.span, "relation needs a foreign_key"))?;

        Ok(Self {
            kind,
            table,
            foreign_key,
            key,
        })
    }
}

#[derive(Debug)]
pub enum FilterItem {
    Table(syn::LitStr),
    Rename(syn::LitStr),
    Relation(RelationArgs),
}

impl syn::parse::Parse for FilterItem {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let attr: syn::Ident = input.parse()?;
        match attr.to_string().as_str() {
            "table" => {
                // table = "posts"
                let _: syn::Token![=] = input.parse()?;
                Ok(FilterItem::Table(input.parse()?))
            }
            "rename" => {
                let _: syn::Token![=] = input.parse()?;
                Ok(FilterItem::Rename(input.parse()?))
            }
            "belongs_to" => Ok(FilterItem::Relation(RelationArgs::parse_with(
                RelationKind::BelongsTo,
                input,
            )?)),
            "has_many" | "has_one" => Ok(FilterItem::Relation(RelationArgs::parse_with(
                RelationKind::HasMany,
                input,
            )?)),
            _ => Err(syn::Error::new_spanned(attr, "unsupported filter attribute")),
        }
    }
}

/// The contents of one `#[filter(...)]` attribute.
#[derive(Debug, Default)]
pub struct FilterMeta {
    pub table: Option<syn::LitStr>,
    pub name: Option<syn::LitStr>,
    pub relation: Option<RelationArgs>,
}

impl syn::parse::Parse for FilterMeta {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let mut meta = FilterMeta::default();
        let punc =
            syn::punctuated::Punctuated::<FilterItem, syn::Token![,]>::parse_terminated(input)?;

        for item in punc {
            match item {
                FilterItem::Table(table) => meta.table = Some(table),
                FilterItem::Rename(name) => meta.name = Some(name),
                FilterItem::Relation(relation) => meta.relation = Some(relation),
            }
        }
        Ok(meta)
    }
}
