use proc_macro::{self, TokenStream};

use proc_macro2 as pm2;

mod attributes;
mod model;

/// Derive the `Model` trait, declaring the table a type is stored in
/// and the relations filters may traverse.
///
/// This is only implemented for structs with named fields. The
/// annotations use the `filter` attribute, which has the following
/// options:
///
/// - `#[filter(table = "posts")]` on the type sets the table name. The
///   default is the snake cased type name with an `s` appended.
///
/// - `#[filter(belongs_to(table = "users", foreign_key = "author_id"))]`
///   on a field declares a relation named after the field, joined on
///   the owner's `author_id` column and the related table's `id`. Add
///   `key = "uuid"` to join on a different related column.
///
/// - `#[filter(has_many(table = "comments", foreign_key = "post_id"))]`
///   on a field declares a relation whose table refers back to the
///   owner's `id` through its `post_id` column. Add `key = "..."` to
///   join on a different owner column. `has_one` is accepted as a
///   synonym.
///
/// - `#[filter(rename = "writer")]` Expose the relation as `writer`
///   instead of using the field's name.
///
/// Fields without a relation are ignored.
#[proc_macro_derive(Model, attributes(filter))]
pub fn model(input: TokenStream) -> TokenStream {
    let derive: syn::DeriveInput = syn::parse_macro_input!(input);

    let res: pm2::TokenStream = model::derive_model(derive);

    res.into()
}
