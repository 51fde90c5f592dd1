/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! DCOP Macro Library
//!
//! Procedural macros for the DCOP runtime. The [`dcop_message`] attribute binds
//! a payload type to the wire-level message type tag it travels under, so
//! routing tables are resolved at compile time instead of by name lookup at
//! run time.
//!
//! ```ignore
//! #[dcop_message("UTIL")]
//! pub struct UtilMessage {
//!     pub utility: i64,
//! }
//!
//! let msg = Message::typed(UtilMessage { utility: 3 });
//! assert_eq!(msg.msg_type().as_str(), "UTIL");
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitStr};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name)
                    || meta
                        .path
                        .segments
                        .last()
                        .is_some_and(|segment| segment.ident == trait_name)
                {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Declares a DCOP message payload and its wire-level type tag.
///
/// The tag defaults to the type's name when the attribute carries no argument:
///
/// ```ignore
/// #[dcop_message]            // travels as "Ping"
/// pub struct Ping;
///
/// #[dcop_message("VALUE")]   // travels as "VALUE"
/// pub struct ValueMessage {
///     pub variable: String,
///     pub value: i32,
/// }
/// ```
///
/// This expands to:
/// - `#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]` for any
///   of these not already derived
/// - an implementation of `dcop_runtime::prelude::TypedPayload` carrying the tag
/// - a compile-time assertion that the type is `Send + Sync + 'static`
///
/// The expansion requires `serde` to be a dependency of the calling crate.
#[proc_macro_attribute]
pub fn dcop_message(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let tag = if attr.is_empty() {
        name.to_string()
    } else {
        parse_macro_input!(attr as LitStr).value()
    };

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if !has_derive(&input, "Serialize") {
            traits.push(quote!(::serde::Serialize));
        }
        if !has_derive(&input, "Deserialize") {
            traits.push(quote!(::serde::Deserialize));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    let assert_ident = quote::format_ident!("_AssertDcopMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        impl #impl_generics ::dcop_runtime::prelude::TypedPayload for #name #ty_generics #where_clause {
            const MESSAGE_TYPE: &'static str = #tag;
        }

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
