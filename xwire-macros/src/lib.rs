//! Procedural macros for xwire.
//!
//! `#[injectable]` turns a free function into a provider entry of the
//! static registration table:
//!
//! ```rust,ignore
//! #[injectable]
//! fn dbcnx(db_string: &String) -> Result<Connection, ConnectError> {
//!     Connection::open(db_string)
//! }
//!
//! #[injectable(name = "users", environment = "fake_users")]
//! fn fake_users() -> Vec<String> {
//!     vec!["u1".into(), "u2".into()]
//! }
//! ```
//!
//! Each `name: &T` parameter declares a dependency on the logical name
//! `name`. A `_: T` parameter is an ignored slot filled with
//! `T::default()`. The function may return `T` or `Result<T, E>` with
//! `E: Into<BoxError>`.

use darling::FromMeta;
use darling::ast::NestedMeta;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{FnArg, GenericArgument, ItemFn, Pat, PathArguments, ReturnType, Type, parse_macro_input};

#[derive(Debug, Default, FromMeta)]
struct InjectableArgs {
    /// Logical name; defaults to the function name.
    #[darling(default)]
    name: Option<String>,
    /// Environment tag; defaults to `main`.
    #[darling(default)]
    environment: Option<String>,
}

/// Registers a function as a provider in the static registration table.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let meta = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(meta) => meta,
        Err(err) => return darling::Error::from(err).write_errors().into(),
    };
    let args = match InjectableArgs::from_list(&meta) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };
    let function = parse_macro_input!(item as ItemFn);

    expand(args, function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(args: InjectableArgs, function: ItemFn) -> syn::Result<TokenStream2> {
    let sig = &function.sig;
    if let Some(asyncness) = sig.asyncness {
        return Err(syn::Error::new(asyncness.span(), "providers must be synchronous"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "providers cannot be generic",
        ));
    }

    let fn_ident = &sig.ident;
    let base = fn_ident.unraw();
    let name = args.name.unwrap_or_else(|| base.to_string());
    let environment = match args.environment {
        Some(environment) => quote!(#environment),
        None => quote!(::xwire::MAIN_ENVIRONMENT),
    };

    let mut bindings = Vec::new();
    let mut call_args = Vec::new();
    let mut dependency_names = Vec::new();

    for (index, input) in sig.inputs.iter().enumerate() {
        let typed = match input {
            FnArg::Typed(typed) => typed,
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new(
                    receiver.span(),
                    "providers must be free functions",
                ));
            }
        };

        match &*typed.pat {
            Pat::Wild(_) => call_args.push(quote!(::core::default::Default::default())),
            Pat::Ident(pat) => {
                let Type::Reference(reference) = &*typed.ty else {
                    return Err(syn::Error::new(
                        typed.ty.span(),
                        "dependencies are borrowed: declare this parameter as `&T`",
                    ));
                };
                let inner = &reference.elem;
                let dependency = pat.ident.unraw().to_string();
                let local = format_ident!("__xwire_arg_{}", index);

                bindings.push(quote! {
                    let #local = __xwire_deps.get::<#inner>(#dependency)?;
                });
                call_args.push(quote!(&*#local));
                dependency_names.push(dependency);
            }
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "use a plain identifier (the dependency name) or `_`",
                ));
            }
        }
    }

    let (output, call) = match &sig.output {
        ReturnType::Default => (quote!(()), quote!(#fn_ident(#(#call_args),*))),
        ReturnType::Type(_, ty) => match result_ok_type(ty) {
            Some(ok) => (
                quote!(#ok),
                quote! {
                    #fn_ident(#(#call_args),*)
                        .map_err(::core::convert::Into::<::xwire::BoxError>::into)?
                },
            ),
            None => (quote!(#ty), quote!(#fn_ident(#(#call_args),*))),
        },
    };

    let factory = format_ident!("__xwire_factory_{}", base);
    let output_type = format_ident!("__xwire_output_{}", base);

    Ok(quote! {
        #function

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #factory(
            __xwire_deps: &::xwire::Dependencies,
        ) -> ::core::result::Result<::xwire::Value, ::xwire::BoxError> {
            #(#bindings)*
            let __xwire_value = #call;
            ::core::result::Result::Ok(::std::sync::Arc::new(__xwire_value) as ::xwire::Value)
        }

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #output_type() -> &'static str {
            ::core::any::type_name::<#output>()
        }

        ::xwire::__private::inventory::submit! {
            ::xwire::Injectable {
                name: #name,
                environment: #environment,
                dependencies: &[#(#dependency_names),*],
                output_type: #output_type,
                factory: #factory,
            }
        }
    })
}

/// `T` of a `Result<T, ..>` return type, matched on the last path segment.
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    arguments.args.iter().find_map(|argument| match argument {
        GenericArgument::Type(ok) => Some(ok),
        _ => None,
    })
}
