use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

/// Marks a test that runs either synchronously or on a tokio runtime.
///
/// - `#[rxcombine_macro::test]` on a sync fn expands to `#[test]`.
/// - on an `async fn` it expands to `#[tokio::test]` (current-thread).
/// - `#[rxcombine_macro::test(multi)]` selects the multi-thread runtime for
///   tests that deliver across a scheduler boundary.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let tokio_args = if raw_args.is_empty() {
    proc_macro2::TokenStream::new()
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxcombine_macro::test runtime args are only supported for async tests. Use \
           #[rxcombine_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      (ident.to_string(), ident.span())
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      (lit.value(), lit.span())
    } else {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxcombine_macro::test only accepts: #[rxcombine_macro::test], \
           #[rxcombine_macro::test(current)], #[rxcombine_macro::test(multi)]",
        )
        .to_compile_error(),
      );
    };

    match flavor.0.as_str() {
      "current" => quote!(flavor = "current_thread"),
      "multi" => quote!(flavor = "multi_thread", worker_threads = 2),
      _ => {
        return TokenStream::from(
          syn::Error::new(flavor.1, "rxcombine_macro::test only accepts `current` or `multi`")
            .to_compile_error(),
        );
      }
    }
  };

  let native_attr = if is_async { quote!(tokio::test(#tokio_args)) } else { quote!(test) };

  let expanded = quote! {
      #[#native_attr]
      #input
  };

  TokenStream::from(expanded)
}
