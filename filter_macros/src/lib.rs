extern crate proc_macro;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields};

/// Generates the parameter surface of the filter bank from the fields of its configuration.
///
/// For every named field `x` of the annotated struct this emits:
/// - `FilterBank::x(&self)` and `FilterBank::set_x(&self, value) -> Result<(), BankError>`,
///   where the setter goes through `FilterBank::update` and therefore rebuilds the bank,
/// - `FilterBankBuilder::x(self, value) -> Self`.
///
/// Fields marked `#[accessor(skip)]` only get the builder method; the bank provides its own
/// accessors for them. The generated code refers to `crate::filters` and `crate::error`, so the
/// derive is meant for the configuration struct of this workspace only.
#[proc_macro_derive(BankAccessors, attributes(accessor))]
pub fn derive_bank_accessors(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "BankAccessors needs a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "BankAccessors can only be derived for structs",
            ))
        }
    };

    let mut bank_methods = Vec::new();
    let mut builder_methods = Vec::new();

    for field in fields {
        let Some(name) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let docs: Vec<_> = field
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("doc"))
            .collect();

        let builder_doc = format!("Sets `{name}` on the configuration being built.");
        builder_methods.push(quote! {
            #[doc = #builder_doc]
            pub fn #name(mut self, value: #ty) -> Self {
                self.config.#name = value;
                self
            }
        });

        if skip_bank_accessor(field)? {
            continue;
        }

        let setter = format_ident!("set_{}", name);
        let setter_doc = format!(
            "Sets `{name}` and rebuilds the filter bank.\n\n\
             On error the bank keeps its previous configuration."
        );
        bank_methods.push(quote! {
            #(#docs)*
            pub fn #name(&self) -> #ty {
                self.snapshot().config.#name
            }

            #[doc = #setter_doc]
            pub fn #setter(&self, value: #ty) -> Result<(), crate::error::BankError> {
                self.update(|config| config.#name = value)
            }
        });
    }

    Ok(quote! {
        impl crate::filters::FilterBank {
            #(#bank_methods)*
        }

        impl crate::filters::FilterBankBuilder {
            #(#builder_methods)*
        }
    })
}

fn skip_bank_accessor(field: &Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("accessor")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported accessor option, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}
