//! Code generation for `#[auto_factory]`.

use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ItemTrait;

use crate::contract::{marker_path, FactoryFn, FactoryTrait};
use crate::utils::ShapeKind;

pub fn expand(item: &ItemTrait, contract: &FactoryTrait) -> TokenStream2 {
    let marker = marker(contract);
    let descriptor = descriptor(contract);
    let implements = implements(contract);
    let dispatch = dispatch(item, contract);

    quote! {
        #item
        #marker
        #descriptor
        #implements
        #dispatch
    }
}

fn marker(contract: &FactoryTrait) -> TokenStream2 {
    let FactoryTrait {
        vis, ident, marker, ..
    } = contract;
    let doc = format!("Factory contract marker for [`{ident}`].");
    quote! {
        #[doc = #doc]
        #[allow(clippy::empty_enum)]
        #vis enum #marker {}
    }
}

fn descriptor(contract: &FactoryTrait) -> TokenStream2 {
    let FactoryTrait { ident, marker, .. } = contract;
    let name = ident.to_string();
    let extends = contract.extends.iter().map(|path| {
        let parent = marker_path(path);
        quote! {
            .extends(<#parent as ::autofactory::FactoryContract>::descriptor())
        }
    });
    let methods = contract.methods.iter().map(signature);

    quote! {
        impl ::autofactory::FactoryContract for #marker {
            const NAME: &'static str = #name;

            fn descriptor() -> ::autofactory::ContractDescriptor {
                ::autofactory::ContractDescriptor::for_trait::<Self>(<Self as ::autofactory::FactoryContract>::NAME)
                    #(#extends)*
                    #(#methods)*
            }
        }
    }
}

fn signature(method: &FactoryFn) -> TokenStream2 {
    let name = method.sig.ident.to_string();
    let short = &method.short_name;
    let kind = match method.kind {
        ShapeKind::Abstraction => quote!(::autofactory::TypeKind::Abstraction),
        ShapeKind::Concrete => quote!(::autofactory::TypeKind::Concrete),
    };
    let returns = match &method.open_template {
        Some(template) => quote! {
            ::autofactory::ReturnType::open(#short, #kind, #template)
        },
        None => {
            let produces = &method.produces;
            quote! {
                ::autofactory::ReturnType::closed::<#produces>(#short, #kind)
            }
        }
    };
    let generics = method.generics.iter().map(|ident| ident.to_string());
    let params = &method.param_types;

    quote! {
        .method(
            ::autofactory::MethodSignature::new(#name, #returns)
                #(.generic(#generics))*
                #(.param(#params))*
        )
    }
}

/// `Implements` impls: the contract itself plus each directly extended contract.
fn implements(contract: &FactoryTrait) -> TokenStream2 {
    let marker = &contract.marker;
    let parents = contract.extends.iter().map(marker_path);
    quote! {
        impl ::autofactory::Implements<#marker> for #marker {}
        #(impl ::autofactory::Implements<#parents> for #marker {})*
    }
}

fn dispatch(item: &ItemTrait, contract: &FactoryTrait) -> TokenStream2 {
    let trait_ident = &contract.ident;
    let marker = &contract.marker;
    let contract_param = format_ident!("__C");

    let supertraits = &item.supertraits;
    let inherited = (!supertraits.is_empty()).then(|| {
        quote! { ::autofactory::Factory<#contract_param>: #supertraits, }
    });

    let methods = contract.methods.iter().map(|method| {
        let sig = &method.sig;
        let method_name = sig.ident.to_string();
        let produces = &method.produces;
        let args = &method.args;
        let capacity = args.len();
        quote! {
            #[allow(clippy::useless_conversion)]
            #sig {
                #[allow(unused_mut)]
                let mut __args = ::autofactory::Arguments::with_capacity(#capacity);
                #(__args.push(#args);)*
                ::autofactory::Factory::<#contract_param>::invoke::<#produces>(
                    self,
                    ::autofactory::MethodId::of::<#marker>(#method_name),
                    __args,
                )
                .map_err(::core::convert::Into::into)
            }
        }
    });

    quote! {
        impl<#contract_param> #trait_ident for ::autofactory::Factory<#contract_param>
        where
            #contract_param: ::autofactory::FactoryContract + ::autofactory::Implements<#marker>,
            #inherited
        {
            #(#methods)*
        }
    }
}
