//! Parsing and validation of factory traits.

use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, ToTokens};
use syn::{
    FnArg, GenericParam, Ident, ItemTrait, Pat, Path, ReturnType, Signature, TraitItem,
    TraitItemFn, Type, TypeParamBound, Visibility, WherePredicate,
};

use crate::utils::{
    first_type_argument, is_borrowed_or_opaque, is_marker_bound, mentions_any, render,
    service_shape, ShapeKind,
};

/// A validated factory trait.
pub struct FactoryTrait {
    pub vis: Visibility,
    pub ident: Ident,
    pub marker: Ident,
    /// Supertraits naming other factory contracts.
    pub extends: Vec<Path>,
    pub methods: Vec<FactoryFn>,
}

/// A validated factory method.
pub struct FactoryFn {
    pub sig: Signature,
    pub args: Vec<Ident>,
    pub param_types: Vec<String>,
    pub generics: Vec<Ident>,
    /// The `R` of `Result<R, E>`.
    pub produces: Type,
    pub short_name: String,
    pub kind: ShapeKind,
    /// Rendered return type when it depends on the method's generics.
    pub open_template: Option<String>,
}

/// `#[auto_factory]` is configured by the trait alone.
pub fn check_attribute(attr: &TokenStream2) -> syn::Result<()> {
    if attr.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(attr, "#[auto_factory] takes no arguments"))
    }
}

pub fn parse(item: &ItemTrait) -> syn::Result<FactoryTrait> {
    if !item.generics.params.is_empty() || item.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "factory contracts cannot be generic; declare generic factory methods instead",
        ));
    }
    if let Some(unsafety) = &item.unsafety {
        return Err(syn::Error::new_spanned(unsafety, "factory contracts cannot be unsafe"));
    }
    if let Some(auto) = &item.auto_token {
        return Err(syn::Error::new_spanned(auto, "factory contracts cannot be auto traits"));
    }

    let extends = item
        .supertraits
        .iter()
        .filter_map(|bound| match bound {
            TypeParamBound::Trait(bound) => Some(bound),
            _ => None,
        })
        .filter(|bound| !is_marker_bound(bound))
        .map(|bound| {
            if bound.path.segments.iter().any(|s| !s.arguments.is_none()) {
                return Err(syn::Error::new_spanned(
                    &bound.path,
                    "extended factory contracts cannot take generic arguments",
                ));
            }
            Ok(bound.path.clone())
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let methods = item
        .items
        .iter()
        .map(|member| match member {
            TraitItem::Fn(method) => parse_method(method),
            other => Err(syn::Error::new_spanned(
                other,
                "factory contracts may only declare factory methods",
            )),
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(FactoryTrait {
        vis: item.vis.clone(),
        ident: item.ident.clone(),
        marker: format_ident!("{}Contract", item.ident),
        extends,
        methods,
    })
}

/// Path of the marker generated for the factory trait at `path`.
pub fn marker_path(path: &Path) -> Path {
    let mut marker = path.clone();
    if let Some(last) = marker.segments.last_mut() {
        last.ident = format_ident!("{}Contract", last.ident);
    }
    marker
}

fn parse_method(method: &TraitItemFn) -> syn::Result<FactoryFn> {
    let sig = &method.sig;
    if let Some(body) = &method.default {
        return Err(syn::Error::new_spanned(
            body,
            "factory methods cannot have a default body",
        ));
    }
    if let Some(token) = sig.asyncness {
        return Err(syn::Error::new_spanned(token, "factory methods cannot be async"));
    }
    if let Some(token) = sig.unsafety {
        return Err(syn::Error::new_spanned(token, "factory methods cannot be unsafe"));
    }
    if let Some(token) = sig.constness {
        return Err(syn::Error::new_spanned(token, "factory methods cannot be const"));
    }
    if let Some(abi) = &sig.abi {
        return Err(syn::Error::new_spanned(abi, "factory methods cannot declare an ABI"));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new_spanned(variadic, "factory methods cannot be variadic"));
    }

    check_receiver(sig)?;
    let generics = method_generics(sig)?;

    let mut args = Vec::new();
    let mut param_types = Vec::new();
    for input in sig.inputs.iter().skip(1) {
        let FnArg::Typed(param) = input else {
            continue;
        };
        let Pat::Ident(pat) = &*param.pat else {
            return Err(syn::Error::new_spanned(
                &param.pat,
                "factory method parameters must be plain identifiers",
            ));
        };
        if pat.by_ref.is_some() || pat.subpat.is_some() {
            return Err(syn::Error::new_spanned(
                pat,
                "factory method parameters must be plain identifiers",
            ));
        }
        if is_borrowed_or_opaque(&param.ty) {
            return Err(syn::Error::new_spanned(
                &param.ty,
                "factory method parameters are forwarded by value and must be owned, `'static` types",
            ));
        }
        args.push(pat.ident.clone());
        param_types.push(render(&param.ty));
    }

    let produces = produced_type(sig)?;
    if mentions_any(produces.to_token_stream(), &[Ident::new("Self", Span::call_site())]) {
        return Err(syn::Error::new_spanned(
            produces,
            "factory methods cannot produce `Self`",
        ));
    }
    let (short_name, kind) = service_shape(produces).ok_or_else(|| {
        syn::Error::new_spanned(
            produces,
            "factory methods must produce a named type, a `dyn Trait`, or one of these behind `Box`, `Arc` or `Rc`",
        )
    })?;
    let open_template = mentions_any(produces.to_token_stream(), &generics)
        .then(|| render(produces));

    Ok(FactoryFn {
        sig: sig.clone(),
        args,
        param_types,
        generics,
        produces: produces.clone(),
        short_name: short_name.to_string(),
        kind,
        open_template,
    })
}

fn check_receiver(sig: &Signature) -> syn::Result<()> {
    match sig.receiver() {
        Some(receiver)
            if receiver.reference.is_some()
                && receiver.mutability.is_none()
                && receiver.colon_token.is_none() =>
        {
            Ok(())
        }
        Some(receiver) => Err(syn::Error::new_spanned(
            receiver,
            "factory methods must take `&self`",
        )),
        None => Err(syn::Error::new_spanned(
            &sig.ident,
            "factory methods must take `&self`",
        )),
    }
}

/// Type parameters of a method. Each must be `'static` so its instantiation has a `TypeId`.
fn method_generics(sig: &Signature) -> syn::Result<Vec<Ident>> {
    let mut names = Vec::new();
    for param in &sig.generics.params {
        match param {
            GenericParam::Type(param) => {
                let inline = param.bounds.iter().any(is_static_bound);
                let in_where = sig.generics.where_clause.iter().any(|clause| {
                    clause.predicates.iter().any(|predicate| match predicate {
                        WherePredicate::Type(predicate) => {
                            matches!(&predicate.bounded_ty, Type::Path(path) if path.path.is_ident(&param.ident))
                                && predicate.bounds.iter().any(is_static_bound)
                        }
                        _ => false,
                    })
                });
                if !inline && !in_where {
                    return Err(syn::Error::new_spanned(
                        param,
                        format!("`{}` must be bounded by `'static`", param.ident),
                    ));
                }
                names.push(param.ident.clone());
            }
            GenericParam::Lifetime(param) => {
                return Err(syn::Error::new_spanned(
                    param,
                    "factory methods cannot take lifetime parameters",
                ));
            }
            GenericParam::Const(param) => {
                return Err(syn::Error::new_spanned(
                    param,
                    "factory methods cannot take const parameters",
                ));
            }
        }
    }
    Ok(names)
}

fn is_static_bound(bound: &TypeParamBound) -> bool {
    matches!(bound, TypeParamBound::Lifetime(lifetime) if lifetime.ident == "static")
}

/// `R` from a `Result<R, E>` return type.
fn produced_type(sig: &Signature) -> syn::Result<&Type> {
    let ReturnType::Type(_, ty) = &sig.output else {
        return Err(syn::Error::new_spanned(
            sig,
            "factory methods must return `Result<T, E>` where `E: From<ResolveError>`",
        ));
    };

    let produced = match &**ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .filter(|segment| segment.ident.to_string().ends_with("Result"))
            .and_then(|segment| first_type_argument(&segment.arguments)),
        _ => None,
    };
    let produced = produced.ok_or_else(|| {
        syn::Error::new_spanned(
            ty,
            "factory methods must return `Result<T, E>` where `E: From<ResolveError>`",
        )
    })?;

    if is_borrowed_or_opaque(produced) {
        return Err(syn::Error::new_spanned(
            produced,
            "factory methods must produce owned, `'static` values",
        ));
    }
    Ok(produced)
}
