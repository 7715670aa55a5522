//! Shared helpers for inspecting types and rendering them as strings.

use proc_macro2::{TokenStream as TokenStream2, TokenTree};
use quote::ToTokens;
use syn::{
    GenericArgument, Ident, PathArguments, TraitBound, TraitBoundModifier, Type, TypeParamBound,
};

/// Render tokens as compact source text: `Box<dyn Foo<T>>`, not `Box < dyn Foo < T > >`.
pub fn render(tokens: &impl ToTokens) -> String {
    let mut text = tokens.to_token_stream().to_string();
    for (from, to) in [
        (" < ", "<"),
        ("< ", "<"),
        (" <", "<"),
        (" >", ">"),
        (" ,", ","),
        (" :: ", "::"),
        (":: ", "::"),
        ("& ", "&"),
    ] {
        text = text.replace(from, to);
    }
    text
}

/// Whether the service is an abstraction or a concrete type.
#[derive(Clone, Copy)]
pub enum ShapeKind {
    Abstraction,
    Concrete,
}

/// Unqualified service name and kind of a return type.
///
/// Smart pointers (`Box`, `Arc`, `Rc`) are looked through, so `Box<dyn Foo>`
/// is the abstraction `Foo` and `Arc<Image>` is the concrete type `Image`.
pub fn service_shape(ty: &Type) -> Option<(Ident, ShapeKind)> {
    match ty {
        Type::Paren(inner) => service_shape(&inner.elem),
        Type::Group(inner) => service_shape(&inner.elem),
        Type::TraitObject(object) => object.bounds.iter().find_map(|bound| match bound {
            TypeParamBound::Trait(bound) if !is_marker_bound(bound) => bound
                .path
                .segments
                .last()
                .map(|segment| (segment.ident.clone(), ShapeKind::Abstraction)),
            _ => None,
        }),
        Type::Path(path) if path.qself.is_none() => {
            let segment = path.path.segments.last()?;
            if let Some(inner) = smart_pointer_target(segment) {
                return service_shape(inner);
            }
            Some((segment.ident.clone(), ShapeKind::Concrete))
        }
        _ => None,
    }
}

/// Auto traits and marker bounds that name neither a service nor a factory contract.
const MARKER_BOUNDS: &[&str] = &["Send", "Sync", "Sized", "Unpin"];

/// Whether `bound` is an auto trait, a marker trait or `?Trait`.
pub fn is_marker_bound(bound: &TraitBound) -> bool {
    matches!(bound.modifier, TraitBoundModifier::Maybe(_))
        || bound
            .path
            .segments
            .last()
            .is_some_and(|segment| MARKER_BOUNDS.iter().any(|name| segment.ident == name))
}

fn smart_pointer_target(segment: &syn::PathSegment) -> Option<&Type> {
    if !matches!(segment.ident.to_string().as_str(), "Box" | "Arc" | "Rc") {
        return None;
    }
    single_type_argument(&segment.arguments)
}

/// First type argument of a path segment, e.g. `R` in `Result<R, E>`.
pub fn first_type_argument(arguments: &PathArguments) -> Option<&Type> {
    match arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}

fn single_type_argument(arguments: &PathArguments) -> Option<&Type> {
    match arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => first_type_argument(arguments),
        _ => None,
    }
}

/// Whether `tokens` mention any of `names` as an identifier.
pub fn mentions_any(tokens: TokenStream2, names: &[Ident]) -> bool {
    tokens.into_iter().any(|tree| match tree {
        TokenTree::Ident(ident) => names.contains(&ident),
        TokenTree::Group(group) => mentions_any(group.stream(), names),
        _ => false,
    })
}

/// Whether `ty` is `impl Trait` or contains a reference.
pub fn is_borrowed_or_opaque(ty: &Type) -> bool {
    match ty {
        Type::Reference(_) | Type::ImplTrait(_) => true,
        Type::Paren(inner) => is_borrowed_or_opaque(&inner.elem),
        Type::Group(inner) => is_borrowed_or_opaque(&inner.elem),
        _ => false,
    }
}
