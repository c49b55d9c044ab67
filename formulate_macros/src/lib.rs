use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, FnArg, GenericArgument, Ident, ItemFn, PatType, PathArguments, Type};

enum Param {
    Number,
    Boolean,
    Text,
    OptionalNumber,
    Numbers,
}

fn inner_is_f64(args: &PathArguments) -> bool {
    match args {
        PathArguments::AngleBracketed(generic) => matches!(
            generic.args.first(),
            Some(GenericArgument::Type(Type::Path(inner))) if inner.path.is_ident("f64")
        ),
        _ => false,
    }
}

fn classify(ty: &Type) -> syn::Result<Param> {
    let Type::Path(type_path) = ty else {
        return Err(syn::Error::new_spanned(ty, "unsupported argument type"));
    };
    let Some(segment) = type_path.path.segments.last() else {
        return Err(syn::Error::new_spanned(ty, "unsupported argument type"));
    };
    match segment.ident.to_string().as_str() {
        "f64" => Ok(Param::Number),
        "bool" => Ok(Param::Boolean),
        "String" => Ok(Param::Text),
        "Option" if inner_is_f64(&segment.arguments) => Ok(Param::OptionalNumber),
        "Vec" if inner_is_f64(&segment.arguments) => Ok(Param::Numbers),
        _ => Err(syn::Error::new_spanned(
            ty,
            "expected f64, bool, String, Option<f64> or Vec<f64>",
        )),
    }
}

fn extraction(name: &Ident, param: &Param, position: usize, fn_name: &str) -> TokenStream2 {
    match param {
        Param::Number => quote! {
            let #name = match &args[#position] {
                Value::Number(n) => *n,
                other => return Err(FunctionError::expected_number(#fn_name, #position, other)),
            };
        },
        Param::Boolean => quote! {
            let #name = match &args[#position] {
                Value::Boolean(b) => *b,
                other => return Err(FunctionError::expected_boolean(#fn_name, #position, other)),
            };
        },
        Param::Text => quote! {
            let #name = match &args[#position] {
                Value::String(s) => s.clone(),
                other => return Err(FunctionError::expected_string(#fn_name, #position, other)),
            };
        },
        Param::OptionalNumber => quote! {
            let #name = match args.get(#position) {
                None => None,
                Some(Value::Number(n)) => Some(*n),
                Some(other) => return Err(FunctionError::expected_number(#fn_name, #position, other)),
            };
        },
        Param::Numbers => quote! {
            let mut #name = Vec::with_capacity(args.len() - #position);
            for (offset, arg) in args[#position..].iter().enumerate() {
                match arg {
                    Value::Number(n) => #name.push(*n),
                    other => {
                        return Err(FunctionError::expected_number(#fn_name, #position + offset, other))
                    }
                }
            }
        },
    }
}

/// Turns a typed function into an expression function implementation.
///
/// ```ignore
/// #[formulate_fn]
/// fn log(x: f64, base: f64) -> Result<Value, FunctionError> {
///     Ok(Value::Number(x.ln() / base.ln()))
/// }
/// ```
///
/// expands to `fn log(args: &[Value]) -> Result<Value, FunctionError>` that
/// checks the argument count and argument kinds before running the body.
/// A trailing `Option<f64>` is optional, a trailing `Vec<f64>` collects the
/// remaining arguments; `#[formulate_fn(min = 2)]` sets its minimum length.
/// `Value` and `FunctionError` must be in scope where the attribute is used.
#[proc_macro_attribute]
pub fn formulate_fn(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut min_variadic: usize = 0;
    let attr_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("min") {
            let lit: syn::LitInt = meta.value()?.parse()?;
            min_variadic = lit.base10_parse()?;
            Ok(())
        } else {
            Err(meta.error("unsupported formulate_fn property"))
        }
    });
    parse_macro_input!(attr with attr_parser);

    let input = parse_macro_input!(item as ItemFn);
    match expand(input, min_variadic) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: ItemFn, min_variadic: usize) -> syn::Result<TokenStream2> {
    let attrs = &input.attrs;
    let vis = &input.vis;
    let fn_ident = &input.sig.ident;
    let fn_name = fn_ident.to_string();
    let fn_output = &input.sig.output;
    let fn_body = &input.block;

    let mut params = Vec::new();
    for arg in &input.sig.inputs {
        let FnArg::Typed(PatType { pat, ty, .. }) = arg else {
            return Err(syn::Error::new_spanned(arg, "methods are not supported"));
        };
        let syn::Pat::Ident(ref pat_ident) = **pat else {
            return Err(syn::Error::new_spanned(pat, "unsupported pattern"));
        };
        params.push((pat_ident.ident.clone(), classify(ty)?));
    }

    for (i, (name, param)) in params.iter().enumerate() {
        let trailing_only = matches!(param, Param::OptionalNumber | Param::Numbers);
        if trailing_only && i + 1 != params.len() {
            return Err(syn::Error::new_spanned(
                name,
                "Option<f64> and Vec<f64> must be the last argument",
            ));
        }
    }

    let fixed = params
        .iter()
        .filter(|(_, p)| !matches!(p, Param::OptionalNumber | Param::Numbers))
        .count();
    let arity_check = match params.last() {
        Some((_, Param::OptionalNumber)) => {
            let max = fixed + 1;
            let expected = format!("{}..{}", fixed, max);
            quote! {
                if args.len() < #fixed || args.len() > #max {
                    return Err(FunctionError::argument_count(#fn_name, #expected, args.len()));
                }
            }
        }
        Some((_, Param::Numbers)) => {
            let min = fixed + min_variadic;
            let expected = format!("at least {}", min);
            quote! {
                if args.len() < #min {
                    return Err(FunctionError::argument_count(#fn_name, #expected, args.len()));
                }
            }
        }
        _ => quote! {
            if args.len() != #fixed {
                return Err(FunctionError::argument_count(#fn_name, #fixed, args.len()));
            }
        },
    };

    let extractions: Vec<_> = params
        .iter()
        .enumerate()
        .map(|(i, (name, param))| extraction(name, param, i, &fn_name))
        .collect();

    Ok(quote! {
        #(#attrs)*
        #vis fn #fn_ident(args: &[Value]) #fn_output {
            #arity_check

            #(#extractions)*

            #fn_body
        }
    })
}
