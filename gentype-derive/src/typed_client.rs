use darling::{ast, FromDeriveInput, FromField, FromMeta};
use proc_macro2::{Ident, Span, TokenStream};
use syn::{parse_quote, DeriveInput, Generics, Path, Type, Visibility};

#[derive(FromField)]
struct Field {
    ident: Option<Ident>,
}

#[derive(FromDeriveInput)]
#[darling(attributes(genclient), supports(struct_named))]
struct TypedClientAttrs {
    ident: Ident,
    vis: Visibility,
    generics: Generics,
    data: ast::Data<(), Field>,

    #[darling(default)]
    resource: Option<String>,
    #[darling(default)]
    non_namespaced: bool,
    #[darling(default)]
    no_verbs: bool,
    #[darling(default)]
    only_verbs: Option<String>,
    #[darling(default)]
    skip_verbs: Option<String>,
    #[darling(default)]
    no_status: bool,
    #[darling(default)]
    list: Option<Type>,
    #[darling(default)]
    apply: Option<Type>,
    #[darling(default)]
    prefers_protobuf: bool,
    #[darling(multiple, rename = "method")]
    methods: Vec<Method>,
    #[darling(default)]
    crates: Crates,
}

#[derive(Debug, FromMeta)]
struct Method {
    name: Ident,
    verb: String,
    #[darling(default)]
    subresource: Option<String>,
    #[darling(default)]
    input: Option<Type>,
    #[darling(default)]
    result: Option<Type>,
}

#[derive(Debug, FromMeta)]
struct Crates {
    #[darling(default = "Self::default_gentype")]
    gentype: Path,
}

// Default is required when the subattribute isn't mentioned at all
// Delegate to darling rather than deriving, so that we can piggyback off the `#[darling(default)]` clauses
impl Default for Crates {
    fn default() -> Self {
        Self::from_list(&[]).unwrap()
    }
}

impl Crates {
    fn default_gentype() -> Path {
        parse_quote! { ::gentype } // by default must work well with people using facade crate
    }
}

/// The standard verbs, in generation order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verb {
    Create,
    Update,
    UpdateStatus,
    Delete,
    DeleteCollection,
    Get,
    List,
    Watch,
    Patch,
    Apply,
    ApplyStatus,
}

impl Verb {
    const ALL: [Verb; 11] = [
        Verb::Create,
        Verb::Update,
        Verb::UpdateStatus,
        Verb::Delete,
        Verb::DeleteCollection,
        Verb::Get,
        Verb::List,
        Verb::Watch,
        Verb::Patch,
        Verb::Apply,
        Verb::ApplyStatus,
    ];

    fn name(self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::UpdateStatus => "update_status",
            Verb::Delete => "delete",
            Verb::DeleteCollection => "delete_collection",
            Verb::Get => "get",
            Verb::List => "list",
            Verb::Watch => "watch",
            Verb::Patch => "patch",
            Verb::Apply => "apply",
            Verb::ApplyStatus => "apply_status",
        }
    }

    fn parse_list(list: &str) -> darling::Result<Vec<Verb>> {
        let mut errors = darling::Error::accumulator();
        let verbs = list
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .filter_map(|v| {
                let verb = Verb::ALL.into_iter().find(|known| known.name() == v);
                if verb.is_none() {
                    errors.push(darling::Error::unknown_value(v));
                }
                verb
            })
            .collect();
        errors.finish_with(verbs)
    }

    fn uses_list(self) -> bool {
        matches!(self, Verb::List | Verb::DeleteCollection)
    }

    fn uses_apply(self) -> bool {
        matches!(self, Verb::Apply | Verb::ApplyStatus)
    }

    fn is_status(self) -> bool {
        matches!(self, Verb::UpdateStatus | Verb::ApplyStatus)
    }
}

/// Verbs an extension method can take
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MethodVerb {
    Get,
    List,
    Create,
    Update,
    Patch,
    Apply,
}

impl MethodVerb {
    fn parse(verb: &str) -> darling::Result<Self> {
        Ok(match verb {
            "get" => MethodVerb::Get,
            "list" => MethodVerb::List,
            "create" => MethodVerb::Create,
            "update" => MethodVerb::Update,
            "patch" => MethodVerb::Patch,
            "apply" => MethodVerb::Apply,
            other => return Err(darling::Error::unknown_value(other)),
        })
    }
}

impl TypedClientAttrs {
    fn has_status_field(&self) -> bool {
        match &self.data {
            ast::Data::Struct(fields) => fields
                .iter()
                .any(|f| f.ident.as_ref().is_some_and(|i| i == "status")),
            ast::Data::Enum(_) => false,
        }
    }

    fn verbs(&self) -> darling::Result<Vec<Verb>> {
        if self.no_verbs {
            return Ok(vec![]);
        }
        let selected = match &self.only_verbs {
            Some(only) => Verb::parse_list(only)?,
            None => Verb::ALL.to_vec(),
        };
        let skipped = match &self.skip_verbs {
            Some(skip) => Verb::parse_list(skip)?,
            None => vec![],
        };
        let with_status = !self.no_status && self.has_status_field();
        Ok(Verb::ALL
            .into_iter()
            .filter(|v| selected.contains(v) && !skipped.contains(v))
            .filter(|v| with_status || !v.is_status())
            .filter(|v| self.apply.is_some() || !v.uses_apply())
            .collect())
    }
}

pub(crate) fn derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = match syn::parse2(input) {
        Err(err) => return err.to_compile_error(),
        Ok(di) => di,
    };
    let attrs = match TypedClientAttrs::from_derive_input(&ast) {
        Err(err) => return err.write_errors(),
        Ok(attrs) => attrs,
    };
    if !attrs.generics.params.is_empty() {
        return syn::Error::new_spanned(&attrs.generics, "TypedClient does not support generic types")
            .to_compile_error();
    }
    match generate(&attrs) {
        Err(err) => err.write_errors(),
        Ok(tokens) => tokens,
    }
}

fn generate(attrs: &TypedClientAttrs) -> darling::Result<TokenStream> {
    let TypedClientAttrs {
        ident,
        vis,
        resource,
        non_namespaced,
        list,
        apply,
        prefers_protobuf,
        methods,
        crates: Crates { gentype },
        ..
    } = attrs;
    let verbs = attrs.verbs()?;

    let plural = pluralize(&ident.to_string());
    let resource = resource.clone().unwrap_or_else(|| plural.to_lowercase());
    let getter_trait = format_ident!("{}Getter", plural);
    let getter_fn = Ident::new(&to_snake_case(&plural), Span::call_site());
    let interface = format_ident!("{}Interface", ident);
    let client = format_ident!("{}Client", ident);

    let list_ty: Type = list.clone().unwrap_or_else(|| parse_quote!(#gentype::core::ObjectList<#ident>));
    let inner_list: Type = if verbs.iter().any(|v| v.uses_list()) {
        list_ty.clone()
    } else {
        parse_quote!(#gentype::gentype::NoList)
    };
    let inner_apply: Type = match apply {
        Some(apply) if verbs.iter().any(|v| v.uses_apply()) => apply.clone(),
        _ => parse_quote!(#gentype::gentype::NoApply),
    };
    let inner: Type = parse_quote!(#gentype::gentype::Client<#ident, #inner_list, #inner_apply>);

    let options = if *prefers_protobuf {
        quote! { #gentype::gentype::ClientOptions::prefers_protobuf() }
    } else {
        quote! { #gentype::gentype::ClientOptions::default() }
    };

    let getter_doc = format!("{getter_trait} has a method to return a {interface}");
    let getter_fn_doc = format!("A client for {resource}");
    let interface_doc = format!("{interface} has methods to work with {ident} resources");
    let client_doc = format!("{client} implements {interface}");
    let (getter_sig, getter_call, new_sig, new_namespace) = if *non_namespaced {
        (
            quote! { fn #getter_fn(&self) -> #client },
            quote! { #client::new(::std::clone::Clone::clone(self)) },
            quote! { pub fn new(client: #gentype::RestClient) -> Self },
            quote! { "" },
        )
    } else {
        (
            quote! { fn #getter_fn(&self, namespace: &str) -> #client },
            quote! { #client::new(::std::clone::Clone::clone(self), namespace) },
            quote! { pub fn new(client: #gentype::RestClient, namespace: &str) -> Self },
            quote! { namespace },
        )
    };

    let ctx = Ctx {
        gentype,
        object: parse_quote!(#ident),
        list: list_ty,
        apply: apply.clone(),
    };
    let mut decls = Vec::new();
    let mut impls = Vec::new();
    for verb in &verbs {
        let (decl, body) = ctx.verb(*verb);
        decls.push(decl);
        impls.push(body);
    }
    let mut errors = darling::Error::accumulator();
    for method in methods {
        if let Some((decl, body)) = errors.handle(ctx.method(method)) {
            decls.push(decl);
            impls.push(body);
        }
    }
    errors.finish()?;

    let trait_items = decls.iter().map(|decl| {
        let sig = decl.trait_sig();
        quote! { #sig; }
    });
    let impl_items = decls.iter().zip(&impls).map(|(decl, body)| {
        let sig = decl.async_sig();
        quote! { #sig { #body } }
    });

    Ok(quote! {
        #[doc = #getter_doc]
        #vis trait #getter_trait {
            #[doc = #getter_fn_doc]
            #getter_sig;
        }

        #[automatically_derived]
        impl #getter_trait for #gentype::RestClient {
            #getter_sig {
                #getter_call
            }
        }

        #[doc = #interface_doc]
        #vis trait #interface {
            #(#trait_items)*
        }

        #[doc = #client_doc]
        #[derive(Clone, Debug)]
        #vis struct #client {
            inner: #inner,
        }

        impl #client {
            #[doc = #getter_fn_doc]
            #new_sig {
                Self {
                    inner: #gentype::gentype::Client::new(
                        #resource,
                        client,
                        ::std::sync::Arc::new(#gentype::core::QueryParameterCodec),
                        #new_namespace,
                        #options,
                    ),
                }
            }

            /// The generic client the methods forward to
            pub fn inner(&self) -> &#inner {
                &self.inner
            }
        }

        #[automatically_derived]
        impl #interface for #client {
            #(#impl_items)*
        }
    })
}

/// A method of the generated interface
struct Decl {
    doc: String,
    name: Ident,
    args: TokenStream,
    output: Type,
    gentype: Path,
}

impl Decl {
    fn trait_sig(&self) -> TokenStream {
        let Decl {
            doc,
            name,
            args,
            output,
            gentype,
        } = self;
        quote! {
            #[doc = #doc]
            fn #name(&self, #args) -> impl ::std::future::Future<Output = #gentype::Result<#output>> + ::std::marker::Send
        }
    }

    fn async_sig(&self) -> TokenStream {
        let Decl {
            name,
            args,
            output,
            gentype,
            ..
        } = self;
        quote! { async fn #name(&self, #args) -> #gentype::Result<#output> }
    }
}

/// What the verb bodies are generated against
struct Ctx<'a> {
    gentype: &'a Path,
    object: Type,
    list: Type,
    apply: Option<Type>,
}

impl Ctx<'_> {
    fn decl(&self, doc: &str, name: &str, args: TokenStream, output: Type) -> Decl {
        Decl {
            doc: doc.into(),
            name: Ident::new(name, Span::call_site()),
            args,
            output,
            gentype: self.gentype.clone(),
        }
    }

    fn verb(&self, verb: Verb) -> (Decl, TokenStream) {
        let Ctx {
            gentype,
            object,
            list,
            ..
        } = self;
        let params = quote!(#gentype::core::params);
        let unit: Type = parse_quote!(());
        // the apply type is always set when apply verbs are selected
        let apply = self.apply.clone().unwrap_or_else(|| unit.clone());
        let name = verb.name();
        match verb {
            Verb::Create => (
                self.decl(
                    "Create an object, returning the server's representation of it",
                    name,
                    quote!(obj: &#object, opts: &#params::CreateOptions),
                    object.clone(),
                ),
                quote!(self.inner.create(obj, opts).await),
            ),
            Verb::Update => (
                self.decl(
                    "Replace an object, returning the server's representation of it",
                    name,
                    quote!(obj: &#object, opts: &#params::UpdateOptions),
                    object.clone(),
                ),
                quote!(self.inner.update(obj, opts).await),
            ),
            Verb::UpdateStatus => (
                self.decl(
                    "Replace the status of an object, returning the whole object",
                    name,
                    quote!(obj: &#object, opts: &#params::UpdateOptions),
                    object.clone(),
                ),
                quote!(self.inner.update_status(obj, opts).await),
            ),
            Verb::Delete => (
                self.decl(
                    "Delete a named object",
                    name,
                    quote!(name: &str, opts: &#params::DeleteOptions),
                    unit,
                ),
                quote!(self.inner.delete(name, opts).await),
            ),
            Verb::DeleteCollection => (
                self.decl(
                    "Delete every object matched by `list_opts`",
                    name,
                    quote!(opts: &#params::DeleteOptions, list_opts: &#params::ListOptions),
                    unit,
                ),
                quote!(self.inner.delete_collection(opts, list_opts).await),
            ),
            Verb::Get => (
                self.decl(
                    "Get a named object",
                    name,
                    quote!(name: &str, opts: &#params::GetOptions),
                    object.clone(),
                ),
                quote!(self.inner.get(name, opts).await),
            ),
            Verb::List => (
                self.decl(
                    "List objects matching `opts`",
                    name,
                    quote!(opts: &#params::ListOptions),
                    list.clone(),
                ),
                quote!(self.inner.list(opts).await),
            ),
            Verb::Watch => (
                self.decl(
                    "Watch objects matching `opts`",
                    name,
                    quote!(opts: &#params::ListOptions),
                    parse_quote!(#gentype::gentype::WatchStream<#object>),
                ),
                quote!(self.inner.watch(opts).await),
            ),
            Verb::Patch => (
                self.decl(
                    "Patch a named object, or one of its subresources",
                    name,
                    quote! {
                        name: &str,
                        pt: #params::PatchType,
                        data: ::std::vec::Vec<u8>,
                        opts: &#params::PatchOptions,
                        subresources: &[&str]
                    },
                    object.clone(),
                ),
                quote!(self.inner.patch(name, pt, data, opts, subresources).await),
            ),
            Verb::Apply => (
                self.decl(
                    "Server-side apply a configuration, returning the applied object",
                    name,
                    quote!(cfg: &#apply, opts: &#params::ApplyOptions),
                    object.clone(),
                ),
                quote!(self.inner.apply(cfg, opts).await),
            ),
            Verb::ApplyStatus => (
                self.decl(
                    "Server-side apply a configuration to the status of an object, returning the whole object",
                    name,
                    quote!(cfg: &#apply, opts: &#params::ApplyOptions),
                    object.clone(),
                ),
                quote!(self.inner.apply_status(cfg, opts).await),
            ),
        }
    }

    fn method(&self, method: &Method) -> darling::Result<(Decl, TokenStream)> {
        let Ctx {
            gentype, object, list, ..
        } = self;
        let params = quote!(#gentype::core::params);
        let verb = MethodVerb::parse(&method.verb).map_err(|e| e.at("verb"))?;
        // list verbs name the item type in `result`
        let result: Type = match (verb, &method.result) {
            (MethodVerb::List, Some(item)) => parse_quote!(#gentype::core::ObjectList<#item>),
            (MethodVerb::List, None) => list.clone(),
            (_, Some(result)) => result.clone(),
            (_, None) => object.clone(),
        };
        let input = match (&method.input, verb) {
            (Some(input), _) => input.clone(),
            (None, MethodVerb::Apply) => self.apply.clone().ok_or_else(|| {
                darling::Error::custom("an apply method needs an `input` or the `apply` type").at("input")
            })?,
            (None, _) => object.clone(),
        };
        let subresources: Vec<&str> = method
            .subresource
            .as_deref()
            .map(|s| s.split('/').filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        let sub = &subresources;
        let untyped = quote!(self.inner.untyped());
        let free = quote!(#gentype::gentype);
        let name = method.name.to_string();
        let with_parent = !subresources.is_empty();

        let (doc, args, body) = match (verb, with_parent) {
            (MethodVerb::Get, true) => (
                format!("Get the {} subresource of a named object", method.subresource.as_deref().unwrap_or_default()),
                quote!(name: &str, opts: &#params::GetOptions),
                quote!(#free::get_subresource(#untyped, name, &[#(#sub),*], opts).await),
            ),
            (MethodVerb::Get, false) => (
                "Get a named object".to_string(),
                quote!(name: &str, opts: &#params::GetOptions),
                quote!(#free::get(#untyped, name, opts).await),
            ),
            (MethodVerb::List, true) => (
                format!("List the {} subresource of a named object", method.subresource.as_deref().unwrap_or_default()),
                quote!(name: &str, opts: &#params::ListOptions),
                quote!(#free::list_subresource(#untyped, name, &[#(#sub),*], opts).await),
            ),
            (MethodVerb::List, false) => (
                "List objects matching `opts`".to_string(),
                quote!(opts: &#params::ListOptions),
                quote!(#free::list(#untyped, opts).await),
            ),
            (MethodVerb::Create, true) => (
                format!("Create the {} subresource of a named object", method.subresource.as_deref().unwrap_or_default()),
                quote!(name: &str, obj: &#input, opts: &#params::CreateOptions),
                quote!(#free::create_subresource(#untyped, name, &[#(#sub),*], obj, opts).await),
            ),
            (MethodVerb::Create, false) => (
                "Create an object".to_string(),
                quote!(obj: &#input, opts: &#params::CreateOptions),
                quote!(#free::create(#untyped, obj, opts).await),
            ),
            (MethodVerb::Update, true) => (
                format!("Replace the {} subresource of a named object", method.subresource.as_deref().unwrap_or_default()),
                quote!(name: &str, obj: &#input, opts: &#params::UpdateOptions),
                quote!(#free::update_subresource(#untyped, name, &[#(#sub),*], obj, opts).await),
            ),
            (MethodVerb::Update, false) => (
                "Replace an object".to_string(),
                quote!(obj: &#input, opts: &#params::UpdateOptions),
                quote!(#free::update(#untyped, obj, opts).await),
            ),
            (MethodVerb::Patch, _) => (
                "Patch a named object".to_string(),
                quote! {
                    name: &str,
                    pt: #params::PatchType,
                    data: ::std::vec::Vec<u8>,
                    opts: &#params::PatchOptions
                },
                quote!(#free::patch(#untyped, name, pt, data, opts, &[#(#sub),*]).await),
            ),
            (MethodVerb::Apply, true) => (
                format!("Server-side apply the {} subresource of a named object", method.subresource.as_deref().unwrap_or_default()),
                quote!(name: &str, cfg: &#input, opts: &#params::ApplyOptions),
                quote!(#free::apply_subresource(#untyped, name, &[#(#sub),*], cfg, opts).await),
            ),
            (MethodVerb::Apply, false) => (
                "Server-side apply a configuration".to_string(),
                quote!(cfg: &#input, opts: &#params::ApplyOptions),
                quote!(#free::apply(#untyped, cfg, opts).await),
            ),
        };
        Ok((self.decl(&doc, &name, args, result), body))
    }
}

/// Pluralize a PascalCase type name
fn pluralize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| lower.ends_with(end)) {
        return format!("{name}es");
    }
    if let Some(stem) = name.strip_suffix('y') {
        let consonant_before = stem
            .chars()
            .last()
            .is_some_and(|c| !matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'));
        if consonant_before {
            return format!("{stem}ies");
        }
    }
    format!("{name}s")
}

/// `NetworkPolicies` to `network_policies`, keeping acronyms together
fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: TokenStream) -> String {
        derive(input).to_string()
    }

    #[test]
    fn pluralizes_english_endings() {
        assert_eq!(pluralize("Widget"), "Widgets");
        assert_eq!(pluralize("Ingress"), "Ingresses");
        assert_eq!(pluralize("Box"), "Boxes");
        assert_eq!(pluralize("Patch"), "Patches");
        assert_eq!(pluralize("Mesh"), "Meshes");
        assert_eq!(pluralize("NetworkPolicy"), "NetworkPolicies");
        assert_eq!(pluralize("Gateway"), "Gateways");
    }

    #[test]
    fn snake_cases_plurals() {
        assert_eq!(to_snake_case("NetworkPolicies"), "network_policies");
        assert_eq!(to_snake_case("Widgets"), "widgets");
        assert_eq!(to_snake_case("HTTPRoutes"), "http_routes");
        assert_eq!(to_snake_case("V1Things"), "v1_things");
    }

    #[test]
    fn verb_selection() {
        let input: DeriveInput = parse_quote! {
            #[genclient(skip_verbs = "watch,patch", apply = "serde_json::Value")]
            struct Widget {
                metadata: ObjectMeta,
                status: Option<String>,
            }
        };
        let attrs = TypedClientAttrs::from_derive_input(&input).unwrap();
        let names: Vec<_> = attrs.verbs().unwrap().into_iter().map(Verb::name).collect();
        assert_eq!(names, [
            "create",
            "update",
            "update_status",
            "delete",
            "delete_collection",
            "get",
            "list",
            "apply",
            "apply_status"
        ]);

        let input: DeriveInput = parse_quote! {
            #[genclient(only_verbs = "list, get, update_status")]
            struct Widget {
                metadata: ObjectMeta,
            }
        };
        let attrs = TypedClientAttrs::from_derive_input(&input).unwrap();
        let names: Vec<_> = attrs.verbs().unwrap().into_iter().map(Verb::name).collect();
        assert_eq!(names, ["get", "list"], "no status field means no status verbs");

        let input: DeriveInput = parse_quote! {
            #[genclient(no_verbs, only_verbs = "get")]
            struct Widget {
                metadata: ObjectMeta,
            }
        };
        let attrs = TypedClientAttrs::from_derive_input(&input).unwrap();
        assert!(attrs.verbs().unwrap().is_empty());
    }

    #[test]
    fn client_type_follows_selected_verbs() {
        let out = expand(quote! {
            #[genclient(only_verbs = "get", list = "WidgetList")]
            struct Widget {
                metadata: ObjectMeta,
            }
        });
        assert!(out.contains("Client < Widget , :: gentype :: gentype :: NoList , :: gentype :: gentype :: NoApply >"));

        let out = expand(quote! {
            #[genclient(list = "WidgetList", apply = "WidgetApply", crates(gentype = "crate"))]
            struct Widget {
                metadata: ObjectMeta,
            }
        });
        assert!(out.contains("Client < Widget , WidgetList , WidgetApply >"));
        assert!(out.contains("trait WidgetsGetter"));
        assert!(out.contains("fn widgets (& self , namespace : & str) -> WidgetClient"));
    }

    #[test]
    fn cluster_scoped_getters_take_no_namespace() {
        let out = expand(quote! {
            #[genclient(non_namespaced, resource = "clusterwidgets")]
            struct ClusterWidget {
                metadata: ObjectMeta,
            }
        });
        assert!(out.contains("fn cluster_widgets (& self) -> ClusterWidgetClient"));
        assert!(out.contains("\"clusterwidgets\""));
    }

    #[test]
    fn unknown_verbs_and_generics_are_compile_errors() {
        let out = expand(quote! {
            #[genclient(skip_verbs = "frobnicate")]
            struct Widget {
                metadata: ObjectMeta,
            }
        });
        assert!(out.contains("compile_error"));
        assert!(out.contains("frobnicate"));

        let out = expand(quote! {
            struct Widget<T> {
                metadata: ObjectMeta,
                spec: T,
            }
        });
        assert!(out.contains("does not support generic types"));

        let out = expand(quote! {
            #[genclient(method(name = "evict", verb = "delete", subresource = "eviction"))]
            struct Widget {
                metadata: ObjectMeta,
            }
        });
        assert!(out.contains("compile_error"));
    }

    #[test]
    fn list_methods_return_lists() {
        let out = expand(quote! {
            #[genclient(
                only_verbs = "get",
                list = "WidgetList",
                method(name = "list_children", verb = "list"),
                method(name = "list_scales", verb = "list", subresource = "scale", result = "Scale")
            )]
            struct Widget {
                metadata: ObjectMeta,
            }
        });
        assert!(out.contains(
            "fn list_children (& self , opts : & :: gentype :: core :: params :: ListOptions) -> :: gentype :: Result < WidgetList >"
        ));
        assert!(out.contains(
            "-> :: gentype :: Result < :: gentype :: core :: ObjectList < Scale > >"
        ));
        assert!(!out.contains("Result < Scale >"));
    }

    #[test]
    fn apply_methods_need_an_input_type() {
        let out = expand(quote! {
            #[genclient(method(name = "apply_scale", verb = "apply", subresource = "scale"))]
            struct Widget {
                metadata: ObjectMeta,
            }
        });
        assert!(out.contains("an apply method needs an `input` or the `apply` type"));
    }
}
