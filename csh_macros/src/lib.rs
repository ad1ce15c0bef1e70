//! # csh_macros
//!
//! Generates the static command/variable tables that substitute for the
//! linker-section trick the original embedded shell relies on (see
//! `spec.md` §9: "substitute an explicit `register_command(&desc)` called
//! from a per-module initializer collected into a slice at startup").
//!
//! Grounded on the reference shell's `ushell_dispatcher` crate: the same
//! `syn`/`quote`/`proc-macro2` stack, the same `mod <ident>; "<dsl>"`
//! input shape and `LitStr`-driven descriptor parsing. The descriptor DSL
//! itself is redesigned: the reference shell encodes a typed per-argument
//! call signature (`"dFs: path::to::f1 ..."`); this spec fixes every
//! command to `fn(&mut ArgvContext) -> i32` (see `original_source`'s
//! `chry_syscall_func_t`), so the DSL only needs to carry the
//! `{ path, name, func, usage, help }` descriptor fields.
//!
//! ## `commands!` DSL
//!
//! ```text
//! commands!(mod cmds; "func_path | name | path | usage | help ; func_path2 | name2 | path2");
//! ```
//!
//! Entries are separated by `;`. Fields are separated by `|`: `func_path`
//! and `name` are mandatory; `path` defaults to `"/bin"`; `usage` and
//! `help` are optional and become `None` when omitted or empty.
//!
//! ## `variables!` DSL
//!
//! ```text
//! variables!(mod vars; "name | cell_path | rw ; name2 | cell_path2 | r");
//! ```
//!
//! `rw` is one of `r`, `w`, `rw` controlling the `readable`/`writable`
//! attribute bits. `size_bytes` is not part of the DSL: it is read off the
//! referenced cell's own `VarStorage::size_bytes()` at lookup time, so it
//! can never drift from the cell's real size.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse::Parse, parse_macro_input, Ident, LitStr, Path, Result, Token};

struct ModAndDsl {
    mod_ident: Ident,
    body: LitStr,
}

impl Parse for ModAndDsl {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        input.parse::<Token![mod]>()?;
        let mod_ident: Ident = input.parse()?;
        input.parse::<Token![;]>()?;
        let body: LitStr = input.parse()?;
        Ok(Self { mod_ident, body })
    }
}

fn split_fields(entry: &str) -> Vec<String> {
    entry.split('|').map(|f| f.trim().to_string()).collect()
}

fn opt_str(field: Option<&String>) -> TokenStream2 {
    match field.map(|s| s.as_str()) {
        Some(s) if !s.is_empty() => quote! { ::core::option::Option::Some(#s) },
        _ => quote! { ::core::option::Option::None },
    }
}

/// `commands!(mod <ident>; "<dsl>")` — builds `<ident>::TABLE: &'static
/// [csh_core::symtab::CommandDescriptor]`.
#[proc_macro]
pub fn commands(input: TokenStream) -> TokenStream {
    let ModAndDsl { mod_ident, body } = parse_macro_input!(input as ModAndDsl);
    let dsl = body.value();

    let mut entries = Vec::new();
    for raw_entry in dsl.split(';') {
        let entry = raw_entry.trim();
        if entry.is_empty() {
            continue;
        }
        let fields = split_fields(entry);
        let func_path = match fields.first() {
            Some(p) if !p.is_empty() => p,
            _ => {
                return syn::Error::new(body.span(), "missing function path in command entry")
                    .to_compile_error()
                    .into()
            }
        };
        let name = match fields.get(1) {
            Some(n) if !n.is_empty() => n,
            _ => {
                return syn::Error::new(body.span(), "missing command name in command entry")
                    .to_compile_error()
                    .into()
            }
        };
        let path = fields.get(2).filter(|p| !p.is_empty()).cloned().unwrap_or_else(|| "/bin".to_string());
        let usage = opt_str(fields.get(3));
        let help = opt_str(fields.get(4));

        let func_path: Path = match syn::parse_str(func_path) {
            Ok(p) => p,
            Err(e) => return e.to_compile_error().into(),
        };

        entries.push(quote! {
            csh_core::symtab::CommandDescriptor {
                path: #path,
                name: #name,
                func: #func_path,
                usage: #usage,
                help: #help,
            }
        });
    }

    let table_ident = format_ident!("TABLE");
    let expanded = quote! {
        pub mod #mod_ident {
            pub static #table_ident: &'static [csh_core::symtab::CommandDescriptor] = &[
                #(#entries),*
            ];
        }
    };
    expanded.into()
}

/// `variables!(mod <ident>; "<dsl>")` — builds `<ident>::TABLE: &'static
/// [csh_core::symtab::VariableDescriptor]`.
#[proc_macro]
pub fn variables(input: TokenStream) -> TokenStream {
    let ModAndDsl { mod_ident, body } = parse_macro_input!(input as ModAndDsl);
    let dsl = body.value();

    let mut entries = Vec::new();
    for raw_entry in dsl.split(';') {
        let entry = raw_entry.trim();
        if entry.is_empty() {
            continue;
        }
        let fields = split_fields(entry);
        let name = match fields.first() {
            Some(n) if !n.is_empty() => n,
            _ => {
                return syn::Error::new(body.span(), "missing variable name in variable entry")
                    .to_compile_error()
                    .into()
            }
        };
        let cell_path = match fields.get(1) {
            Some(p) if !p.is_empty() => p,
            _ => {
                return syn::Error::new(body.span(), "missing storage path in variable entry")
                    .to_compile_error()
                    .into()
            }
        };
        let rw = fields.get(2).map(|s| s.as_str()).unwrap_or("rw");
        let readable = rw.contains('r');
        let writable = rw.contains('w');

        let cell_path: Path = match syn::parse_str(cell_path) {
            Ok(p) => p,
            Err(e) => return e.to_compile_error().into(),
        };

        entries.push(quote! {
            csh_core::symtab::VariableDescriptor {
                name: #name,
                cell: &#cell_path,
                attr: csh_core::symtab::VarAttr {
                    readable: #readable,
                    writable: #writable,
                },
            }
        });
    }

    let table_ident = format_ident!("TABLE");
    let expanded = quote! {
        pub mod #mod_ident {
            pub static #table_ident: &'static [csh_core::symtab::VariableDescriptor] = &[
                #(#entries),*
            ];
        }
    };
    expanded.into()
}
