use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Runtime options accepted by `#[cadenza::main]` and `#[cadenza::test]`.
#[derive(Default)]
pub(crate) struct RuntimeArgs {
    pub(crate) max_tasks: Option<usize>,
    pub(crate) name: Option<String>,
}

impl RuntimeArgs {
    /// Parses `key = value` pairs separated by commas.
    pub(crate) fn parse(attr: TokenStream) -> Result<Self, String> {
        let mut args = Self::default();

        for arg in split_args(attr) {
            let [TokenTree::Ident(key), TokenTree::Punct(eq), value] = arg.as_slice() else {
                return Err(format!(
                    "expected `key = value`, found `{}`",
                    tokens_to_string(&arg)
                ));
            };

            if eq.as_char() != '=' {
                return Err(format!("expected `=` after `{key}`"));
            }

            match key.to_string().as_str() {
                "max_tasks" => {
                    let n = value
                        .to_string()
                        .parse::<usize>()
                        .map_err(|_| format!("`max_tasks` expects an integer, found `{value}`"))?;
                    args.max_tasks = Some(n);
                }
                "name" => args.name = Some(value.to_string()),
                other => return Err(format!("unknown runtime option `{other}`")),
            }
        }

        Ok(args)
    }

    /// Source of the expression building the runtime.
    pub(crate) fn builder(&self) -> String {
        let mut builder = String::from("::cadenza::RuntimeBuilder::new()");

        if let Some(n) = self.max_tasks {
            builder.push_str(&format!(".max_tasks({n})"));
        }

        if let Some(name) = &self.name {
            builder.push_str(&format!(".name({name})"));
        }

        builder.push_str(".build()");
        builder
    }
}

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`.
/// Commas at the top level are used as separators.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens into a Rust source string.
///
/// Consecutive identifiers are separated by a space so they do not merge.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut prev_was_ident = false;

    for t in tokens {
        let is_ident = matches!(t, TokenTree::Ident(_));

        if prev_was_ident && is_ident {
            out.push(' ');
        }

        out.push_str(&t.to_string());
        prev_was_ident = is_ident;
    }

    out
}

/// Rewrites `async fn` into a plain `fn` whose body blocks on the original
/// body inside a fresh runtime.
pub(crate) fn wrap_body(item: TokenStream, args: &RuntimeArgs) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return compile_error("expected a function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => return compile_error("expected a function body"),
    };

    let new_block = format!(
        "{{
            let runtime = {};
            match runtime.block_on(async move {{ {} }}) {{
                ::core::result::Result::Ok(value) => value,
                ::core::result::Result::Err(error) => {{
                    ::core::panic!(\"cadenza runtime failed: {{}}\", error)
                }}
            }}
        }}",
        args.builder(),
        block
    );

    let stream = match new_block.parse::<TokenStream>() {
        Ok(stream) => stream,
        Err(err) => return compile_error(&format!("cadenza macro error: {err}")),
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    tokens.into_iter().collect()
}

pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("::core::compile_error!({msg:?});")
        .parse()
        .unwrap_or_default()
}
