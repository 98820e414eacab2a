//! Ninja variable templates.
//!
//! Rule commands, rule descriptions, and variable values all use Ninja's
//! `$name` syntax. The generator never rewrites these strings: Ninja expands
//! them when it runs. This module only parses them far enough to know which
//! variables a template references so the emitter can check that each one
//! resolves from the edge-local or global scope.
//!
//! ```
//! use kumiki::template::{Segment, parse};
//!
//! let segments = parse("$CXX -o $out.d ${in}");
//! assert_eq!(segments[0], Segment::Variable("CXX"));
//! assert_eq!(segments[2], Segment::Variable("out"));
//! assert_eq!(segments[3], Segment::Literal(".d "));
//! ```

use indexmap::IndexMap;

/// Ordered variable bindings. Insertion order is emission order.
pub type Vars = IndexMap<String, String>;

/// Nested expansions deeper than this are treated as a reference cycle.
const MAX_DEPTH: usize = 16;

/// A piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied verbatim.
    Literal(&'a str),
    /// A `$$`, `$ `, `$:` or `$` newline escape, carrying the produced character.
    Escape(char),
    /// A `$name` or `${name}` reference.
    Variable(&'a str),
}

/// Outcome of looking up one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The variable is bound to this value.
    Resolved(&'a str),
    /// No scope binds the variable.
    Unresolved(&'a str),
}

/// Something that binds variable names to values.
pub trait Resolver {
    /// Look up `name`, returning its unexpanded value.
    fn lookup(&self, name: &str) -> Option<&str>;

    /// Resolve `name` into a [`Resolution`].
    fn resolve<'a>(&'a self, name: &'a str) -> Resolution<'a> {
        self.lookup(name)
            .map_or(Resolution::Unresolved(name), Resolution::Resolved)
    }
}

impl Resolver for Vars {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Layered scope: the first layer binding a name wins.
#[derive(Default)]
pub struct Scope<'a> {
    layers: Vec<&'a dyn Resolver>,
}

impl<'a> Scope<'a> {
    /// Create an empty scope.
    #[must_use]
    pub const fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a layer below the existing ones.
    #[must_use]
    pub fn with(mut self, layer: &'a dyn Resolver) -> Self {
        self.layers.push(layer);
        self
    }
}

impl Resolver for Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.layers.iter().find_map(|layer| layer.lookup(name))
    }
}

/// Returns whether `ch` may appear in an unbraced variable name.
const fn is_var_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

/// Returns whether `ch` may appear in a braced variable name.
const fn is_braced_var_char(ch: char) -> bool {
    is_var_char(ch) || ch == '.'
}

/// Returns whether `name` is usable as a binding name.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_braced_var_char)
}

/// Split `template` into literal, escape, and variable segments.
///
/// Malformed `$` sequences (a trailing `$`, an unclosed `${`, or `$` before a
/// character that starts no name) are kept as literal text so Ninja remains
/// the final arbiter of validity.
#[must_use]
pub fn parse(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut rest = template.char_indices().peekable();

    while let Some((pos, ch)) = rest.next() {
        if ch != '$' {
            continue;
        }
        let Some(&(next_pos, next)) = rest.peek() else {
            break;
        };
        let segment = match next {
            '$' | ' ' | ':' | '\n' => {
                rest.next();
                Some((Segment::Escape(next), next_pos + next.len_utf8()))
            }
            '{' => template
                .get(next_pos + 1..)
                .and_then(|tail| tail.find('}').map(|close| (tail, close)))
                .and_then(|(tail, close)| tail.get(..close))
                .filter(|name| is_valid_name(name))
                .map(|name| (Segment::Variable(name), next_pos + 2 + name.len())),
            c if is_var_char(c) => template.get(next_pos..).map(|tail| {
                let len = tail.find(|c| !is_var_char(c)).unwrap_or(tail.len());
                let name = tail.get(..len).unwrap_or_default();
                (Segment::Variable(name), next_pos + len)
            }),
            _ => None,
        };
        let Some((segment, end)) = segment else {
            continue;
        };
        if let Some(text) = template.get(literal_start..pos).filter(|t| !t.is_empty()) {
            segments.push(Segment::Literal(text));
        }
        segments.push(segment);
        literal_start = end;
        while rest.peek().is_some_and(|(p, _)| *p < end) {
            rest.next();
        }
    }
    if let Some(text) = template.get(literal_start..).filter(|t| !t.is_empty()) {
        segments.push(Segment::Literal(text));
    }
    segments
}

/// Names of every variable `template` references, in order of appearance.
#[must_use]
pub fn references(template: &str) -> Vec<&str> {
    parse(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Replace every reference to `name` in `template` with `value`.
///
/// `value` is inserted as written, so it must already be Ninja text. Other
/// references and escapes are written back in an equivalent form.
///
/// ```
/// use kumiki::template::substitute;
///
/// let text = substitute("$defs -DVERSION=$VERSION", "defs", "-DSIM");
/// assert_eq!(text, "-DSIM -DVERSION=$VERSION");
/// ```
#[must_use]
pub fn substitute(template: &str, name: &str, value: &str) -> String {
    let segments = parse(template);
    let mut out = String::with_capacity(template.len() + value.len());
    for (index, segment) in segments.iter().enumerate() {
        match *segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Escape(ch) => {
                out.push('$');
                out.push(ch);
            }
            Segment::Variable(var) if var == name => out.push_str(value),
            Segment::Variable(var) => {
                let glued = matches!(
                    segments.get(index + 1),
                    Some(Segment::Literal(next)) if next.starts_with(is_var_char)
                );
                if glued || !var.chars().all(is_var_char) {
                    out.push_str("${");
                    out.push_str(var);
                    out.push('}');
                } else {
                    out.push('$');
                    out.push_str(var);
                }
            }
        }
    }
    out
}

/// Result of expanding a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Expanded text. Unresolved references survive as literal `$name`.
    pub text: String,
    /// Names that no scope bound, without duplicates.
    pub unresolved: Vec<String>,
}

/// Expand `template` recursively against `resolver`.
///
/// Values are expanded in turn, mirroring how Ninja evaluates rule variables
/// in an edge's scope. A reference chain deeper than an internal limit is
/// reported as unresolved rather than looping.
#[must_use]
pub fn expand(template: &str, resolver: &dyn Resolver) -> Expansion {
    let mut expansion = Expansion::default();
    expand_into(template, resolver, 0, &mut expansion);
    expansion
}

fn expand_into(template: &str, resolver: &dyn Resolver, depth: usize, acc: &mut Expansion) {
    for segment in parse(template) {
        match segment {
            Segment::Literal(text) => acc.text.push_str(text),
            Segment::Escape('\n') => {}
            Segment::Escape(ch) => acc.text.push(ch),
            Segment::Variable(name) => match resolver.resolve(name) {
                Resolution::Resolved(value) if depth < MAX_DEPTH => {
                    expand_into(value, resolver, depth + 1, acc);
                }
                Resolution::Resolved(_) | Resolution::Unresolved(_) => {
                    acc.text.push('$');
                    acc.text.push_str(name);
                    if !acc.unresolved.iter().any(|n| n == name) {
                        acc.unresolved.push(name.to_owned());
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vars(pairs: &[(&str, &str)]) -> Vars {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[rstest]
    #[case("cp $in $out", vec!["in", "out"])]
    #[case("$out.d", vec!["out"])]
    #[case("/Fo$out $WIN_CFLAGS", vec!["out", "WIN_CFLAGS"])]
    #[case("-FREVISION=$dst/gen/REVISION", vec!["dst"])]
    #[case("${a.b}x$c-d", vec!["a.b", "c-d"])]
    #[case("price $$5 $ and$:", vec![])]
    #[case("trailing $", vec![])]
    #[case("bad ${ brace", vec![])]
    fn references_are_found(#[case] template: &str, #[case] expected: Vec<&str>) {
        assert_eq!(references(template), expected);
    }

    #[test]
    fn parse_keeps_literals_between_references() {
        let segments = parse("a $x b");
        assert_eq!(
            segments,
            vec![
                Segment::Literal("a "),
                Segment::Variable("x"),
                Segment::Literal(" b"),
            ]
        );
    }

    #[test]
    fn parse_handles_escapes() {
        let segments = parse("$$HOME$ x");
        assert_eq!(
            segments,
            vec![
                Segment::Escape('$'),
                Segment::Literal("HOME"),
                Segment::Escape(' '),
                Segment::Literal("x"),
            ]
        );
    }

    #[test]
    fn scope_prefers_earlier_layers() {
        let locals = vars(&[("size", "32x32")]);
        let globals = vars(&[("size", "16x16"), ("dst", "out")]);
        let scope = Scope::new().with(&locals).with(&globals);
        assert_eq!(scope.resolve("size"), Resolution::Resolved("32x32"));
        assert_eq!(scope.resolve("dst"), Resolution::Resolved("out"));
        assert_eq!(scope.resolve("nope"), Resolution::Unresolved("nope"));
    }

    #[test]
    fn expand_recurses_and_reports_unresolved() {
        let globals = vars(&[("src", ".."), ("CFLAGS", "-O2 -I $src $EXTRA")]);
        let expansion = expand("$CXX $CFLAGS $$x", &globals);
        assert_eq!(expansion.text, "$CXX -O2 -I .. $EXTRA $x");
        assert_eq!(expansion.unresolved, vec!["CXX", "EXTRA"]);
    }

    #[test]
    fn expand_stops_on_reference_cycles() {
        let globals = vars(&[("a", "$b"), ("b", "$a")]);
        let expansion = expand("$a", &globals);
        assert_eq!(expansion.unresolved.len(), 1);
    }

    #[rstest]
    #[case("$defs -DX", "-DA -DX")]
    #[case("${defs}_suffix $$keep", "-DA_suffix $$keep")]
    #[case("$other ${a.b} ${other}x $defs", "$other ${a.b} ${other}x -DA")]
    #[case("no reference$ here", "no reference$ here")]
    fn substitute_replaces_only_the_named_variable(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(substitute(template, "defs", "-DA"), expected);
    }

    #[rstest]
    #[case("size", true)]
    #[case("a.b-c_1", true)]
    #[case("", false)]
    #[case("has space", false)]
    fn binding_names_are_validated(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_valid_name(name), valid);
    }
}
