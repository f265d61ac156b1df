//! Arguments for [`JavaTemplate::apply`](crate::JavaTemplate::apply).

use std::sync::Arc;

use jtemplate_parser::ast::Expr;

/// One argument of a template instantiation.
#[derive(Debug, Clone)]
pub enum Substitution {
    /// A subtree, spliced verbatim except for its prefix.
    Tree(Arc<Expr>),
    /// Java source text, rendered into the template as is.
    Text(String),
}

impl Substitution {
    /// A string literal with `value` escaped.
    pub fn string_literal(value: &str) -> Self {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('"');
        for c in value.chars() {
            escape_into(&mut out, c, '"');
        }
        out.push('"');
        Substitution::Text(out)
    }

    pub fn as_tree(&self) -> Option<&Arc<Expr>> {
        match self {
            Substitution::Tree(tree) => Some(tree),
            Substitution::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Substitution::Tree(_) => None,
            Substitution::Text(text) => Some(text),
        }
    }
}

fn escape_into(out: &mut String, c: char, quote: char) {
    match c {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        '\\' => out.push_str("\\\\"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
        c => out.push(c),
    }
}

impl From<Arc<Expr>> for Substitution {
    fn from(tree: Arc<Expr>) -> Self {
        Substitution::Tree(tree)
    }
}

impl From<&Arc<Expr>> for Substitution {
    fn from(tree: &Arc<Expr>) -> Self {
        Substitution::Tree(tree.clone())
    }
}

impl From<&str> for Substitution {
    fn from(text: &str) -> Self {
        Substitution::Text(text.to_string())
    }
}

impl From<String> for Substitution {
    fn from(text: String) -> Self {
        Substitution::Text(text)
    }
}

impl From<bool> for Substitution {
    fn from(value: bool) -> Self {
        Substitution::Text(value.to_string())
    }
}

macro_rules! plain_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Substitution {
                fn from(value: $ty) -> Self {
                    Substitution::Text(value.to_string())
                }
            }
        )*
    };
}

plain_integer!(i8, i16, i32);

impl From<i64> for Substitution {
    fn from(value: i64) -> Self {
        Substitution::Text(format!("{value}L"))
    }
}

impl From<f64> for Substitution {
    fn from(value: f64) -> Self {
        let text = if value.is_nan() {
            "Double.NaN".to_string()
        } else if value.is_infinite() {
            let sign = if value > 0.0 { "POSITIVE" } else { "NEGATIVE" };
            format!("Double.{sign}_INFINITY")
        } else {
            let text = value.to_string();
            if text.contains(['.', 'e', 'E']) { text } else { format!("{text}.0") }
        };
        Substitution::Text(text)
    }
}

impl From<f32> for Substitution {
    fn from(value: f32) -> Self {
        let text = if value.is_nan() {
            "Float.NaN".to_string()
        } else if value.is_infinite() {
            let sign = if value > 0.0 { "POSITIVE" } else { "NEGATIVE" };
            format!("Float.{sign}_INFINITY")
        } else {
            format!("{value}f")
        };
        Substitution::Text(text)
    }
}

/// A `char` literal. Characters outside the Basic Multilingual Plane do not
/// fit a Java `char` and become a `String` literal of their UTF-16 surrogate
/// pair, so a `char` hole rejects them.
impl From<char> for Substitution {
    fn from(value: char) -> Self {
        if value.len_utf16() > 1 {
            let mut out = String::from('"');
            for unit in value.encode_utf16(&mut [0; 2]) {
                out.push_str(&format!("\\u{unit:04X}"));
            }
            out.push('"');
            return Substitution::Text(out);
        }
        let mut out = String::from('\'');
        escape_into(&mut out, value, '\'');
        out.push('\'');
        Substitution::Text(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: impl Into<Substitution>) -> String {
        s.into().as_text().unwrap_or_default().to_string()
    }

    #[test]
    fn values_render_as_java_source() {
        assert_eq!(text(true), "true");
        assert_eq!(text(1), "1");
        assert_eq!(text(32767i16), "32767");
        assert_eq!(text(-3i8), "-3");
        assert_eq!(text(2i64), "2L");
        assert_eq!(text(2.5), "2.5");
        assert_eq!(text(3.0), "3.0");
        assert_eq!(text(3.5f32), "3.5f");
        assert_eq!(text(f64::NAN), "Double.NaN");
        assert_eq!(text("2L"), "2L");
    }

    #[test]
    fn chars_and_strings_are_escaped() {
        assert_eq!(text('c'), "'c'");
        assert_eq!(text('\''), "'\\''");
        assert_eq!(text('\n'), "'\\n'");
        assert_eq!(
            Substitution::string_literal("say \"hi\"\\").as_text(),
            Some("\"say \\\"hi\\\"\\\\\"")
        );
    }

    #[test]
    fn supplementary_chars_become_surrogate_strings() {
        assert_eq!(text('\u{1D11E}'), "\"\\uD834\\uDD1E\"");
        assert_eq!(text('\u{FFFF}'), "'\u{FFFF}'");
        assert_eq!(text('é'), "'é'");
    }
}
