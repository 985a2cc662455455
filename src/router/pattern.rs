//! Route template compiler.
//!
//! Turns a template such as `/student/{name:str}/{id:int}` into an anchored
//! regular expression with one named capture group per placeholder, plus the
//! table of casters used to type the captured text.
//!
//! ## Placeholder types
//!
//! | type            | accepted text        | cast to  |
//! |-----------------|----------------------|----------|
//! | `str` (default) | `[^/]+`              | `String` |
//! | `word`          | `\w+`                | `String` |
//! | `int`           | `[+-]?\d+`           | `i64`    |
//! | `float`         | `[+-]?\d+\.\d+`      | `f64`    |
//! | `any`           | `.+`                 | `String` |
//!
//! Any other type name uses the `word` class with no conversion.
//!
//! `\d` matches every Unicode decimal digit, so `int` and `float` captures
//! are folded to ASCII digits before parsing: `/n/٤٢` casts to `42`.
//!
//! Text between placeholders is copied into the expression as-is. It is not
//! escaped, so a literal `.` or `+` in a template acts as a regex operator.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;

use super::vars::{ParamVec, PathValue, PathVars};
use crate::error::{PigError, Result};

/// Locates `{name}` / `{name:type}` segments that contain no nested braces.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^{}:]+)(?::([^{}:]*))?\}").expect("placeholder scanner must compile")
});

/// Code point of the zero of every Unicode decimal digit run (category `Nd`).
/// Each run holds the digits 0-9 at consecutive code points.
const DECIMAL_ZEROS: [u32; 76] = [
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6,
    0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66, 0x0CE6,
    0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040,
    0x1090, 0x17E0, 0x1810, 0x1946, 0x19D0, 0x1A80,
    0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620,
    0xA8D0, 0xA900, 0xA9D0, 0xA9F0, 0xAA50, 0xABF0,
    0xFF10, 0x104A0, 0x10D30, 0x10D40, 0x11066, 0x110F0,
    0x11136, 0x111D0, 0x112F0, 0x11450, 0x114D0, 0x11650,
    0x116C0, 0x116D0, 0x116DA, 0x11730, 0x118E0, 0x11950,
    0x11BF0, 0x11C50, 0x11D50, 0x11DA0, 0x11F50, 0x16130,
    0x16A60, 0x16AC0, 0x16B50, 0x16D70, 0x1CCF0, 0x1D7CE,
    0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6, 0x1E140, 0x1E2F0,
    0x1E4F0, 0x1E5F1, 0x1E950, 0x1FBF0,
];

/// Declared type of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    Str,
    Word,
    Int,
    Float,
    Any,
}

impl PlaceholderKind {
    /// Resolve a type name from a template. `None` means no `:type` was given.
    #[must_use]
    pub fn from_type_name(name: Option<&str>) -> Self {
        match name {
            None | Some("str") => PlaceholderKind::Str,
            Some("int") => PlaceholderKind::Int,
            Some("float") => PlaceholderKind::Float,
            Some("any") => PlaceholderKind::Any,
            // "word" and everything unrecognised
            Some(_) => PlaceholderKind::Word,
        }
    }

    /// Character class inserted into the compiled expression.
    #[must_use]
    pub fn char_class(self) -> &'static str {
        match self {
            PlaceholderKind::Str => r"[^/]+",
            PlaceholderKind::Word => r"\w+",
            PlaceholderKind::Int => r"[+-]?\d+",
            PlaceholderKind::Float => r"[+-]?\d+\.\d+",
            PlaceholderKind::Any => r".+",
        }
    }

    /// Convert captured text into a typed value.
    ///
    /// # Errors
    ///
    /// `PigError::ValueConversion` when the text is not a valid number for
    /// `int` / `float` placeholders (including `i64` overflow).
    pub fn cast(self, name: &str, raw: &str) -> Result<PathValue> {
        let conversion_error = || PigError::ValueConversion {
            name: name.to_string(),
            value: raw.to_string(),
            kind: self,
        };
        let digits = || ascii_digits(raw).ok_or_else(conversion_error);
        match self {
            PlaceholderKind::Int => digits()?
                .parse::<i64>()
                .map(PathValue::Int)
                .map_err(|_| conversion_error()),
            PlaceholderKind::Float => digits()?
                .parse::<f64>()
                .map(PathValue::Float)
                .map_err(|_| conversion_error()),
            PlaceholderKind::Str | PlaceholderKind::Word | PlaceholderKind::Any => {
                Ok(PathValue::Str(raw.to_string()))
            }
        }
    }
}

/// Value of a Unicode decimal digit.
fn decimal_value(c: char) -> Option<u8> {
    let cp = u32::from(c);
    let run = DECIMAL_ZEROS.partition_point(|&zero| zero <= cp).checked_sub(1)?;
    u8::try_from(cp - DECIMAL_ZEROS[run]).ok().filter(|d| *d < 10)
}

/// Rewrite the digits of a numeric capture as ASCII, keeping sign and point.
fn ascii_digits(raw: &str) -> Option<Cow<'_, str>> {
    if raw.is_ascii() {
        return Some(Cow::Borrowed(raw));
    }
    raw.chars()
        .map(|c| match c {
            '+' | '-' | '.' => Some(c),
            _ => decimal_value(c).map(|d| char::from(b'0' + d)),
        })
        .collect::<Option<String>>()
        .map(Cow::Owned)
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaceholderKind::Str => "str",
            PlaceholderKind::Word => "word",
            PlaceholderKind::Int => "int",
            PlaceholderKind::Float => "float",
            PlaceholderKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// Placeholder name and caster, in template order.
pub type CasterTable = SmallVec<[(Arc<str>, PlaceholderKind); 4]>;

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    source: String,
    regex: Regex,
    casters: CasterTable,
}

impl CompiledPattern {
    /// The template this pattern was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Translated expression before anchoring, e.g. `/item/(?P<id>[+-]?\d+)`.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn casters(&self) -> &CasterTable {
        &self.casters
    }

    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and cast every captured placeholder.
    ///
    /// Returns `Ok(None)` when the path does not match at all.
    ///
    /// # Errors
    ///
    /// `PigError::ValueConversion` when a capture matched but cannot be cast.
    pub fn captures(&self, path: &str) -> Result<Option<PathVars>> {
        let Some(caps) = self.regex.captures(path) else {
            return Ok(None);
        };
        let mut params = ParamVec::new();
        for (name, kind) in &self.casters {
            if let Some(m) = caps.name(name) {
                params.push((Arc::clone(name), kind.cast(name, m.as_str())?));
            }
        }
        Ok(Some(PathVars::new(params)))
    }
}

/// Compile a route template.
///
/// # Errors
///
/// * `PigError::DuplicatePlaceholder` if a name is declared twice
/// * `PigError::InvalidPattern` if the resulting expression does not compile
///   (for example an unbalanced `(` in literal text, or a placeholder name
///   that is not a valid group name)
pub fn compile(template: &str) -> Result<CompiledPattern> {
    let mut source = String::with_capacity(template.len() + 16);
    let mut casters = CasterTable::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();
        let kind = PlaceholderKind::from_type_name(caps.get(2).map(|t| t.as_str()));

        if casters.iter().any(|(existing, _)| existing.as_ref() == name) {
            return Err(PigError::DuplicatePlaceholder {
                name: name.to_string(),
                template: template.to_string(),
            });
        }

        source.push_str(&template[last..whole.start()]);
        source.push_str("(?P<");
        source.push_str(name);
        source.push('>');
        source.push_str(kind.char_class());
        source.push(')');
        casters.push((Arc::from(name), kind));
        last = whole.end();
    }
    source.push_str(&template[last..]);

    let regex = Regex::new(&format!("^(?:{source})$")).map_err(|err| PigError::InvalidPattern {
        template: template.to_string(),
        source: err,
    })?;

    Ok(CompiledPattern {
        template: template.to_string(),
        source,
        regex,
        casters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_template_is_unchanged() {
        let pattern = compile("/about/team").unwrap();
        assert_eq!(pattern.source(), "/about/team");
        assert!(pattern.casters().is_empty());
        assert!(pattern.is_match("/about/team"));
        assert!(!pattern.is_match("/about/team/extra"));
        assert!(!pattern.is_match("/about"));
        assert!(!pattern.is_match("/prefix/about/team"));
    }

    #[test]
    fn test_typed_placeholders_translate() {
        let pattern = compile("/student/{name:str}/{id:int}").unwrap();
        assert_eq!(
            pattern.source(),
            r"/student/(?P<name>[^/]+)/(?P<id>[+-]?\d+)"
        );
        let kinds: Vec<_> = pattern
            .casters()
            .iter()
            .map(|(n, k)| (n.to_string(), *k))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("name".to_string(), PlaceholderKind::Str),
                ("id".to_string(), PlaceholderKind::Int)
            ]
        );
    }

    #[test]
    fn test_default_and_unknown_types() {
        assert_eq!(PlaceholderKind::from_type_name(None), PlaceholderKind::Str);
        assert_eq!(
            PlaceholderKind::from_type_name(Some("uuid")),
            PlaceholderKind::Word
        );
        assert_eq!(PlaceholderKind::from_type_name(Some("")), PlaceholderKind::Word);

        let pattern = compile("/tag/{slug:uuid}").unwrap();
        assert!(pattern.is_match("/tag/abc_123"));
        assert!(!pattern.is_match("/tag/abc-123"));
    }

    #[test]
    fn test_student_casts() {
        let pattern = compile("/student/{name:str}/{id:int}").unwrap();
        let vars = pattern.captures("/student/alice/42").unwrap().unwrap();
        assert_eq!(vars.get_str("name").unwrap(), "alice");
        assert_eq!(vars.get_int("id").unwrap(), 42);

        // `abc` never reaches the caster: the int class rejects it first
        let outcome = pattern.captures("/student/alice/abc").unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_cast_failure_surfaces_conversion_error() {
        let pattern = compile("/n/{v:int}").unwrap();
        let err = pattern
            .captures("/n/99999999999999999999999")
            .unwrap_err();
        assert!(matches!(
            err,
            PigError::ValueConversion { kind: PlaceholderKind::Int, .. }
        ));

    }

    #[test]
    fn test_unicode_digits_are_cast() {
        let pattern = compile("/n/{v:int}").unwrap();
        let vars = pattern.captures("/n/\u{0664}\u{0662}").unwrap().unwrap();
        assert_eq!(vars.get_int("v").unwrap(), 42);
        let vars = pattern.captures("/n/-\u{0967}\u{0966}").unwrap().unwrap();
        assert_eq!(vars.get_int("v").unwrap(), -10);

        let pattern = compile("/f/{v:float}").unwrap();
        let vars = pattern.captures("/f/\u{0663}.\u{0661}").unwrap().unwrap();
        assert!((vars.get_float("v").unwrap() - 3.1).abs() < f64::EPSILON);

        // fullwidth digits, still too large for i64
        let pattern = compile("/n/{v:int}").unwrap();
        let err = pattern
            .captures(&format!("/n/{}", "\u{FF19}".repeat(20)))
            .unwrap_err();
        assert!(matches!(err, PigError::ValueConversion { ref name, .. } if name == "v"));
    }

    #[test]
    fn test_decimal_value() {
        assert_eq!(decimal_value('7'), Some(7));
        assert_eq!(decimal_value('\u{0669}'), Some(9));
        assert_eq!(decimal_value('\u{1D7FF}'), Some(9));
        assert_eq!(decimal_value('\u{1D7CE}'), Some(0));
        assert_eq!(decimal_value('a'), None);
        assert_eq!(decimal_value('\u{0020}'), None);
    }

    #[test]
    fn test_float_requires_decimal_point() {
        let pattern = compile("/item/{id:float}").unwrap();
        let vars = pattern.captures("/item/3.14").unwrap().unwrap();
        assert!((vars.get_float("id").unwrap() - 3.14).abs() < f64::EPSILON);
        assert!(pattern.captures("/item/3").unwrap().is_none());
        let vars = pattern.captures("/item/-0.5").unwrap().unwrap();
        assert!((vars.get_float("id").unwrap() + 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_int_accepts_sign() {
        let pattern = compile("/n/{v:int}").unwrap();
        let vars = pattern.captures("/n/+7").unwrap().unwrap();
        assert_eq!(vars.get_int("v").unwrap(), 7);
        let vars = pattern.captures("/n/-7").unwrap().unwrap();
        assert_eq!(vars.get_int("v").unwrap(), -7);
    }

    #[test]
    fn test_any_spans_slashes() {
        let pattern = compile("/files/{rest:any}").unwrap();
        let vars = pattern.captures("/files/a/b/c.txt").unwrap().unwrap();
        assert_eq!(vars.get_str("rest").unwrap(), "a/b/c.txt");
    }

    #[test]
    fn test_str_stops_at_slash() {
        let pattern = compile("/u/{name}").unwrap();
        assert!(pattern.is_match("/u/bob"));
        assert!(!pattern.is_match("/u/bob/extra"));
    }

    #[test]
    fn test_literal_text_is_not_escaped() {
        let pattern = compile("/v1.0/{id:int}").unwrap();
        assert!(pattern.is_match("/v1.0/5"));
        // `.` behaves as a metacharacter
        assert!(pattern.is_match("/v1x0/5"));
    }

    #[test]
    fn test_duplicate_placeholder_rejected() {
        let err = compile("/a/{id}/b/{id:int}").unwrap_err();
        assert!(matches!(err, PigError::DuplicatePlaceholder { ref name, .. } if name == "id"));
    }

    #[test]
    fn test_invalid_literal_rejected() {
        let err = compile("/broken(/{id}").unwrap_err();
        assert!(matches!(err, PigError::InvalidPattern { .. }));
    }
}
