use std::collections::HashSet;

/// Convert a snake_case string to CamelCase
///
/// Used for domain struct names and enum variant names.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(to_camel_case("binary_sensor"), "BinarySensor");
/// ```
pub fn to_camel_case(s: &str) -> String {
    s.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro", "override",
    "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

/// Keywords that cannot be raw identifiers
const NON_RAW: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Replace characters that cannot appear in an identifier and make sure the
/// result does not start with a digit.
pub fn sanitize_for_ident(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() {
        s = "_".to_string();
    }
    if s.chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
    {
        s.insert(0, '_');
    }
    s
}

/// Turn an arbitrary controller name into a usable Rust identifier
///
/// Keywords become raw identifiers (`type` → `r#type`); the few that cannot be
/// raw get a trailing underscore.
pub fn sanitize_ident(name: &str) -> String {
    let s = sanitize_for_ident(name);
    if NON_RAW.contains(&s.as_str()) {
        format!("{s}_")
    } else if KEYWORDS.contains(&s.as_str()) {
        format!("r#{s}")
    } else {
        s
    }
}

/// Pick `name`, or `name_1`, `name_2`, … if already taken; records the choice.
pub(crate) fn unique_name(seen: &mut HashSet<String>, name: &str) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{name}_{counter}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Pick `name`, or `name` + `suffix` (repeatedly) while it collides with `taken`.
pub(crate) fn avoid_collision(taken: &HashSet<String>, name: &str, suffix: &str) -> String {
    let mut candidate = name.to_string();
    while taken.contains(&candidate) {
        candidate.push_str(suffix);
    }
    candidate
}

/// Variant name for an enum option literal
pub(crate) fn variant_name(literal: &str) -> String {
    let camel = to_camel_case(&sanitize_for_ident(&literal.to_lowercase()));
    let camel = camel.trim_start_matches('_').to_string();
    match camel.chars().next() {
        None => "Empty".to_string(),
        Some(c) if c.is_ascii_digit() => format!("V{camel}"),
        Some(_) if camel == "Self" => "Self_".to_string(),
        Some(_) => camel,
    }
}
