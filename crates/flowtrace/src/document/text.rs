//! Text helpers for headings and participant names

use std::sync::OnceLock;

use regex::Regex;

fn upper_before_word() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\P{Ll})(\P{Ll}\p{Ll})").expect("valid pattern"))
}

fn lower_before_upper() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\p{Ll})(\P{Ll})").expect("valid pattern"))
}

/// `WorkshopManagementAPI` → `Workshop Management API`
pub fn split_camel_case(value: &str) -> String {
    let first = upper_before_word().replace_all(value, "$1 $2");
    lower_before_upper().replace_all(&first, "$1 $2").into_owned()
}

/// `MaintenanceJobPlanned` → `Maintenance job planned`
pub fn sentence_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut previous: Option<char> = None;
    for c in value.chars() {
        match previous {
            Some(p) if p.is_lowercase() && c.is_uppercase() => {
                out.push(' ');
                out.extend(c.to_lowercase());
            }
            _ => out.push(c),
        }
        previous = Some(c);
    }
    out
}

/// Participant caption for a service id, broken before its role suffix
pub fn service_display_name(service: &str) -> String {
    split_camel_case(service)
        .replace(" Event Handler", "\\nEvent Handler")
        .replace(" Service", "\\nService")
        .replace(" API", "\\nAPI")
        .replace("Controller", "")
}
