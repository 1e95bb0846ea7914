//! Identifier normalization.
//!
//! Catalog names are split into segments on `_`, `-`, whitespace and
//! lower→upper case boundaries. Entity names title-case every segment
//! (`order_item` → `OrderItem`); field names lower-case the first segment
//! (`order_item` → `orderItem`). Both transforms are pure, so an unchanged
//! schema always yields the same identifiers.

use inflector::Inflector;
use serde::{Deserialize, Serialize};

/// How collection property names are pluralized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pluralization {
    /// Append a single `s` (`category` → `categorys`). No irregular forms.
    #[default]
    Suffix,
    /// English rules via `inflector`, with an irregular-plural table.
    English,
}

impl Pluralization {
    /// Pluralize a camelCase property name.
    pub fn apply(self, name: &str) -> String {
        match self {
            Pluralization::Suffix => format!("{}s", name),
            Pluralization::English => pluralize_last_segment(name),
        }
    }
}

/// Irregular plurals common in schemas that `inflector` gets wrong.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("knife", "knives"),
    ("half", "halves"),
    ("potato", "potatoes"),
    ("hero", "heroes"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Pluralize only the trailing word of a camelCase name
/// (`orderItem` → `orderItems`, `salesPerson` → `salesPeople`).
fn pluralize_last_segment(name: &str) -> String {
    let split = name
        .char_indices()
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    let (head, tail) = name.split_at(split);
    if tail.is_empty() {
        return String::new();
    }

    let lower = tail.to_lowercase();
    let plural = IRREGULAR_PLURALS
        .iter()
        .find(|(singular, plural)| lower == *singular || lower == *plural)
        .map(|(_, plural)| plural.to_string())
        .unwrap_or_else(|| lower.to_plural());

    if tail.starts_with(char::is_uppercase) {
        format!("{}{}", head, capitalize(&plural))
    } else {
        format!("{}{}", head, plural)
    }
}

/// Split an identifier into its word segments.
pub fn segments(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in raw.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case(word: &str) -> String {
    capitalize(&word.to_lowercase())
}

/// Entity (class) name: `student_course` → `StudentCourse`.
pub fn entity_name(table: &str) -> String {
    segments(table).iter().map(|w| title_case(w)).collect()
}

/// Field (property) name: `author_id` → `authorId`, `userID` → `userId`.
pub fn field_name(column: &str) -> String {
    let words = segments(column);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&title_case(word));
        }
    }
    out
}

/// Attachment name of a relationship on its owning entity: the target
/// entity name with a lower-cased first letter, pluralized for collections.
pub fn property_name(target_entity: &str, collection: bool, pluralization: Pluralization) -> String {
    let mut chars = target_entity.chars();
    let base: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    };
    if collection {
        pluralization.apply(&base)
    } else {
        base
    }
}
