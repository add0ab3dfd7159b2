//! Type-and-name-aware fake data for bulk-inserted rows.
//!
//! Values are keyed on the column's declared kind and (loosely) its name, so
//! a `Number` column named "age" gets plausible ages while a text column
//! named "email" gets addresses. Everything degrades to generic words.

use gridbase_model::{Column, ColumnKind};
use rand::seq::SliceRandom;
use rand::Rng;

static FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Alice", "Barbara", "Carlos", "Dana", "Edsger", "Grace", "Hana", "Ivan",
    "Jorge", "Kei", "Lena", "Margaret", "Niklaus", "Olga", "Priya", "Radia", "Sofia", "Tomas",
];

static LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Hopper", "Liskov", "Dijkstra", "Hamilton", "Wirth", "Perlman",
    "Karlsson", "Okafor", "Nguyen", "Garcia", "Sato", "Novak", "Haddad", "Kowalski",
];

static CITIES: &[&str] = &[
    "Amsterdam", "Austin", "Berlin", "Bogota", "Cairo", "Dublin", "Helsinki", "Kyoto", "Lagos",
    "Lisbon", "Melbourne", "Montreal", "Nairobi", "Oslo", "Porto", "Seoul", "Tallinn", "Zurich",
];

static WORDS: &[&str] = &[
    "amber", "basalt", "cedar", "delta", "ember", "fjord", "garnet", "harbor", "indigo",
    "juniper", "krill", "lumen", "meadow", "nectar", "onyx", "prairie", "quartz", "reef",
    "sierra", "tundra", "umber", "vertex", "willow", "zephyr",
];

static DOMAINS: &[&str] = &["example.com", "example.org", "mail.test", "inbox.test"];

/// Synthesize `count` values for one column.
pub(crate) fn column_values(column: &Column, count: usize, rng: &mut impl Rng) -> Vec<String> {
    let name = column.name.to_lowercase();
    (0..count).map(|_| one_value(&name, column.kind, rng)).collect()
}

fn one_value(name: &str, kind: ColumnKind, rng: &mut impl Rng) -> String {
    if kind.is_numeric() {
        return numeric_value(name, rng);
    }

    if name.contains("email") {
        let first = pick(FIRST_NAMES, rng).to_lowercase();
        let last = pick(LAST_NAMES, rng).to_lowercase();
        return format!("{first}.{last}@{}", pick(DOMAINS, rng));
    }
    if name.contains("first") && name.contains("name") {
        return pick(FIRST_NAMES, rng).to_string();
    }
    if name.contains("last") && name.contains("name") {
        return pick(LAST_NAMES, rng).to_string();
    }
    if name.contains("name") {
        return format!("{} {}", pick(FIRST_NAMES, rng), pick(LAST_NAMES, rng));
    }
    if name.contains("city") || name.contains("location") {
        return pick(CITIES, rng).to_string();
    }
    if name.contains("phone") {
        return format!(
            "{:03}-{:03}-{:04}",
            rng.gen_range(200..1000),
            rng.gen_range(0..1000),
            rng.gen_range(0..10_000)
        );
    }

    format!("{} {}", pick(WORDS, rng), pick(WORDS, rng))
}

fn numeric_value(name: &str, rng: &mut impl Rng) -> String {
    if name.contains("age") {
        return rng.gen_range(18..=90).to_string();
    }
    if name.contains("price") || name.contains("amount") || name.contains("cost") {
        return format!("{:.2}", rng.gen_range(1.0..10_000.0));
    }
    if name.contains("year") {
        return rng.gen_range(1970..=2026).to_string();
    }
    rng.gen_range(0..100_000).to_string()
}

fn pick<'a>(options: &'a [&'a str], rng: &mut impl Rng) -> &'a str {
    options.choose(rng).expect("non-empty word list")
}
