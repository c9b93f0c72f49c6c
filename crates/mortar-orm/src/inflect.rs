//! Word inflection for table and key naming.
//!
//! Model names become table names by snake-casing and pluralizing; pivot
//! tables and foreign keys are derived from singular forms. The rule set is
//! intentionally small: irregulars, uncountables, `-ies`/`-es` endings, plain
//! `-s` for the rest.

use heck::ToSnakeCase;

const IRREGULARS: &[(&str, &str)] = &[
	("person", "people"),
	("man", "men"),
	("woman", "women"),
	("child", "children"),
	("foot", "feet"),
	("tooth", "teeth"),
	("goose", "geese"),
	("mouse", "mice"),
	("ox", "oxen"),
];

const UNCOUNTABLE: &[&str] = &[
	"equipment",
	"fish",
	"information",
	"money",
	"series",
	"sheep",
	"species",
];

pub fn snake_case(input: &str) -> String {
	input.to_snake_case()
}

pub fn pluralize(word: &str) -> String {
	if word.is_empty() || UNCOUNTABLE.contains(&word) {
		return word.to_string();
	}
	for (singular, plural) in IRREGULARS {
		if word == *singular {
			return (*plural).to_string();
		}
	}
	if let Some(stem) = word.strip_suffix('y') {
		if !stem.is_empty() && !ends_with_vowel(stem) {
			return format!("{}ies", stem);
		}
	}
	if word.ends_with('s')
		|| word.ends_with('x')
		|| word.ends_with('z')
		|| word.ends_with("ch")
		|| word.ends_with("sh")
	{
		return format!("{}es", word);
	}
	format!("{}s", word)
}

pub fn singularize(word: &str) -> String {
	if word.is_empty() || UNCOUNTABLE.contains(&word) {
		return word.to_string();
	}
	for (singular, plural) in IRREGULARS {
		if word == *plural {
			return (*singular).to_string();
		}
	}
	if let Some(stem) = word.strip_suffix("ies") {
		if !stem.is_empty() {
			return format!("{}y", stem);
		}
	}
	for suffix in ["sses", "xes", "zes", "ches", "shes"] {
		if word.ends_with(suffix) {
			return word[..word.len() - 2].to_string();
		}
	}
	word.strip_suffix('s').unwrap_or(word).to_string()
}

/// The default table for a model: pluralized snake-case of the type name.
pub fn table_name(model_name: &str) -> String {
	pluralize(&snake_case(model_name))
}

/// The default foreign key referencing `table`: its singular plus `_id`.
pub fn foreign_key(table: &str) -> String {
	format!("{}_id", singularize(table))
}

/// The default pivot table for two tables: their singular forms joined by
/// `_` in lexicographic order.
pub fn pivot_table(first: &str, second: &str) -> String {
	let mut singulars = [singularize(first), singularize(second)];
	singulars.sort();
	singulars.join("_")
}

fn ends_with_vowel(word: &str) -> bool {
	matches!(
		word.chars().last(),
		Some('a') | Some('e') | Some('i') | Some('o') | Some('u')
	)
}
