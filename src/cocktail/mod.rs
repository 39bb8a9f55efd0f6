//! Cocktail domain: the record stored in Weaviate, its class definition,
//! CSV import and the repository that queries it.

pub mod import;
pub mod repository;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use crate::vectordb::{ClassDef, Property};

pub use repository::{CocktailRepository, RepositoryError};

pub const CLASS_NAME: &str = "Cocktail";

/// Stored properties, in query order.
pub const FIELDS: [&str; 3] = ["name", "ingredients", "preparation"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cocktail {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ingredients: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub preparation: String,
}

/// Weaviate returns `null` for properties an object was saved without.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Cocktail {
    /// Text that gets embedded when vectors are computed client-side.
    pub fn cocktail_text(&self) -> String {
        format!(
            "Cocktail: {}\nIngredients: {}\nPreparation: {}",
            self.name, self.ingredients, self.preparation
        )
    }
}

/// The `Cocktail` class.
///
/// With `client_vectors` the class uses `vectorizer: "none"` and every object
/// must be saved with a vector; otherwise the server-side
/// `text2vec-transformers` module vectorizes the text properties.
pub fn class_definition(client_vectors: bool) -> ClassDef {
    ClassDef {
        class: CLASS_NAME.to_string(),
        description: "Alcoholic drink".to_string(),
        vectorizer: client_vectors.then(|| "none".to_string()),
        properties: FIELDS.iter().map(|f| Property::text(*f)).collect(),
        module_config: Some(json!({ "text2vec-transformers": {} })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cocktail_text_format() {
        let c = Cocktail {
            name: "Cove".into(),
            ingredients: "rum, lime".into(),
            preparation: "shake".into(),
        };
        assert_eq!(c.cocktail_text(), "Cocktail: Cove\nIngredients: rum, lime\nPreparation: shake");
    }

    #[test]
    fn null_properties_read_as_empty() {
        let c: Cocktail =
            serde_json::from_value(json!({"name": "Cove", "ingredients": null, "preparation": null})).unwrap();
        assert_eq!(c.name, "Cove");
        assert_eq!(c.ingredients, "");
        assert_eq!(c.preparation, "");

        let missing: Cocktail = serde_json::from_value(json!({"name": null})).unwrap();
        assert_eq!(missing, Cocktail::default());
    }

    #[test]
    fn class_has_three_text_properties() {
        let class = class_definition(false);
        assert_eq!(class.class, "Cocktail");
        assert_eq!(class.description, "Alcoholic drink");
        assert!(class.vectorizer.is_none());
        let names: Vec<&str> = class.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, FIELDS);
        assert!(class.properties.iter().all(|p| p.data_type == ["text"]));
    }

    #[test]
    fn client_vectors_disable_vectorizer() {
        assert_eq!(class_definition(true).vectorizer.as_deref(), Some("none"));
    }
}
