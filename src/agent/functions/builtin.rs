//! Functions implemented in-process.

use serde_json::{Value, json};

use super::{FunctionError, string_arg};
use crate::cocktail::CocktailRepository;
use crate::llm::FunctionSpec;

/// Fixed weather report; there is no weather backend.
const WEATHER_REPORT: &str =
    "{\"temperature_celsius\": 23.5,\"pressure_hpa\": 1013,\"conditions\": \"Partly cloudy\",\"humidity_percent\": 65}";

const COCKTAIL_LIST_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    CurrentWeather,
    CurrentTime,
    CocktailList,
    CocktailRecipe,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [
        Builtin::CurrentWeather,
        Builtin::CurrentTime,
        Builtin::CocktailList,
        Builtin::CocktailRecipe,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::CurrentWeather => "get_current_weather",
            Builtin::CurrentTime => "get_current_time",
            Builtin::CocktailList => "cocktail_list",
            Builtin::CocktailRecipe => "cocktail_recipe",
        }
    }

    pub fn needs_repository(&self) -> bool {
        matches!(self, Builtin::CocktailList | Builtin::CocktailRecipe)
    }

    pub fn spec(&self) -> FunctionSpec {
        let (description, parameters) = match self {
            Builtin::CurrentWeather => (
                "Get the current weather in a given location. Temperature always in celsius.",
                json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "The city and state, e.g. San Francisco, CA"
                        }
                    },
                    "required": ["location"]
                }),
            ),
            Builtin::CurrentTime => (
                "Get the current time. Response is in YYYY-MM-DD hh:mm:ss format",
                json!({ "type": "object", "properties": {} }),
            ),
            Builtin::CocktailList => (
                "Get list of alcohol cocktails by entering user description",
                json!({
                    "type": "object",
                    "properties": {
                        "user_description": { "type": "string", "description": "User description" }
                    }
                }),
            ),
            Builtin::CocktailRecipe => (
                "Get recipe for a cocktail with a user specified name",
                json!({
                    "type": "object",
                    "properties": {
                        "cocktail_name": { "type": "string", "description": "Cocktail name" }
                    }
                }),
            ),
        };
        FunctionSpec { name: self.name().to_string(), description: description.to_string(), parameters }
    }

    pub async fn call(&self, args: &Value, repository: Option<&CocktailRepository>) -> Result<String, FunctionError> {
        match self {
            Builtin::CurrentWeather => {
                string_arg(self.name(), args, "location")?;
                Ok(WEATHER_REPORT.to_string())
            }
            Builtin::CurrentTime => Ok(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
            Builtin::CocktailList => {
                let description = string_arg(self.name(), args, "user_description")?;
                let repo = repository.ok_or(FunctionError::Unavailable(self.name()))?;
                let cocktails = repo.list_by_near_text(description, COCKTAIL_LIST_LIMIT).await?;
                Ok(cocktails
                    .iter()
                    .map(|c| format!("{} ({})\n", c.name, c.ingredients))
                    .collect())
            }
            Builtin::CocktailRecipe => {
                let name = string_arg(self.name(), args, "cocktail_name")?;
                let repo = repository.ok_or(FunctionError::Unavailable(self.name()))?;
                match repo.get_by_name(name).await? {
                    Some(c) => Ok(format!(
                        "Name: {}\nIngredients: {}\nPreparation: {}\n",
                        c.name, c.ingredients, c.preparation
                    )),
                    None => Ok(format!("No recipe found for cocktail \"{name}\".")),
                }
            }
        }
    }
}
