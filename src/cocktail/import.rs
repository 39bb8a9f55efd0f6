//! CSV import of cocktail recipes.
//!
//! Expected header (extra columns are ignored):
//!
//! ```text
//! Cocktail Name,Bartender,Bar/Company,Location,Ingredients,Garnish,Glassware,Preparation,Notes
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::Cocktail;
use crate::error::AppError;

/// One CSV row. Only name, ingredients and preparation are stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvCocktail {
    #[serde(rename = "Cocktail Name")]
    pub name: String,
    #[serde(rename = "Bartender", default)]
    pub bartender: String,
    #[serde(rename = "Bar/Company", default)]
    pub company: String,
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Ingredients", default)]
    pub ingredients: String,
    #[serde(rename = "Garnish", default)]
    pub garnish: String,
    #[serde(rename = "Glassware", default)]
    pub glassware: String,
    #[serde(rename = "Preparation", default)]
    pub preparation: String,
    #[serde(rename = "Notes", default)]
    pub notes: String,
}

impl From<CsvCocktail> for Cocktail {
    fn from(c: CsvCocktail) -> Self {
        Cocktail { name: c.name, ingredients: c.ingredients, preparation: c.preparation }
    }
}

/// Parse all rows from `reader`. Rows without a name are skipped.
pub fn read_cocktails<R: Read>(reader: R) -> Result<Vec<CsvCocktail>, AppError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for (i, record) in rdr.deserialize::<CsvCocktail>().enumerate() {
        // +2: header line plus 1-based numbering.
        let row = record.map_err(|e| AppError::Import(format!("row {}: {e}", i + 2)))?;
        if row.name.is_empty() {
            tracing::warn!(row = i + 2, "skipping row without cocktail name");
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Open `path` and parse it. A missing file is an error.
pub fn load_csv(path: &Path) -> Result<Vec<CsvCocktail>, AppError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::Import(format!("cannot open {}: {e}", path.display())))?;
    read_cocktails(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Cocktail Name,Bartender,Bar/Company,Location,Ingredients,Garnish,Glassware,Preparation,Notes
Cove,Jane,Bar X,Warsaw,\"1.5 oz rum, 0.75 oz lime\",Lime wheel,Coupe,Shake and strain,
,,,,,,,,
Velvet Hammer,,,,\"1 oz vodka, 1 oz cream\",,,Shake,Dessert
";

    #[test]
    fn parses_rows_and_skips_nameless() {
        let rows = read_cocktails(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Cove");
        assert_eq!(rows[0].ingredients, "1.5 oz rum, 0.75 oz lime");
        assert_eq!(rows[0].glassware, "Coupe");
        assert_eq!(rows[1].notes, "Dessert");
    }

    #[test]
    fn converts_to_cocktail() {
        let rows = read_cocktails(SAMPLE.as_bytes()).unwrap();
        let c: Cocktail = rows[0].clone().into();
        assert_eq!(c.name, "Cove");
        assert_eq!(c.preparation, "Shake and strain");
    }

    #[test]
    fn missing_name_column_errors() {
        let bad = "Name,Ingredients\nCove,rum\n";
        let err = read_cocktails(bad.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn load_csv_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        assert_eq!(load_csv(f.path()).unwrap().len(), 2);
    }

    #[test]
    fn load_csv_missing_file_errors() {
        let err = load_csv(Path::new("/nonexistent/cocktails.csv")).unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }
}
