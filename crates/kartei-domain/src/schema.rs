//! Record schema - the fixed set of named text fields extracted per card

use crate::record::FieldMap;
use std::collections::HashSet;
use std::fmt;

/// Column holding the card's filename identity in every tabular output
pub const FILENAME_COLUMN: &str = "Datei";

/// Column holding the card's batch identity in every tabular output
pub const BATCH_COLUMN: &str = "Batch";

/// One configured field with an optional hint for the extraction prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, used verbatim as JSON key and column header
    pub name: String,

    /// Short description of what the field holds on the card
    pub hint: Option<String>,
}

/// Errors raised when a schema is constructed from invalid parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// No fields configured
    Empty,
    /// A field name is blank
    BlankName,
    /// A field name appears twice
    Duplicate(String),
    /// A field name collides with an identity column
    ReservedName(String),
    /// A priority field is not part of the field list
    UnknownPriority(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::Empty => write!(f, "schema has no fields"),
            SchemaError::BlankName => write!(f, "schema contains a blank field name"),
            SchemaError::Duplicate(name) => write!(f, "field '{}' is listed twice", name),
            SchemaError::ReservedName(name) => {
                write!(f, "field '{}' collides with an identity column", name)
            }
            SchemaError::UnknownPriority(name) => {
                write!(f, "priority field '{}' is not part of the schema", name)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// The validated, ordered list of fields every card record carries
///
/// A schema always has at least one field, no duplicates, no collision with
/// the identity columns, and exactly two priority fields drawn from its own
/// field list. Priority fields lead the tabular output right after the
/// identity columns.
///
/// # Examples
///
/// ```
/// use kartei_domain::FieldSchema;
///
/// let schema = FieldSchema::new(["Titel", "Signatur", "Komponist"], ["Signatur", "Komponist"]).unwrap();
/// assert_eq!(
///     schema.column_order(),
///     vec!["Datei", "Batch", "Signatur", "Komponist", "Titel"]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
    priority: [String; 2],
}

impl FieldSchema {
    /// Build a schema from field names and the two priority fields
    pub fn new<I, S>(fields: I, priority: [&str; 2]) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let specs = fields
            .into_iter()
            .map(|name| FieldSpec {
                name: name.into(),
                hint: None,
            })
            .collect();
        Self::from_specs(specs, priority)
    }

    /// Build a schema from field specs (names plus prompt hints)
    pub fn from_specs(fields: Vec<FieldSpec>, priority: [&str; 2]) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::new();
        for spec in &fields {
            let name = spec.name.trim();
            if name.is_empty() {
                return Err(SchemaError::BlankName);
            }
            if name == FILENAME_COLUMN || name == BATCH_COLUMN {
                return Err(SchemaError::ReservedName(name.to_string()));
            }
            if !seen.insert(name.to_string()) {
                return Err(SchemaError::Duplicate(name.to_string()));
            }
        }

        for p in priority {
            if !seen.contains(p) {
                return Err(SchemaError::UnknownPriority(p.to_string()));
            }
        }
        if priority[0] == priority[1] {
            return Err(SchemaError::Duplicate(priority[0].to_string()));
        }

        let fields = fields
            .into_iter()
            .map(|spec| FieldSpec {
                name: spec.name.trim().to_string(),
                hint: spec.hint,
            })
            .collect();

        Ok(Self {
            fields,
            priority: [priority[0].to_string(), priority[1].to_string()],
        })
    }

    /// Field names in configured order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Field specs in configured order
    pub fn specs(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Number of configured fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; a schema is never empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The two priority fields
    pub fn priority(&self) -> [&str; 2] {
        [self.priority[0].as_str(), self.priority[1].as_str()]
    }

    /// Whether a field name belongs to the schema
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Tabular column order: identity, priority fields, remaining fields
    pub fn column_order(&self) -> Vec<&str> {
        let [first, second] = self.priority();
        let mut columns = vec![FILENAME_COLUMN, BATCH_COLUMN, first, second];
        columns.extend(self.names().filter(|name| *name != first && *name != second));
        columns
    }

    /// Build a complete field map, asking `value_of` for each configured field
    ///
    /// Fields for which `value_of` returns `None` are filled with an empty
    /// string, so the resulting map always carries every configured field.
    pub fn field_map<F>(&self, mut value_of: F) -> FieldMap
    where
        F: FnMut(&str) -> Option<String>,
    {
        let entries = self
            .fields
            .iter()
            .map(|spec| {
                let value = value_of(&spec.name).unwrap_or_default();
                (spec.name.clone(), value)
            })
            .collect();
        FieldMap::from_entries(entries)
    }

    /// A field map with every field empty
    pub fn empty_map(&self) -> FieldMap {
        self.field_map(|_| None)
    }
}

impl Default for FieldSchema {
    /// The nine fields of the Lippmann-Rau music archive cards
    fn default() -> Self {
        let fields = [
            ("Komponist", "Name des Komponisten"),
            ("Signatur", "Archiv-Signatur"),
            ("Titel", "Titel des Musikstücks"),
            ("Textanfang", "Anfang des Liedtexts"),
            ("Verlag", "Verlagsangabe"),
            ("Material", "Art des Materials"),
            ("Textdichter", "Name des Textdichters"),
            ("Bearbeiter", "Name des Bearbeiters"),
            ("Bemerkungen", "Zusätzliche Bemerkungen"),
        ]
        .into_iter()
        .map(|(name, hint)| FieldSpec {
            name: name.to_string(),
            hint: Some(hint.to_string()),
        })
        .collect();

        Self {
            fields,
            priority: ["Signatur".to_string(), "Komponist".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_column_order() {
        let schema = FieldSchema::default();
        assert_eq!(schema.len(), 9);
        assert_eq!(
            schema.column_order(),
            vec![
                "Datei",
                "Batch",
                "Signatur",
                "Komponist",
                "Titel",
                "Textanfang",
                "Verlag",
                "Material",
                "Textdichter",
                "Bearbeiter",
                "Bemerkungen",
            ]
        );
    }

    #[test]
    fn test_rejects_empty_schema() {
        let fields: Vec<String> = Vec::new();
        assert_eq!(FieldSchema::new(fields, ["a", "b"]), Err(SchemaError::Empty));
    }

    #[test]
    fn test_rejects_duplicates_and_reserved_names() {
        assert_eq!(
            FieldSchema::new(["Titel", "Titel"], ["Titel", "Titel"]),
            Err(SchemaError::Duplicate("Titel".to_string()))
        );
        assert_eq!(
            FieldSchema::new(["Datei", "Titel"], ["Titel", "Datei"]),
            Err(SchemaError::ReservedName("Datei".to_string()))
        );
        assert_eq!(
            FieldSchema::new(["  ", "Titel"], ["Titel", "Titel"]),
            Err(SchemaError::BlankName)
        );
    }

    #[test]
    fn test_rejects_unknown_priority() {
        let result = FieldSchema::new(["Titel", "Verlag"], ["Titel", "Signatur"]);
        assert_eq!(result, Err(SchemaError::UnknownPriority("Signatur".to_string())));
    }

    #[test]
    fn test_field_map_fills_missing_with_empty() {
        let schema = FieldSchema::new(["A", "B", "C"], ["A", "B"]).unwrap();
        let map = schema.field_map(|name| (name == "B").then(|| "x".to_string()));

        assert_eq!(map.len(), 3);
        assert_eq!(map.get("A"), Some(""));
        assert_eq!(map.get("B"), Some("x"));
        assert_eq!(map.get("C"), Some(""));
    }
}
