//! Instruction prompt for card extraction

use kartei_domain::FieldSchema;

const ROLE: &str = "Du bist ein Experte für die Digitalisierung historischer Archivkarteikarten.";

const RULES: &str = "**WICHTIGE REGELN:**
1. Extrahiere EXAKT was auf der Karte steht, ohne zu interpretieren
2. Komponisten-Namen haben oft das Format \"Nachname, Vorname\" (z.B. \"Zimmermann, Rolf\")
3. Signaturen haben folgende Formate:
   - Spez.XX.XXX (z.B. Spez.12.433)
   - TOB XXXX, RTSO XXXX, RTOB XXXX
4. Wenn ein Feld leer ist, gib einen leeren String \"\" zurück
5. Beachte die Labels auf der Karte";

const OUTPUT_FORMAT: &str =
    "**AUSGABEFORMAT:**\nAntworte NUR mit einem validen JSON-Objekt (KEINE Markdown-Codeblöcke):";

/// Builds the fixed instruction text sent with every card image
pub struct PromptBuilder<'a> {
    schema: &'a FieldSchema,
    collection_name: Option<String>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder for a schema
    pub fn new(schema: &'a FieldSchema) -> Self {
        Self {
            schema,
            collection_name: None,
        }
    }

    /// Name the archive the cards come from
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(ROLE);
        prompt.push_str("\n\n");

        match &self.collection_name {
            Some(name) => prompt.push_str(&format!(
                "Analysiere diese Karteikarte aus dem {} und extrahiere ALLE vorhandenen Informationen in folgende Felder:\n\n",
                name
            )),
            None => prompt.push_str(
                "Analysiere diese Karteikarte und extrahiere ALLE vorhandenen Informationen in folgende Felder:\n\n",
            ),
        }

        prompt.push_str(RULES);
        prompt.push_str("\n\n**FELDER:**\n");
        for spec in self.schema.specs() {
            match &spec.hint {
                Some(hint) => prompt.push_str(&format!("- {}: {}\n", spec.name, hint)),
                None => prompt.push_str(&format!("- {}\n", spec.name)),
            }
        }

        prompt.push('\n');
        prompt.push_str(OUTPUT_FORMAT);
        prompt.push_str("\n\n");
        prompt.push_str(&self.json_template());
        prompt.push('\n');

        prompt
    }

    /// JSON object listing exactly the configured keys
    fn json_template(&self) -> String {
        let lines: Vec<String> = self
            .schema
            .names()
            .map(|name| format!("  \"{}\": \"...\"", name))
            .collect();
        format!("{{\n{}\n}}", lines.join(",\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_every_field() {
        let schema = FieldSchema::default();
        let prompt = PromptBuilder::new(&schema).build();

        for name in schema.names() {
            assert!(prompt.contains(&format!("\"{}\": \"...\"", name)), "missing {}", name);
        }
        assert!(prompt.contains("- Komponist: Name des Komponisten"));
        assert!(prompt.contains("AUSGABEFORMAT"));
    }

    #[test]
    fn test_prompt_with_collection() {
        let schema = FieldSchema::default();
        let prompt = PromptBuilder::new(&schema)
            .with_collection("Musikarchiv Eisenach")
            .build();
        assert!(prompt.contains("Karteikarte aus dem Musikarchiv Eisenach"));
    }

    #[test]
    fn test_template_is_valid_json_shape() {
        let schema = FieldSchema::new(["A", "B"], ["A", "B"]).unwrap();
        let template = PromptBuilder::new(&schema).json_template();
        let parsed: serde_json::Value = serde_json::from_str(&template).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_field_without_hint() {
        let schema = FieldSchema::new(["Titel", "Verlag"], ["Titel", "Verlag"]).unwrap();
        let prompt = PromptBuilder::new(&schema).build();
        assert!(prompt.contains("- Titel\n"));
    }
}
