//! services/api/src/generation/parse.rs
//!
//! Parses raw provider output into the typed item schemas and validates it.
//! Any malformed structure, missing field or out-of-range value is a
//! `ProviderError::Parse`, which the generation service treats exactly like a
//! transport failure: record the attempt and move to the next provider.

use serde::Deserialize;

use studium_core::domain::{
    ActivityType, Flashcard, GeneratedItems, MixedActivity, MultipleChoiceQuestion, Summary,
    TrueFalseQuestion,
};
use studium_core::ports::ProviderError;

//=========================================================================================
// Wire Types (Spanish JSON keys, shared by both providers)
//=========================================================================================

fn default_dificultad() -> String {
    "medio".to_string()
}

#[derive(Deserialize)]
struct WireFlashcard {
    pregunta: String,
    respuesta: String,
    #[serde(default = "default_dificultad")]
    dificultad: String,
}

#[derive(Deserialize)]
struct WireFlashcardList {
    tarjetas: Vec<WireFlashcard>,
}

#[derive(Deserialize)]
struct WireMultipleChoice {
    pregunta: String,
    opciones: Vec<String>,
    respuesta_correcta: usize,
    #[serde(default)]
    explicacion: String,
}

#[derive(Deserialize)]
struct WireMultipleChoiceList {
    preguntas: Vec<WireMultipleChoice>,
}

#[derive(Deserialize)]
struct WireTrueFalse {
    afirmacion: String,
    respuesta_correcta: bool,
    #[serde(default)]
    explicacion: String,
}

#[derive(Deserialize)]
struct WireTrueFalseList {
    preguntas: Vec<WireTrueFalse>,
}

#[derive(Deserialize)]
struct WireSummary {
    titulo: String,
    contenido: String,
    puntos_clave: Vec<String>,
}

#[derive(Deserialize)]
struct WireMixed {
    #[serde(default)]
    tarjetas: Vec<WireFlashcard>,
    #[serde(default)]
    opcion_multiple: Vec<WireMultipleChoice>,
    #[serde(default)]
    verdadero_falso: Vec<WireTrueFalse>,
}

//=========================================================================================
// Parsing and Validation
//=========================================================================================

/// Parse a raw provider response into validated items, truncated to `count`.
pub fn parse_items(
    raw: &str,
    activity_type: ActivityType,
    count: usize,
) -> Result<GeneratedItems, ProviderError> {
    let json = extract_json(raw)?;

    let items = match activity_type {
        ActivityType::Flashcard => {
            let list: WireFlashcardList = deserialize(json)?;
            let cards = list
                .tarjetas
                .into_iter()
                .take(count)
                .map(flashcard_from_wire)
                .collect::<Result<Vec<_>, _>>()?;
            GeneratedItems::Flashcards(cards)
        }
        ActivityType::MultipleChoice => {
            let list: WireMultipleChoiceList = deserialize(json)?;
            let questions = list
                .preguntas
                .into_iter()
                .take(count)
                .map(multiple_choice_from_wire)
                .collect::<Result<Vec<_>, _>>()?;
            GeneratedItems::MultipleChoice(questions)
        }
        ActivityType::TrueFalse => {
            let list: WireTrueFalseList = deserialize(json)?;
            let questions = list
                .preguntas
                .into_iter()
                .take(count)
                .map(true_false_from_wire)
                .collect::<Result<Vec<_>, _>>()?;
            GeneratedItems::TrueFalse(questions)
        }
        ActivityType::Summary => {
            let wire: WireSummary = deserialize(json)?;
            GeneratedItems::Summaries(vec![summary_from_wire(wire)?])
        }
        ActivityType::Mixed => {
            let wire: WireMixed = deserialize(json)?;
            let mut activities = Vec::new();
            for card in wire.tarjetas {
                activities.push(MixedActivity::Flashcard(flashcard_from_wire(card)?));
            }
            for question in wire.opcion_multiple {
                activities.push(MixedActivity::MultipleChoice(multiple_choice_from_wire(
                    question,
                )?));
            }
            for question in wire.verdadero_falso {
                activities.push(MixedActivity::TrueFalse(true_false_from_wire(question)?));
            }
            GeneratedItems::Mixed(activities)
        }
    };

    if items.is_empty() {
        return Err(ProviderError::Parse(
            "provider returned no items".to_string(),
        ));
    }
    Ok(items)
}

/// Locate the JSON payload inside a raw model response.
///
/// Providers are instructed to answer with bare JSON, but models habitually
/// wrap it in Markdown code fences or lead with prose; take the fenced block
/// when present, otherwise the outermost braces.
pub(crate) fn extract_json(raw: &str) -> Result<&str, ProviderError> {
    let trimmed = raw.trim();

    if let Some(fence_start) = trimmed.find("```") {
        let after_fence = &trimmed[fence_start + 3..];
        let body = after_fence.strip_prefix("json").unwrap_or(after_fence);
        if let Some(fence_end) = body.find("```") {
            return Ok(body[..fence_end].trim());
        }
    }

    let start = trimmed
        .find('{')
        .ok_or_else(|| ProviderError::Parse("no JSON object in response".to_string()))?;
    let end = trimmed
        .rfind('}')
        .ok_or_else(|| ProviderError::Parse("unterminated JSON object in response".to_string()))?;
    if end < start {
        return Err(ProviderError::Parse(
            "malformed JSON object in response".to_string(),
        ));
    }
    Ok(&trimmed[start..=end])
}

fn deserialize<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T, ProviderError> {
    serde_json::from_str(json).map_err(|e| ProviderError::Parse(e.to_string()))
}

fn require_non_empty(value: String, field: &str) -> Result<String, ProviderError> {
    if value.trim().is_empty() {
        Err(ProviderError::Parse(format!("empty required field: {field}")))
    } else {
        Ok(value)
    }
}

fn flashcard_from_wire(wire: WireFlashcard) -> Result<Flashcard, ProviderError> {
    Ok(Flashcard {
        question: require_non_empty(wire.pregunta, "pregunta")?,
        answer: require_non_empty(wire.respuesta, "respuesta")?,
        difficulty: wire.dificultad,
    })
}

fn multiple_choice_from_wire(
    wire: WireMultipleChoice,
) -> Result<MultipleChoiceQuestion, ProviderError> {
    if !(2..=4).contains(&wire.opciones.len()) {
        return Err(ProviderError::Parse(format!(
            "multiple choice question has {} options, expected 2 to 4",
            wire.opciones.len()
        )));
    }
    if wire.respuesta_correcta >= wire.opciones.len() {
        return Err(ProviderError::Parse(format!(
            "respuesta_correcta index {} is out of range for {} options",
            wire.respuesta_correcta,
            wire.opciones.len()
        )));
    }
    Ok(MultipleChoiceQuestion {
        question: require_non_empty(wire.pregunta, "pregunta")?,
        options: wire.opciones,
        correct_answer: wire.respuesta_correcta,
        explanation: wire.explicacion,
    })
}

fn true_false_from_wire(wire: WireTrueFalse) -> Result<TrueFalseQuestion, ProviderError> {
    Ok(TrueFalseQuestion {
        statement: require_non_empty(wire.afirmacion, "afirmacion")?,
        correct_answer: wire.respuesta_correcta,
        explanation: wire.explicacion,
    })
}

fn summary_from_wire(wire: WireSummary) -> Result<Summary, ProviderError> {
    Ok(Summary {
        title: require_non_empty(wire.titulo, "titulo")?,
        content: require_non_empty(wire.contenido, "contenido")?,
        key_points: wire.puntos_clave,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLASHCARDS: &str = r#"{
        "tarjetas": [
            {"pregunta": "¿Qué es la mitosis?", "respuesta": "La división celular.", "dificultad": "fácil"},
            {"pregunta": "¿Qué produce la mitocondria?", "respuesta": "ATP."},
            {"pregunta": "¿Qué es el núcleo?", "respuesta": "El centro de control de la célula.", "dificultad": "medio"}
        ]
    }"#;

    #[test]
    fn parses_flashcards_and_applies_default_difficulty() {
        let items = parse_items(FLASHCARDS, ActivityType::Flashcard, 5).unwrap();
        let GeneratedItems::Flashcards(cards) = items else {
            panic!("wrong variant")
        };
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[1].difficulty, "medio");
    }

    #[test]
    fn over_delivery_is_truncated_to_requested_count() {
        let items = parse_items(FLASHCARDS, ActivityType::Flashcard, 2).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = format!("Claro, aquí tienes:\n```json\n{FLASHCARDS}\n```\n¡Éxito!");
        let items = parse_items(&raw, ActivityType::Flashcard, 5).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn prose_around_bare_json_is_stripped() {
        let raw = format!("Here is the JSON you asked for: {FLASHCARDS} hope it helps");
        assert!(parse_items(&raw, ActivityType::Flashcard, 5).is_ok());
    }

    #[test]
    fn missing_correct_index_is_a_parse_failure() {
        let raw = r#"{"preguntas": [{"pregunta": "¿2+2?", "opciones": ["3", "4"]}]}"#;
        let err = parse_items(raw, ActivityType::MultipleChoice, 5).unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[test]
    fn out_of_range_correct_index_is_rejected() {
        let raw = r#"{"preguntas": [
            {"pregunta": "¿2+2?", "opciones": ["3", "4"], "respuesta_correcta": 2}
        ]}"#;
        let err = parse_items(raw, ActivityType::MultipleChoice, 5).unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[test]
    fn wrong_option_count_is_rejected() {
        let raw = r#"{"preguntas": [
            {"pregunta": "¿Color del cielo?", "opciones": ["azul"], "respuesta_correcta": 0}
        ]}"#;
        assert!(parse_items(raw, ActivityType::MultipleChoice, 5).is_err());
    }

    #[test]
    fn true_false_parses() {
        let raw = r#"{"preguntas": [
            {"afirmacion": "El sol es una estrella.", "respuesta_correcta": true, "explicacion": "Es una estrella de tipo G."}
        ]}"#;
        let items = parse_items(raw, ActivityType::TrueFalse, 5).unwrap();
        let GeneratedItems::TrueFalse(questions) = items else {
            panic!("wrong variant")
        };
        assert!(questions[0].correct_answer);
    }

    #[test]
    fn summary_parses_as_single_item() {
        let raw = r#"{
            "titulo": "La célula",
            "contenido": "La célula es la unidad estructural de los seres vivos.",
            "puntos_clave": ["Unidad básica", "Contiene organelos"]
        }"#;
        let items = parse_items(raw, ActivityType::Summary, 1).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn mixed_batch_parses_all_sections() {
        let raw = r#"{
            "tarjetas": [{"pregunta": "p", "respuesta": "r"}],
            "opcion_multiple": [{"pregunta": "q", "opciones": ["a","b","c","d"], "respuesta_correcta": 3}],
            "verdadero_falso": [{"afirmacion": "s", "respuesta_correcta": false}]
        }"#;
        let items = parse_items(raw, ActivityType::Mixed, 10).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn empty_item_list_is_a_parse_failure() {
        let raw = r#"{"tarjetas": []}"#;
        assert!(parse_items(raw, ActivityType::Flashcard, 5).is_err());
    }

    #[test]
    fn non_json_response_is_a_parse_failure() {
        assert!(parse_items("Lo siento, no puedo ayudar con eso.", ActivityType::Flashcard, 5).is_err());
    }

    #[test]
    fn empty_question_text_is_rejected() {
        let raw = r#"{"tarjetas": [{"pregunta": "  ", "respuesta": "r"}]}"#;
        assert!(parse_items(raw, ActivityType::Flashcard, 5).is_err());
    }
}
