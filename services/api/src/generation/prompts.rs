//! services/api/src/generation/prompts.rs
//!
//! Prompt construction per activity type and language. Spanish-first phrasing
//! when the target language is `es`; every prompt mandates a strict JSON wire
//! format so the response can be parsed into the typed item schemas.

use studium_core::domain::{ActivityType, GenerationRequest, Language};

/// Build the provider prompt for a generation request.
/// `count` is the already-clamped item count.
pub fn build_prompt(req: &GenerationRequest, count: usize) -> String {
    let mut prompt = match (req.activity_type, req.language) {
        (ActivityType::Flashcard, Language::Es) => flashcards_es(&req.text, count),
        (ActivityType::Flashcard, Language::En) => flashcards_en(&req.text, count),
        (ActivityType::MultipleChoice, Language::Es) => multiple_choice_es(&req.text, count),
        (ActivityType::MultipleChoice, Language::En) => multiple_choice_en(&req.text, count),
        (ActivityType::TrueFalse, Language::Es) => true_false_es(&req.text, count),
        (ActivityType::TrueFalse, Language::En) => true_false_en(&req.text, count),
        (ActivityType::Summary, Language::Es) => summary_es(&req.text),
        (ActivityType::Summary, Language::En) => summary_en(&req.text),
        (ActivityType::Mixed, Language::Es) => mixed_es(&req.text),
        (ActivityType::Mixed, Language::En) => mixed_en(&req.text),
    };

    if let Some(difficulty) = &req.difficulty {
        match req.language {
            Language::Es => prompt.push_str(&format!("\n- Nivel de dificultad preferido: {difficulty}")),
            Language::En => prompt.push_str(&format!("\n- Preferred difficulty level: {difficulty}")),
        }
    }
    if let Some(topic) = &req.topic {
        match req.language {
            Language::Es => prompt.push_str(&format!("\n- Enfócate especialmente en: {topic}")),
            Language::En => prompt.push_str(&format!("\n- Focus especially on: {topic}")),
        }
    }

    prompt
}

fn flashcards_es(text: &str, count: usize) -> String {
    format!(
        r#"
Crea {count} tarjetas de estudio (flashcards) educativas a partir del siguiente material de estudio.
Genera preguntas diversas y significativas que evalúen conceptos clave y datos importantes.
Usa un español claro y educativo, apropiado para estudiantes universitarios.

Material de estudio:
{text}

Devuelve la respuesta como JSON en este formato exacto:
{{
    "tarjetas": [
        {{
            "pregunta": "Pregunta clara y específica",
            "respuesta": "Respuesta completa pero concisa",
            "dificultad": "fácil|medio|difícil"
        }}
    ]
}}

Requisitos:
- Enfócate en los conceptos más importantes
- Las preguntas deben ser claras e inequívocas
- Las respuestas deben ser completas pero concisas
- Varía los niveles de dificultad
- Asegúrate de que las preguntas evalúen comprensión, no solo memorización
- Usa terminología académica apropiada en español
"#
    )
}

fn flashcards_en(text: &str, count: usize) -> String {
    format!(
        r#"
Create {count} educational flashcards from the following study material.
Generate diverse, meaningful questions that test key concepts and facts.

Study Material:
{text}

Return the response as JSON in this exact format:
{{
    "tarjetas": [
        {{
            "pregunta": "Clear, specific question",
            "respuesta": "Comprehensive answer",
            "dificultad": "easy|medium|hard"
        }}
    ]
}}

Requirements:
- Focus on the most important concepts
- Questions should be clear and unambiguous
- Answers should be complete but concise
- Vary difficulty levels
- Ensure questions test understanding, not just memorization
"#
    )
}

fn multiple_choice_es(text: &str, count: usize) -> String {
    format!(
        r#"
Crea {count} preguntas de opción múltiple a partir del siguiente material de estudio.
Genera preguntas desafiantes con 4 opciones de respuesta cada una.
Usa un español académico claro y apropiado para estudiantes universitarios.

Material de estudio:
{text}

Devuelve la respuesta como JSON en este formato exacto:
{{
    "preguntas": [
        {{
            "pregunta": "Texto de la pregunta aquí",
            "opciones": ["Opción A", "Opción B", "Opción C", "Opción D"],
            "respuesta_correcta": 0,
            "explicacion": "Breve explicación de por qué esta respuesta es correcta"
        }}
    ]
}}

Requisitos:
- Haz preguntas que evalúen comprensión conceptual
- Incluye distractores plausibles como respuestas incorrectas
- respuesta_correcta debe ser el índice (0-3) de la opción correcta
- Asegúrate de que las explicaciones sean educativas y breves
- Varía los tipos de pregunta (factual, conceptual, aplicación)
- Usa terminología académica apropiada en español
"#
    )
}

fn multiple_choice_en(text: &str, count: usize) -> String {
    format!(
        r#"
Create {count} multiple choice questions from the following study material.
Generate challenging questions with 4 answer options each.

Study Material:
{text}

Return the response as JSON in this exact format:
{{
    "preguntas": [
        {{
            "pregunta": "Question text here",
            "opciones": ["Option A", "Option B", "Option C", "Option D"],
            "respuesta_correcta": 0,
            "explicacion": "Brief explanation of why this answer is correct"
        }}
    ]
}}

Requirements:
- Make questions test conceptual understanding
- Include plausible distractors as wrong answers
- respuesta_correcta should be the index (0-3) of the correct option
- Ensure explanations are educational and brief
- Vary question types (factual, conceptual, application)
"#
    )
}

fn true_false_es(text: &str, count: usize) -> String {
    format!(
        r#"
Crea {count} preguntas de verdadero/falso a partir del siguiente material de estudio.
Genera afirmaciones que evalúen conceptos clave y datos importantes.
Usa un español académico claro y apropiado para estudiantes universitarios.

Material de estudio:
{text}

Devuelve la respuesta como JSON en este formato exacto:
{{
    "preguntas": [
        {{
            "afirmacion": "Una afirmación clara que pueda evaluarse como verdadera o falsa",
            "respuesta_correcta": true,
            "explicacion": "Breve explicación de por qué esta afirmación es verdadera/falsa"
        }}
    ]
}}

Requisitos:
- Crea afirmaciones que sean definitivamente verdaderas o falsas
- Evita afirmaciones ambiguas o capciosas
- Mezcla afirmaciones tanto verdaderas como falsas
- Enfócate en conceptos importantes del material
- Incluye breves explicaciones para el aprendizaje
- Usa terminología académica apropiada en español
"#
    )
}

fn true_false_en(text: &str, count: usize) -> String {
    format!(
        r#"
Create {count} true/false questions from the following study material.
Generate statements that test key concepts and facts.

Study Material:
{text}

Return the response as JSON in this exact format:
{{
    "preguntas": [
        {{
            "afirmacion": "A clear statement that can be evaluated as true or false",
            "respuesta_correcta": true,
            "explicacion": "Brief explanation of why this statement is true/false"
        }}
    ]
}}

Requirements:
- Create statements that are definitively true or false
- Avoid ambiguous or trick statements
- Mix both true and false statements
- Focus on important concepts from the material
- Include brief explanations for learning
"#
    )
}

fn summary_es(text: &str) -> String {
    format!(
        r#"
Crea un resumen completo del siguiente material de estudio.
Enfócate en los conceptos principales, puntos clave y detalles importantes.
Usa un español académico claro y apropiado para estudiantes universitarios.

Material de estudio:
{text}

Devuelve la respuesta como JSON en este formato exacto:
{{
    "titulo": "Título descriptivo para el contenido",
    "contenido": "Párrafo de resumen completo que cubra las ideas principales",
    "puntos_clave": ["Punto clave 1", "Punto clave 2", "Punto clave 3", "Punto clave 4", "Punto clave 5"]
}}

Requisitos:
- El título debe ser descriptivo y específico
- El contenido debe ser un párrafo bien estructurado que resuma las ideas principales
- Incluye 5-7 puntos clave que capturen la información más importante
- Enfócate en la comprensión más que en la memorización
- Usa lenguaje educativo claro
- Usa terminología académica apropiada en español
"#
    )
}

fn summary_en(text: &str) -> String {
    format!(
        r#"
Create a comprehensive summary of the following study material.
Focus on the main concepts, key points, and important details.

Study Material:
{text}

Return the response as JSON in this exact format:
{{
    "titulo": "Descriptive title for the content",
    "contenido": "Comprehensive summary paragraph covering main concepts",
    "puntos_clave": ["Key point 1", "Key point 2", "Key point 3", "Key point 4", "Key point 5"]
}}

Requirements:
- Title should be descriptive and specific
- Content should be a well-structured paragraph summarizing main ideas
- Include 5-7 key points that capture the most important information
- Focus on understanding rather than memorization
- Use clear, educational language
"#
    )
}

fn mixed_es(text: &str) -> String {
    format!(
        r#"
Crea actividades de estudio mixtas a partir del siguiente material:
- 3 tarjetas de memoria (flashcards)
- 2 preguntas de opción múltiple
- 2 preguntas de verdadero/falso

Usa un español académico claro y apropiado para estudiantes universitarios.

Material de estudio:
{text}

Devuelve la respuesta como JSON en este formato exacto:
{{
    "tarjetas": [
        {{
            "pregunta": "Pregunta para la tarjeta",
            "respuesta": "Respuesta detallada",
            "dificultad": "facil|medio|dificil"
        }}
    ],
    "opcion_multiple": [
        {{
            "pregunta": "Pregunta de opción múltiple",
            "opciones": ["Opción A", "Opción B", "Opción C", "Opción D"],
            "respuesta_correcta": 0,
            "explicacion": "Explicación breve de la respuesta correcta"
        }}
    ],
    "verdadero_falso": [
        {{
            "afirmacion": "Afirmación que puede evaluarse como verdadera o falsa",
            "respuesta_correcta": true,
            "explicacion": "Explicación de por qué es verdadera/falsa"
        }}
    ]
}}

Requisitos:
- Enfócate en conceptos clave del material
- Varía la dificultad de las preguntas
- Asegúrate de que las respuestas sean educativas
- Usa terminología académica apropiada en español
"#
    )
}

fn mixed_en(text: &str) -> String {
    format!(
        r#"
Create mixed study activities from the following material:
- 3 flashcards
- 2 multiple choice questions
- 2 true/false questions

Study Material:
{text}

Return the response as JSON in this exact format:
{{
    "tarjetas": [
        {{
            "pregunta": "Question for the card",
            "respuesta": "Detailed answer",
            "dificultad": "easy|medium|hard"
        }}
    ],
    "opcion_multiple": [
        {{
            "pregunta": "Multiple choice question",
            "opciones": ["Option A", "Option B", "Option C", "Option D"],
            "respuesta_correcta": 0,
            "explicacion": "Brief explanation of correct answer"
        }}
    ],
    "verdadero_falso": [
        {{
            "afirmacion": "Statement that can be evaluated as true or false",
            "respuesta_correcta": true,
            "explicacion": "Explanation of why it's true/false"
        }}
    ]
}}

Requirements:
- Focus on key concepts from the material
- Vary question difficulty
- Ensure answers are educational
- Use clear academic language
"#
    )
}
