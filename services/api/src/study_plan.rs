//! services/api/src/study_plan.rs
//!
//! Study-plan generation: turns a processed document plus an exam date into a
//! day-by-day plan with topics, recommendations, timeline and statistics.
//!
//! The plan itself comes from the unified failover path; when every provider
//! fails, a deterministic fallback plan is derived from the document's
//! paragraph structure so the student still gets something usable.

use std::collections::HashMap;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use studium_core::domain::{Language, ProviderKind};

use crate::generation::{parse, UnifiedGenerator};

/// Content handed to the model is capped to keep prompts inside input limits.
const PLAN_CONTENT_CHAR_LIMIT: usize = 8000;
const PLAN_MAX_TOKENS: u32 = 4000;
const FALLBACK_MAX_TOPICS: usize = 10;
const FALLBACK_MAX_DAYS: i64 = 14;
const URGENT_THRESHOLD_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum StudyPlanError {
    #[error("invalid exam date '{0}', expected YYYY-MM-DD")]
    InvalidExamDate(String),
    #[error("study plan not found")]
    NotFound,
}

//=========================================================================================
// Plan Data Model
//=========================================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StudyTopic {
    pub name: String,
    pub importance: u8,
    pub difficulty: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyStudyPlan {
    pub day: u32,
    pub date: String,
    pub topics: Vec<String>,
    pub actions: Vec<String>,
    pub estimated_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub day: u32,
    pub date: String,
    pub hours: f64,
    pub topics_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekBreakdown {
    pub week: usize,
    pub days: Vec<DaySummary>,
    pub total_hours: f64,
    pub topics_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineData {
    pub total_days: usize,
    pub days_remaining: i64,
    pub study_intensity: String,
    pub weekly_breakdown: Vec<WeekBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyStatistics {
    pub total_topics: usize,
    pub estimated_total_hours: f64,
    pub daily_average_hours: f64,
    pub hardest_topics_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyPlan {
    pub plan_id: String,
    pub subject_name: String,
    pub exam_date: String,
    pub created_at: String,
    pub status: String,
    pub main_topics: Vec<StudyTopic>,
    pub hardest_topics: Vec<StudyTopic>,
    pub daily_plan: Vec<DailyStudyPlan>,
    pub timeline: TimelineData,
    pub statistics: StudyStatistics,
    pub general_recommendations: Vec<String>,
    pub study_techniques: Vec<String>,
    pub language: Language,
    pub provider: Option<ProviderKind>,
    pub used_fallback: bool,
}

/// Listing entry returned by the plans index endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StudyPlanSummary {
    pub plan_id: String,
    pub subject_name: String,
    pub exam_date: String,
    pub created_at: String,
    pub status: String,
}

//=========================================================================================
// Wire Types (strict-JSON plan format mandated by the prompt)
//=========================================================================================

#[derive(Deserialize)]
struct WireTopic {
    nombre: String,
    #[serde(default = "default_importance")]
    importancia: u8,
    #[serde(default = "default_difficulty")]
    dificultad: String,
    #[serde(default)]
    descripcion: String,
}

fn default_importance() -> u8 {
    3
}

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Deserialize)]
struct WireDay {
    dia: u32,
    fecha: String,
    #[serde(default)]
    temas: Vec<String>,
    #[serde(default)]
    acciones: Vec<String>,
    #[serde(default)]
    horas_estimadas: f64,
}

#[derive(Deserialize, Default)]
struct WireStatistics {
    total_temas: Option<usize>,
    horas_totales: Option<f64>,
    horas_promedio_dia: Option<f64>,
}

#[derive(Deserialize)]
struct WirePlan {
    #[serde(default)]
    temas_principales: Vec<WireTopic>,
    #[serde(default)]
    temas_dificiles: Vec<WireTopic>,
    #[serde(default)]
    plan_por_dia: Vec<WireDay>,
    #[serde(default)]
    recomendaciones_generales: Vec<String>,
    #[serde(default)]
    tecnicas_estudio: Vec<String>,
    #[serde(default)]
    estadisticas: WireStatistics,
    #[serde(default)]
    estado: Option<String>,
}

//=========================================================================================
// The Service
//=========================================================================================

pub struct StudyPlanService {
    plans: RwLock<HashMap<String, StudyPlan>>,
}

impl Default for StudyPlanService {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyPlanService {
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a study plan for a processed document.
    pub async fn generate_study_plan(
        &self,
        generator: &UnifiedGenerator,
        document_text: &str,
        subject_name: &str,
        exam_date: &str,
        language: Language,
    ) -> Result<StudyPlan, StudyPlanError> {
        let exam = NaiveDate::parse_from_str(exam_date, "%Y-%m-%d")
            .map_err(|_| StudyPlanError::InvalidExamDate(exam_date.to_string()))?;
        let today = Utc::now().date_naive();
        let days_remaining = (exam - today).num_days();

        let plan_id = Uuid::new_v4().to_string();
        let prompt = plan_prompt(document_text, subject_name, exam_date, days_remaining, language);

        let (wire, provider, used_fallback) =
            match generator.invoke_raw(&prompt, PLAN_MAX_TOKENS).await {
                Ok((raw, provider, used_fallback)) => match parse_wire_plan(&raw) {
                    Ok(wire) => (wire, Some(provider), used_fallback),
                    Err(reason) => {
                        tracing::warn!(%reason, "study plan response unparsable, using fallback plan");
                        (fallback_plan(document_text, today, days_remaining), None, true)
                    }
                },
                Err(error) => {
                    tracing::warn!(%error, "all providers failed for study plan, using fallback plan");
                    (fallback_plan(document_text, today, days_remaining), None, true)
                }
            };

        let plan = structure_plan(
            wire,
            plan_id,
            subject_name,
            exam_date,
            days_remaining,
            language,
            provider,
            used_fallback,
        );

        self.plans
            .write()
            .await
            .insert(plan.plan_id.clone(), plan.clone());
        Ok(plan)
    }

    pub async fn get(&self, plan_id: &str) -> Result<StudyPlan, StudyPlanError> {
        self.plans
            .read()
            .await
            .get(plan_id)
            .cloned()
            .ok_or(StudyPlanError::NotFound)
    }

    pub async fn list(&self) -> Vec<StudyPlanSummary> {
        self.plans
            .read()
            .await
            .values()
            .map(|plan| StudyPlanSummary {
                plan_id: plan.plan_id.clone(),
                subject_name: plan.subject_name.clone(),
                exam_date: plan.exam_date.clone(),
                created_at: plan.created_at.clone(),
                status: plan.status.clone(),
            })
            .collect()
    }

    pub async fn delete(&self, plan_id: &str) -> Result<(), StudyPlanError> {
        self.plans
            .write()
            .await
            .remove(plan_id)
            .map(|_| ())
            .ok_or(StudyPlanError::NotFound)
    }
}

//=========================================================================================
// Prompt, Parsing, Structuring
//=========================================================================================

fn plan_prompt(
    document_text: &str,
    subject_name: &str,
    exam_date: &str,
    days_remaining: i64,
    language: Language,
) -> String {
    let today = Utc::now().date_naive().format("%Y-%m-%d");
    let content: String = document_text.chars().take(PLAN_CONTENT_CHAR_LIMIT).collect();

    let intro = match language {
        Language::Es => format!(
            "A partir del siguiente contenido extraído del apunte, generá un plan de estudio \
             personalizado para un estudiante que rinde el examen de {subject_name} el día {exam_date}.\n\n\
             Hoy es {today}. Quedan {days_remaining} días para el examen. El objetivo es ayudarlo a \
             estudiar de forma organizada, progresiva y eficaz, utilizando técnicas activas como \
             flashcards y trivias.\n\nCONTENIDO DEL APUNTE:\n{content}\n\n\
             INSTRUCCIONES:\n\
             1. Detectá y listá los temas principales del contenido ordenados por importancia\n\
             2. Identificá los 3-5 temas más difíciles que necesitan atención extra\n\
             3. Distribuí los temas entre los días disponibles hasta el examen\n\
             4. Para cada día, recomendá técnicas específicas (leer, resumir, flashcards, trivias, repaso)\n\
             5. Estimá horas de estudio por día y por tema\n\
             6. Generá recomendaciones generales y técnicas de estudio\n"
        ),
        Language::En => format!(
            "From the following course material, generate a personalized study plan for a student \
             taking the {subject_name} exam on {exam_date}.\n\n\
             Today is {today}. There are {days_remaining} days until the exam. Help the student \
             study in an organized, progressive and effective way, using active techniques such as \
             flashcards and trivia questions.\n\nCOURSE MATERIAL:\n{content}\n\n\
             INSTRUCTIONS:\n\
             1. Detect and list the main topics, ordered by importance\n\
             2. Identify the 3-5 hardest topics needing extra attention\n\
             3. Distribute the topics across the days available before the exam\n\
             4. For each day, recommend specific techniques (read, summarize, flashcards, trivia, review)\n\
             5. Estimate study hours per day and per topic\n\
             6. Produce general recommendations and study techniques\n"
        ),
    };

    format!(
        r#"{intro}
FORMATO DE RESPUESTA (JSON estricto):
{{
    "temas_principales": [
        {{
            "nombre": "string",
            "importancia": 1,
            "dificultad": "easy|medium|hard",
            "descripcion": "string"
        }}
    ],
    "temas_dificiles": [
        {{
            "nombre": "string",
            "importancia": 5,
            "dificultad": "hard",
            "descripcion": "string"
        }}
    ],
    "plan_por_dia": [
        {{
            "dia": 1,
            "fecha": "YYYY-MM-DD",
            "temas": ["tema1", "tema2"],
            "acciones": ["acción1", "acción2"],
            "horas_estimadas": 2.5
        }}
    ],
    "recomendaciones_generales": ["recomendación1", "recomendación2"],
    "tecnicas_estudio": ["técnica1", "técnica2"],
    "estadisticas": {{
        "total_temas": 10,
        "horas_totales": 25.0,
        "horas_promedio_dia": 2.5
    }},
    "estado": "normal|urgente"
}}

IMPORTANTE: Responde SOLO con el JSON válido, sin texto adicional."#
    )
}

fn parse_wire_plan(raw: &str) -> Result<WirePlan, String> {
    let json = parse::extract_json(raw).map_err(|e| e.to_string())?;
    serde_json::from_str(json).map_err(|e| e.to_string())
}

/// Deterministic plan when no provider delivers: topics from paragraph
/// sections, a flat 2h/day schedule, generic recommendations.
fn fallback_plan(document_text: &str, today: NaiveDate, days_remaining: i64) -> WirePlan {
    let topics: Vec<WireTopic> = document_text
        .split("\n\n")
        .filter(|section| section.trim().len() > 50)
        .take(FALLBACK_MAX_TOPICS)
        .enumerate()
        .map(|(i, section)| {
            let description: String = section.trim().chars().take(100).collect();
            WireTopic {
                nombre: format!("Tema {}", i + 1),
                importancia: 3,
                dificultad: "medium".into(),
                descripcion: description,
            }
        })
        .collect();

    let plan_days = days_remaining.clamp(1, FALLBACK_MAX_DAYS);
    let topics_per_day = (topics.len() / plan_days.max(1) as usize).max(1);

    let daily: Vec<WireDay> = (0..plan_days)
        .map(|day| {
            let date = today + ChronoDuration::days(day);
            let start = day as usize * topics_per_day;
            let end = (start + topics_per_day).min(topics.len());
            let temas = topics
                .get(start..end)
                .unwrap_or(&[])
                .iter()
                .map(|t| t.nombre.clone())
                .collect();
            WireDay {
                dia: day as u32 + 1,
                fecha: date.format("%Y-%m-%d").to_string(),
                temas,
                acciones: vec![
                    "Leer material".into(),
                    "Tomar notas".into(),
                    "Hacer flashcards".into(),
                ],
                horas_estimadas: 2.0,
            }
        })
        .collect();

    let hardest = topics
        .iter()
        .take(3)
        .map(|t| WireTopic {
            nombre: t.nombre.clone(),
            importancia: t.importancia,
            dificultad: t.dificultad.clone(),
            descripcion: t.descripcion.clone(),
        })
        .collect();

    WirePlan {
        estadisticas: WireStatistics {
            total_temas: Some(topics.len()),
            horas_totales: Some(daily.len() as f64 * 2.0),
            horas_promedio_dia: Some(2.0),
        },
        temas_principales: topics,
        temas_dificiles: hardest,
        plan_por_dia: daily,
        recomendaciones_generales: vec![
            "Establece un horario fijo de estudio".into(),
            "Toma descansos regulares".into(),
            "Repasa diariamente".into(),
        ],
        tecnicas_estudio: vec!["Lectura activa".into(), "Flashcards".into(), "Resúmenes".into()],
        estado: Some(if days_remaining <= URGENT_THRESHOLD_DAYS {
            "urgente".into()
        } else {
            "normal".into()
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn structure_plan(
    wire: WirePlan,
    plan_id: String,
    subject_name: &str,
    exam_date: &str,
    days_remaining: i64,
    language: Language,
    provider: Option<ProviderKind>,
    used_fallback: bool,
) -> StudyPlan {
    let main_topics: Vec<StudyTopic> = wire.temas_principales.into_iter().map(topic_from_wire).collect();
    let hardest_topics: Vec<StudyTopic> = wire.temas_dificiles.into_iter().map(topic_from_wire).collect();
    let daily_plan: Vec<DailyStudyPlan> = wire
        .plan_por_dia
        .into_iter()
        .map(|day| DailyStudyPlan {
            day: day.dia,
            date: day.fecha,
            topics: day.temas,
            actions: day.acciones,
            estimated_hours: day.horas_estimadas,
        })
        .collect();

    let timeline = build_timeline(&daily_plan, days_remaining);
    let total_hours: f64 = daily_plan.iter().map(|d| d.estimated_hours).sum();

    let statistics = StudyStatistics {
        total_topics: wire.estadisticas.total_temas.unwrap_or(main_topics.len()),
        estimated_total_hours: wire.estadisticas.horas_totales.unwrap_or(total_hours),
        daily_average_hours: wire
            .estadisticas
            .horas_promedio_dia
            .unwrap_or_else(|| total_hours / daily_plan.len().max(1) as f64),
        hardest_topics_count: hardest_topics.len(),
    };

    let default_status = if days_remaining <= URGENT_THRESHOLD_DAYS {
        "urgente"
    } else {
        "normal"
    };

    StudyPlan {
        plan_id,
        subject_name: subject_name.to_string(),
        exam_date: exam_date.to_string(),
        created_at: Utc::now().to_rfc3339(),
        status: wire.estado.unwrap_or_else(|| default_status.to_string()),
        main_topics,
        hardest_topics,
        daily_plan,
        timeline,
        statistics,
        general_recommendations: wire.recomendaciones_generales,
        study_techniques: wire.tecnicas_estudio,
        language,
        provider,
        used_fallback,
    }
}

fn topic_from_wire(wire: WireTopic) -> StudyTopic {
    StudyTopic {
        name: wire.nombre,
        importance: wire.importancia.clamp(1, 5),
        difficulty: wire.dificultad,
        description: wire.descripcion,
    }
}

fn build_timeline(daily_plan: &[DailyStudyPlan], days_remaining: i64) -> TimelineData {
    let mut weekly_breakdown = Vec::new();
    let mut current_week: Vec<DaySummary> = Vec::new();
    let mut week_hours = 0.0;

    for (idx, day) in daily_plan.iter().enumerate() {
        current_week.push(DaySummary {
            day: day.day,
            date: day.date.clone(),
            hours: day.estimated_hours,
            topics_count: day.topics.len(),
        });
        week_hours += day.estimated_hours;

        if current_week.len() == 7 || idx == daily_plan.len() - 1 {
            let topics_count = current_week.iter().map(|d| d.topics_count).sum();
            weekly_breakdown.push(WeekBreakdown {
                week: weekly_breakdown.len() + 1,
                days: std::mem::take(&mut current_week),
                total_hours: week_hours,
                topics_count,
            });
            week_hours = 0.0;
        }
    }

    let total_hours: f64 = daily_plan.iter().map(|d| d.estimated_hours).sum();
    let avg_daily_hours = total_hours / daily_plan.len().max(1) as f64;
    let study_intensity = if avg_daily_hours >= 4.0 {
        "alta"
    } else if avg_daily_hours >= 2.0 {
        "media"
    } else {
        "baja"
    };

    TimelineData {
        total_days: daily_plan.len(),
        days_remaining,
        study_intensity: study_intensity.to_string(),
        weekly_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{GenerationLimits, ProviderEntry};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use studium_core::ports::{InvokeParams, LlmProvider, ProviderError};

    struct FixedProvider {
        kind: ProviderKind,
        response: Option<&'static str>,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn invoke(
            &self,
            _prompt: &str,
            _params: &InvokeParams,
        ) -> Result<String, ProviderError> {
            match self.response {
                Some(raw) => Ok(raw.to_string()),
                None => Err(ProviderError::Transport("unreachable".into())),
            }
        }
    }

    fn generator_with(response: Option<&'static str>) -> UnifiedGenerator {
        UnifiedGenerator::new(
            vec![ProviderEntry {
                provider: Arc::new(FixedProvider {
                    kind: ProviderKind::Claude,
                    response,
                }),
                params: InvokeParams {
                    max_tokens: 1000,
                    temperature: 0.7,
                },
            }],
            Duration::from_millis(200),
            GenerationLimits {
                max_flashcards: 10,
                max_trivia_questions: 10,
            },
        )
    }

    fn future_date(days: i64) -> String {
        (Utc::now().date_naive() + ChronoDuration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    const WIRE_PLAN: &str = r#"{
        "temas_principales": [
            {"nombre": "Mitosis", "importancia": 5, "dificultad": "medium", "descripcion": "División celular"},
            {"nombre": "Meiosis", "importancia": 4, "dificultad": "hard", "descripcion": "División reductora"}
        ],
        "temas_dificiles": [
            {"nombre": "Meiosis", "importancia": 4, "dificultad": "hard", "descripcion": "División reductora"}
        ],
        "plan_por_dia": [
            {"dia": 1, "fecha": "2026-08-10", "temas": ["Mitosis"], "acciones": ["Leer"], "horas_estimadas": 2.5},
            {"dia": 2, "fecha": "2026-08-11", "temas": ["Meiosis"], "acciones": ["Flashcards"], "horas_estimadas": 3.0}
        ],
        "recomendaciones_generales": ["Dormir bien"],
        "tecnicas_estudio": ["Flashcards"],
        "estadisticas": {"total_temas": 2, "horas_totales": 5.5, "horas_promedio_dia": 2.75},
        "estado": "normal"
    }"#;

    #[tokio::test]
    async fn ai_plan_is_structured_with_timeline_and_stats() {
        let service = StudyPlanService::new();
        let generator = generator_with(Some(WIRE_PLAN));

        let plan = service
            .generate_study_plan(
                &generator,
                "La mitosis y la meiosis.",
                "Biología",
                &future_date(20),
                Language::Es,
            )
            .await
            .unwrap();

        assert_eq!(plan.main_topics.len(), 2);
        assert_eq!(plan.hardest_topics.len(), 1);
        assert_eq!(plan.daily_plan.len(), 2);
        assert_eq!(plan.provider, Some(ProviderKind::Claude));
        assert!(!plan.used_fallback);
        assert_eq!(plan.statistics.total_topics, 2);
        assert_eq!(plan.timeline.total_days, 2);
        assert_eq!(plan.timeline.weekly_breakdown.len(), 1);
        assert_eq!(plan.timeline.study_intensity, "media");
        assert_eq!(plan.status, "normal");
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_deterministic_plan() {
        let service = StudyPlanService::new();
        let generator = generator_with(None);
        let text = format!(
            "{}\n\n{}",
            "La mitosis es el proceso de división celular que produce dos células idénticas.",
            "La meiosis es la división que reduce el número de cromosomas a la mitad en los gametos."
        );

        let plan = service
            .generate_study_plan(&generator, &text, "Biología", &future_date(5), Language::Es)
            .await
            .unwrap();

        assert!(plan.used_fallback);
        assert_eq!(plan.provider, None);
        assert_eq!(plan.main_topics.len(), 2);
        assert_eq!(plan.status, "urgente");
        assert!(!plan.daily_plan.is_empty());
        assert!(plan.daily_plan.len() <= FALLBACK_MAX_DAYS as usize);
    }

    #[tokio::test]
    async fn invalid_exam_date_is_rejected() {
        let service = StudyPlanService::new();
        let generator = generator_with(Some(WIRE_PLAN));
        let result = service
            .generate_study_plan(&generator, "texto", "Química", "10/08/2026", Language::Es)
            .await;
        assert!(matches!(result, Err(StudyPlanError::InvalidExamDate(_))));
    }

    #[tokio::test]
    async fn plans_are_stored_listed_and_deleted() {
        let service = StudyPlanService::new();
        let generator = generator_with(Some(WIRE_PLAN));
        let plan = service
            .generate_study_plan(
                &generator,
                "Contenido del apunte.",
                "Historia",
                &future_date(10),
                Language::Es,
            )
            .await
            .unwrap();

        assert_eq!(service.get(&plan.plan_id).await.unwrap().subject_name, "Historia");
        assert_eq!(service.list().await.len(), 1);

        service.delete(&plan.plan_id).await.unwrap();
        assert!(matches!(service.get(&plan.plan_id).await, Err(StudyPlanError::NotFound)));
        assert!(matches!(service.delete(&plan.plan_id).await, Err(StudyPlanError::NotFound)));
    }

    #[test]
    fn weekly_breakdown_splits_at_seven_days() {
        let daily: Vec<DailyStudyPlan> = (1..=9)
            .map(|day| DailyStudyPlan {
                day,
                date: format!("2026-08-{:02}", day + 9),
                topics: vec!["tema".into()],
                actions: vec![],
                estimated_hours: 4.5,
            })
            .collect();

        let timeline = build_timeline(&daily, 9);
        assert_eq!(timeline.weekly_breakdown.len(), 2);
        assert_eq!(timeline.weekly_breakdown[0].days.len(), 7);
        assert_eq!(timeline.weekly_breakdown[1].days.len(), 2);
        assert_eq!(timeline.study_intensity, "alta");
    }
}
