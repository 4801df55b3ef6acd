use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ModelConfig;

use super::domain::{InterviewRound, RoleAnalysis};
use super::model::{AssessmentModel, GeneratedQuestion, GenerationRequest, ModelError};
use super::scoring::CodeEvaluation;

const MASTER_SYSTEM_PROMPT: &str = "You are an advanced AI interview engine simulating a senior interviewer at a top company.\n\
CORE RULES:\n\
1. NEVER repeat a question or ask a semantically similar variation of a previously asked question.\n\
2. The interview is TIME-BASED; keep generating questions until the allocated time expires.\n\
3. All questions MUST be derived from the job description, required skills, tools, and responsibilities.\n\
4. There are TWO rounds: Technical (round 1) then HR (round 2).\n\
   - Technical: core skills, problem-solving, scenario-based, tool-specific, system-design questions.\n\
   - HR: behavioral (STAR method), cultural fit, conflict resolution, leadership, career goals.\n\
5. Adapt difficulty to the candidate's last answer score.\n\
6. Follow-up questions MUST be context-aware and reference the candidate's previous answer.\n\
7. Always generate a comprehensive ideal reference answer and 5-7 evaluation keywords.\n\
8. Always return valid JSON with no markdown and no extra text.";

/// Pooled HTTP client for an Ollama-compatible generation endpoint.
///
/// Connection concurrency and per-call timeouts are bounded here, below the
/// engine's join timeout, so one stalled call can never wedge a session.
pub struct OllamaModelClient {
    http: Client,
    base_url: String,
    model_name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaModelClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .map_err(|err| ModelError::Backend(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
        })
    }

    async fn generate_text(
        &self,
        prompt: &str,
        system: &str,
        fast: bool,
    ) -> Result<String, ModelError> {
        let payload = json!({
            "model": self.model_name,
            "prompt": prompt,
            "system": format!("{MASTER_SYSTEM_PROMPT}\n\n{system}"),
            "stream": false,
            "options": {
                "temperature": 0.7,
                "num_predict": if fast { 512 } else { 2048 },
            },
        });

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?
            .error_for_status()
            .map_err(map_request_error)?;

        let body: GenerateResponse = response.json().await.map_err(map_request_error)?;
        Ok(body.response)
    }
}

fn map_request_error(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Backend(err.to_string())
    }
}

/// Extract the first top-level JSON object from free-form model output.
fn extract_json(text: &str) -> Result<Value, ModelError> {
    let start = text
        .find('{')
        .ok_or_else(|| ModelError::Malformed("no JSON object in output".to_string()))?;
    let end = text
        .rfind('}')
        .ok_or_else(|| ModelError::Malformed("unterminated JSON object".to_string()))?;
    if end < start {
        return Err(ModelError::Malformed("unterminated JSON object".to_string()));
    }
    serde_json::from_str(&text[start..=end]).map_err(|err| ModelError::Malformed(err.to_string()))
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|item| item.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn score_field(value: &Value, key: &str) -> Option<f64> {
    value
        .get(key)
        .and_then(Value::as_f64)
        .map(|score| score.clamp(0.0, 100.0))
}

fn followup_instruction(last_score: Option<f64>) -> &'static str {
    match last_score {
        Some(score) if score >= 80.0 => {
            "The candidate scored well. INCREASE difficulty. Ask a deeper technical follow-up related to their last answer."
        }
        Some(score) if score >= 50.0 => {
            "The candidate gave a moderate answer. Ask a clarification question or probe their practical understanding."
        }
        Some(_) => {
            "The candidate struggled. Ask a simpler, supportive question on a related topic or move to an easier area."
        }
        None => "",
    }
}

fn generation_prompt(request: &GenerationRequest) -> String {
    let previous = if request.exclude_questions.is_empty() {
        "None".to_string()
    } else {
        request
            .exclude_questions
            .iter()
            .map(|question| format!("- {question}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let last_answer = request
        .previous_answers
        .last()
        .map(|answer| format!("\nCandidate's last answer: {answer}"))
        .unwrap_or_default();

    let mut jd_context = String::new();
    if !request.job_description.is_empty() {
        jd_context.push_str(&format!(
            "\nFull job description:\n{}\n",
            request.job_description
        ));
    }
    if let Some(analysis) = &request.analysis {
        jd_context.push_str(&format!(
            "\nExtracted skills: {}",
            analysis.required_skills.join(", ")
        ));
        jd_context.push_str(&format!(
            "\nKey responsibilities: {}",
            analysis.key_responsibilities.join(", ")
        ));
        jd_context.push_str(&format!(
            "\nTools and frameworks: {}",
            analysis.tools_and_frameworks.join(", ")
        ));
        match request.round {
            InterviewRound::Hr => {
                jd_context.push_str(&format!(
                    "\nSoft skills to evaluate: {}",
                    analysis.soft_skills.join(", ")
                ));
                jd_context.push_str(&format!("\nHR topics: {}", analysis.hr_topics.join(", ")));
            }
            InterviewRound::Technical => {
                jd_context.push_str(&format!(
                    "\nTechnical topics: {}",
                    analysis.technical_topics.join(", ")
                ));
            }
        }
    }

    let coding_instruction = if request.want_coding {
        "\nThis must be a CODING question. Include the problem statement, expected input/output, and constraints. The ideal_answer must contain a working code solution. Set \"is_coding\": true."
    } else {
        ""
    };

    format!(
        "Generate a {round} interview question for a {role} position.\n\
Experience level: {level}\n\
Difficulty: {difficulty}\n\
Round: {round}\n\
{jd_context}\n\
Previously asked questions (DO NOT repeat or ask similar):\n\
{previous}{last_answer}\n\n\
{followup}{coding_instruction}\n\n\
Return ONLY a JSON object in this exact format:\n\
{{\n\
  \"question\": \"Your interview question here\",\n\
  \"ideal_answer\": \"The ideal comprehensive answer\",\n\
  \"evaluation_keywords\": [\"keyword1\", \"keyword2\", \"keyword3\", \"keyword4\", \"keyword5\"],\n\
  \"is_coding\": false\n\
}}",
        round = request.round.label(),
        role = request.job_role,
        level = if request.experience_level.is_empty() {
            "Not specified"
        } else {
            request.experience_level.as_str()
        },
        difficulty = request.difficulty.label(),
        jd_context = jd_context,
        previous = previous,
        last_answer = last_answer,
        followup = followup_instruction(request.last_score),
        coding_instruction = coding_instruction,
    )
}

#[async_trait]
impl AssessmentModel for OllamaModelClient {
    async fn generate_question(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuestion, ModelError> {
        let system = format!(
            "You are an expert {} interviewer. Generate relevant, professional questions strictly aligned with the job description. Always return valid JSON.",
            request.round.label()
        );
        let raw = self
            .generate_text(&generation_prompt(request), &system, false)
            .await?;
        let parsed = extract_json(&raw)?;

        let question = string_field(&parsed, "question");
        if question.is_empty() {
            return Err(ModelError::Malformed("generation without question text".to_string()));
        }

        let mut keywords = string_list(&parsed, "evaluation_keywords");
        if keywords.is_empty() {
            keywords = string_list(&parsed, "keywords");
        }

        Ok(GeneratedQuestion {
            question,
            ideal_answer: string_field(&parsed, "ideal_answer"),
            keywords,
            is_coding: parsed
                .get("is_coding")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    async fn assess_depth(&self, question: &str, answer: &str) -> Result<f64, ModelError> {
        let prompt = format!(
            "Rate the depth of knowledge shown in this interview answer on a scale of 0-100.\n\n\
Question: {question}\n\
Answer: {answer}\n\n\
Consider:\n\
- Does the answer go beyond surface level?\n\
- Are specific examples, frameworks, or methodologies mentioned?\n\
- Does it show practical experience?\n\n\
Return ONLY a JSON object: {{\"depth_score\": <number>}}"
        );

        let raw = self
            .generate_text(
                &prompt,
                "You are an expert evaluator. Return only valid JSON.",
                true,
            )
            .await?;
        let parsed = extract_json(&raw)?;
        score_field(&parsed, "depth_score")
            .ok_or_else(|| ModelError::Malformed("missing depth_score".to_string()))
    }

    async fn generate_feedback(
        &self,
        question: &str,
        answer: &str,
        score: f64,
        round: InterviewRound,
    ) -> Result<String, ModelError> {
        let prompt = format!(
            "Evaluate this {} interview answer briefly (2-3 sentences).\n\
Question: {question}\n\
Answer: {answer}\n\
Score: {score}/100\n\n\
Provide constructive feedback: what was good, what could be improved, and one specific suggestion.",
            round.label()
        );

        let raw = self
            .generate_text(
                &prompt,
                "You are an expert interviewer providing brief, constructive, actionable feedback.",
                true,
            )
            .await?;
        let feedback = raw.trim();
        if feedback.is_empty() {
            return Err(ModelError::Malformed("empty feedback".to_string()));
        }
        Ok(feedback.to_string())
    }

    async fn review_code(
        &self,
        question: &str,
        ideal_answer: &str,
        submitted_code: &str,
        language: &str,
    ) -> Result<CodeEvaluation, ModelError> {
        let prompt = format!(
            "Evaluate this code submission for an interview coding question.\n\n\
Question: {question}\n\
Expected solution: {ideal_answer}\n\
Submitted code ({language}):\n```{language}\n{submitted_code}\n```\n\n\
Evaluate on:\n\
1. Correctness (does it solve the problem?) - 0-100\n\
2. Code quality (readability, naming, structure) - 0-100\n\
3. Efficiency (time/space complexity) - 0-100\n\
4. Edge case handling - 0-100\n\n\
Also generate 2-3 follow-up questions about the code logic.\n\n\
Return ONLY a JSON object:\n\
{{\n\
  \"correctness_score\": <number>,\n\
  \"quality_score\": <number>,\n\
  \"efficiency_score\": <number>,\n\
  \"edge_case_score\": <number>,\n\
  \"overall_score\": <number>,\n\
  \"feedback\": \"Brief constructive feedback\",\n\
  \"follow_up_questions\": [\"q1\", \"q2\"]\n\
}}"
        );

        let raw = self
            .generate_text(
                &prompt,
                "You are an expert code reviewer. Return valid JSON only.",
                false,
            )
            .await?;
        let parsed = extract_json(&raw)?;

        let overall_score = score_field(&parsed, "overall_score")
            .ok_or_else(|| ModelError::Malformed("missing overall_score".to_string()))?;

        Ok(CodeEvaluation {
            correctness_score: score_field(&parsed, "correctness_score").unwrap_or(0.0),
            quality_score: score_field(&parsed, "quality_score").unwrap_or(0.0),
            efficiency_score: score_field(&parsed, "efficiency_score").unwrap_or(0.0),
            edge_case_score: score_field(&parsed, "edge_case_score").unwrap_or(0.0),
            overall_score,
            feedback: string_field(&parsed, "feedback"),
            follow_up_questions: string_list(&parsed, "follow_up_questions"),
        })
    }

    async fn analyze_role(
        &self,
        job_role: &str,
        job_description: &str,
    ) -> Result<RoleAnalysis, ModelError> {
        let prompt = format!(
            "Analyze this job description and extract structured information.\n\n\
Job title: {job_role}\n\
Job description:\n{job_description}\n\n\
Return ONLY a JSON object:\n\
{{\n\
  \"required_skills\": [\"skill1\", \"skill2\"],\n\
  \"key_responsibilities\": [\"resp1\", \"resp2\"],\n\
  \"tools_and_frameworks\": [\"tool1\", \"tool2\"],\n\
  \"soft_skills\": [\"soft1\", \"soft2\"],\n\
  \"experience_expectations\": \"summary of expected experience\",\n\
  \"technical_topics\": [\"topic1\", \"topic2\"],\n\
  \"hr_topics\": [\"topic1\", \"topic2\"]\n\
}}"
        );

        let raw = self
            .generate_text(
                &prompt,
                "You are a job-description analysis expert. Return valid JSON only.",
                false,
            )
            .await?;
        let parsed = extract_json(&raw)?;

        let required_skills = string_list(&parsed, "required_skills");
        if required_skills.is_empty() {
            return Err(ModelError::Malformed("analysis without skills".to_string()));
        }

        Ok(RoleAnalysis {
            required_skills,
            key_responsibilities: string_list(&parsed, "key_responsibilities"),
            tools_and_frameworks: string_list(&parsed, "tools_and_frameworks"),
            soft_skills: string_list(&parsed, "soft_skills"),
            experience_expectations: string_field(&parsed, "experience_expectations"),
            technical_topics: string_list(&parsed, "technical_topics"),
            hr_topics: string_list(&parsed, "hr_topics"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_ignores_surrounding_prose() {
        let raw = "Sure, here you go:\n{\"depth_score\": 74}\nHope that helps!";
        let value = extract_json(raw).expect("object extracted");
        assert_eq!(value["depth_score"], 74);
    }

    #[test]
    fn extract_json_rejects_plain_text() {
        assert!(matches!(
            extract_json("no object here"),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn score_field_clamps_out_of_range_values() {
        let value: Value = serde_json::from_str("{\"depth_score\": 180.0}").expect("valid json");
        assert_eq!(score_field(&value, "depth_score"), Some(100.0));
    }

    #[test]
    fn generation_prompt_lists_exclusions_and_followup() {
        let request = GenerationRequest {
            job_role: "SRE".to_string(),
            job_description: String::new(),
            experience_level: String::new(),
            difficulty: crate::workflows::interview::domain::DifficultyLevel::Hard,
            round: InterviewRound::Technical,
            exclude_questions: vec!["What is an SLO?".to_string()],
            previous_answers: vec!["We page on burn rate.".to_string()],
            last_score: Some(86.0),
            analysis: None,
            want_coding: false,
        };

        let prompt = generation_prompt(&request);
        assert!(prompt.contains("- What is an SLO?"));
        assert!(prompt.contains("INCREASE difficulty"));
        assert!(prompt.contains("Candidate's last answer: We page on burn rate."));
        assert!(prompt.contains("Difficulty: hard"));
    }

    #[test]
    fn coding_request_adds_coding_instruction() {
        let request = GenerationRequest {
            job_role: "Backend Engineer".to_string(),
            job_description: String::new(),
            experience_level: String::new(),
            difficulty: crate::workflows::interview::domain::DifficultyLevel::Medium,
            round: InterviewRound::Technical,
            exclude_questions: Vec::new(),
            previous_answers: Vec::new(),
            last_score: None,
            analysis: None,
            want_coding: true,
        };

        let prompt = generation_prompt(&request);
        assert!(prompt.contains("CODING question"));
        assert!(prompt.contains("expected input/output"));
    }
}
