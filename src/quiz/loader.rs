use std::future::Future;
use std::time::Duration;

use log::{error, info};
use serde::Deserialize;

use crate::error::LoadError;
use crate::quiz::Question;

const INCORRECT_ANSWERS_PER_QUESTION: usize = 3;

/// Something that can show the player that questions are on their way.
pub trait LoadingIndicator: Send {
    fn set_visible(&mut self, visible: bool) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    response_code: u32,
    #[serde(default)]
    results: Vec<ApiQuestion>,
}

#[derive(Debug, Deserialize)]
struct ApiQuestion {
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    difficulty: String,
}

pub struct QuestionLoader {
    client: reqwest::Client,
    api_url: String,
    amount: u32,
}

impl QuestionLoader {
    pub fn new(api_url: impl Into<String>, amount: u32) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            amount,
        })
    }

    /// Loads one batch of questions, hiding `indicator` again once the request
    /// is over. A failed load is logged and yields no questions.
    pub async fn fetch_questions<I: LoadingIndicator>(&self, indicator: &mut I) -> Vec<Question> {
        indicator.set_visible(true).await;
        let result = self.try_fetch_questions().await;
        indicator.set_visible(false).await;

        match result {
            Ok(questions) => questions,
            Err(err) => {
                error!("Error fetching questions from {}: {}", self.api_url, err);
                Vec::new()
            }
        }
    }

    pub async fn try_fetch_questions(&self) -> Result<Vec<Question>, LoadError> {
        info!("Fetching {} questions from {}", self.amount, self.api_url);
        let amount = self.amount.to_string();
        let body = self
            .client
            .get(&self.api_url)
            .query(&[
                ("amount", amount.as_str()),
                ("type", "multiple"),
                ("encode", "url3986"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let questions = parse_questions(&body)?;
        info!("Fetched {} questions", questions.len());
        Ok(questions)
    }
}

/// Decodes an RFC 3986 encoded response body of the trivia source.
pub fn parse_questions(body: &str) -> Result<Vec<Question>, LoadError> {
    let response: ApiResponse = serde_json::from_str(body)?;
    if response.response_code != 0 {
        return Err(LoadError::Api {
            code: response.response_code,
        });
    }

    response
        .results
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            if raw.incorrect_answers.len() != INCORRECT_ANSWERS_PER_QUESTION {
                return Err(LoadError::Format(format!(
                    "question {} has {} incorrect answers, expected {}",
                    index + 1,
                    raw.incorrect_answers.len(),
                    INCORRECT_ANSWERS_PER_QUESTION
                )));
            }
            Ok(Question {
                prompt: decode(&raw.question)?,
                correct_answer: decode(&raw.correct_answer)?,
                incorrect_answers: raw
                    .incorrect_answers
                    .iter()
                    .map(|answer| decode(answer))
                    .collect::<Result<_, _>>()?,
                category: decode(&raw.category)?,
                difficulty: decode(&raw.difficulty)?,
            })
        })
        .collect()
}

fn decode(value: &str) -> Result<String, LoadError> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|err| LoadError::Format(format!("bad encoding in {value:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[derive(Default)]
    struct RecordingIndicator {
        toggles: Vec<bool>,
    }

    impl LoadingIndicator for RecordingIndicator {
        async fn set_visible(&mut self, visible: bool) {
            self.toggles.push(visible);
        }
    }

    const BODY: &str = r#"{
        "response_code": 0,
        "results": [{
            "type": "multiple",
            "difficulty": "easy",
            "category": "Science%3A%20Mathematics",
            "question": "What%20is%20%222%2B2%22%3F",
            "correct_answer": "4",
            "incorrect_answers": ["3", "5", "Six%20%26%20more"]
        }]
    }"#;

    #[test]
    fn parses_and_decodes_questions() {
        let questions = parse_questions(BODY).unwrap();
        assert_eq!(questions.len(), 1);
        let question = &questions[0];
        assert_eq!(question.prompt, "What is \"2+2\"?");
        assert_eq!(question.correct_answer, "4");
        assert_eq!(question.incorrect_answers, vec!["3", "5", "Six & more"]);
        assert_eq!(question.category, "Science: Mathematics");
        assert_eq!(question.difficulty, "easy");
    }

    #[test]
    fn missing_field_is_a_format_error() {
        let body = r#"{"response_code":0,"results":[{"question":"Q","incorrect_answers":["a","b","c"]}]}"#;
        assert!(matches!(parse_questions(body), Err(LoadError::Format(_))));
        assert!(matches!(parse_questions("not json"), Err(LoadError::Format(_))));
        assert!(matches!(parse_questions(r#"{"results":[]}"#), Err(LoadError::Format(_))));
    }

    #[test]
    fn wrong_number_of_incorrect_answers_is_a_format_error() {
        let body = r#"{"response_code":0,"results":[{"question":"Q","correct_answer":"a","incorrect_answers":["b"]}]}"#;
        assert!(matches!(parse_questions(body), Err(LoadError::Format(_))));
    }

    #[test]
    fn non_zero_response_code_is_an_api_error() {
        let body = r#"{"response_code":5,"results":[]}"#;
        assert!(matches!(parse_questions(body), Err(LoadError::Api { code: 5 })));
    }

    #[tokio::test]
    async fn failed_fetch_yields_no_questions_and_hides_indicator() {
        // nothing listens on the discard port
        let loader = QuestionLoader::new("http://127.0.0.1:9/api.php", 10).unwrap();
        let mut indicator = RecordingIndicator::default();

        let questions = loader.fetch_questions(&mut indicator).await;

        assert!(questions.is_empty());
        assert_eq!(indicator.toggles, vec![true, false]);
    }

    /// Answers exactly one HTTP request with `body` and hands back its request line.
    async fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api.php", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::<u8>::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = socket.read(&mut buf).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            let request = String::from_utf8_lossy(&request).into_owned();
            request.lines().next().unwrap_or_default().to_string()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn fetch_requests_a_multiple_choice_batch() {
        let (url, server) = serve_once(BODY).await;
        let loader = QuestionLoader::new(url, 3).unwrap();
        let mut indicator = RecordingIndicator::default();

        let questions = loader.fetch_questions(&mut indicator).await;

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /api.php?"), "{request_line}");
        assert!(
            request_line.contains("amount=3&type=multiple&encode=url3986"),
            "{request_line}"
        );
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].prompt, "What is \"2+2\"?");
        assert_eq!(indicator.toggles, vec![true, false]);
    }

    #[tokio::test]
    async fn api_error_response_yields_no_questions() {
        let body = r#"{"response_code":5,"results":[]}"#;
        let (url, server) = serve_once(body).await;
        let loader = QuestionLoader::new(url, 10).unwrap();
        let mut indicator = RecordingIndicator::default();

        assert!(loader.fetch_questions(&mut indicator).await.is_empty());
        assert_eq!(indicator.toggles, vec![true, false]);
        server.await.unwrap();

        let (url, server) = serve_once(body).await;
        let loader = QuestionLoader::new(url, 10).unwrap();
        assert!(matches!(
            loader.try_fetch_questions().await,
            Err(LoadError::Api { code: 5 })
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_response_yields_no_questions() {
        let body = r#"{"response_code":0,"results":[{"question":"Q"}]}"#;
        let (url, server) = serve_once(body).await;
        let loader = QuestionLoader::new(url, 10).unwrap();
        let mut indicator = RecordingIndicator::default();

        assert!(loader.fetch_questions(&mut indicator).await.is_empty());
        assert_eq!(indicator.toggles, vec![true, false]);
        server.await.unwrap();

        let (url, server) = serve_once(body).await;
        let loader = QuestionLoader::new(url, 10).unwrap();
        assert!(matches!(
            loader.try_fetch_questions().await,
            Err(LoadError::Format(_))
        ));
        server.await.unwrap();
    }
}
