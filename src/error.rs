use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Значение поля `type`, которым API помечает объект ошибки.
pub const ERROR_TYPE: &str = "error";

#[derive(Error, Debug)]
pub enum YooKassaError {
    #[error("Ошибка сети или HTTP запроса: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Ошибка сериализации/десериализации JSON: {0}")]
    Serde(#[from] serde_json::Error),

    /// Ответ распознан как объект ошибки (`"type": "error"`).
    #[error(transparent)]
    Api(#[from] YooKassaApiError),

    #[error("Неожиданный ответ YooKassa (Статус: {status}): {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Неверный URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Базовый URL не может содержать путь API: {0}")]
    InvalidBaseUrl(String),

    #[error("Неверное значение заголовка: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Некорректный идентификатор платежа: {0:?}")]
    InvalidPaymentId(String),

    #[error("Не задана переменная окружения {0}")]
    MissingEnv(&'static str),
}

impl YooKassaError {
    /// Код ошибки API, если ответ был объектом ошибки.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            YooKassaError::Api(err) => err.code.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T, E = YooKassaError> = std::result::Result<T, E>;

/// Тело ошибки от API YooKassa.
///
/// `Display` возвращает ровно `description`, без префиксов.
#[derive(Error, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[error("{description}")]
pub struct YooKassaApiError {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Например, `invalid_request` или `invalid_credentials`.
    #[serde(default, deserialize_with = "lenient_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient_description")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// Через сколько миллисекунд имеет смысл повторить запрос.
    #[serde(default, deserialize_with = "lenient_millis")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    /// HTTP статус ответа; заполняется клиентом, в JSON не передается.
    #[serde(skip)]
    pub http_status: Option<u16>,
}

impl YooKassaApiError {
    /// Собирает ошибку из уже разобранного JSON; поля неожиданного типа
    /// не мешают получить `description`.
    pub fn from_value(value: &Value) -> Self {
        YooKassaApiError {
            error_type: value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(ERROR_TYPE)
                .to_owned(),
            id: value.get("id").and_then(string_like),
            code: value.get("code").and_then(string_like),
            description: value
                .get("description")
                .and_then(string_like)
                .unwrap_or_default(),
            parameter: value.get("parameter").and_then(string_like),
            retry_after: value.get("retry_after").and_then(millis_like),
            http_status: None,
        }
    }
}

// Строки берутся как есть, числа и bool переводятся в строку, остальное отбрасывается
fn string_like(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn millis_like(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(string_like(&Value::deserialize(deserializer)?))
}

fn lenient_description<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(millis_like(&Value::deserialize(deserializer)?))
}
