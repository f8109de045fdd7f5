//! Разбор ответов API.
//!
//! Объект ошибки и объект платежа приходят в одном и том же формате JSON и
//! отличаются только полем `type`. Поэтому ответ сначала читается как
//! `serde_json::Value`, проверяется дискриминатор, и лишь затем значение
//! превращается в нужный тип.

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde_json::Value;

use crate::error::{ERROR_TYPE, Result, YooKassaApiError, YooKassaError};

/// Ответ API: либо доменный объект, либо объект ошибки.
#[derive(Debug, Clone)]
pub enum ApiResponse<T> {
    Ok(T),
    Err(YooKassaApiError),
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiResponse::Ok(value) => Ok(value),
            ApiResponse::Err(err) => Err(YooKassaError::Api(err)),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ApiResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if is_error_object(&value) {
            // Дискриминатор решает все: остальные поля не могут сделать ответ не-ошибкой
            Ok(ApiResponse::Err(YooKassaApiError::from_value(&value)))
        } else {
            T::deserialize(value)
                .map(ApiResponse::Ok)
                .map_err(de::Error::custom)
        }
    }
}

fn is_error_object(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some(ERROR_TYPE)
}

/// Превращает статус и тело ответа в результат вызова.
///
/// Объект ошибки распознается при любом статусе; не-2xx без объекта ошибки
/// дает `UnexpectedStatus`, и только затем тело разбирается как `T`.
pub(crate) fn handle<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    let response = match serde_json::from_slice::<ApiResponse<T>>(body) {
        Ok(ApiResponse::Err(mut err)) => {
            err.http_status = Some(status.as_u16());
            ApiResponse::Err(err)
        }
        _ if !status.is_success() => {
            return Err(YooKassaError::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(body).into_owned(),
            });
        }
        Ok(response) => response,
        Err(err) => return Err(err.into()),
    };
    response.into_result()
}
