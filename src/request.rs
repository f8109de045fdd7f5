use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::error::{Result, YooKassaError};

pub const IDEMPOTENCE_KEY_HEADER: &str = "Idempotence-Key";

pub(crate) const PAYMENTS_ENDPOINT: &str = "payments";
const CAPTURE_ENDPOINT: &str = "capture";
const CANCEL_ENDPOINT: &str = "cancel";

/// Новый ключ идемпотентности (UUID v4).
pub fn idempotence_key() -> String {
    Uuid::new_v4().to_string()
}

/// Приводит базовый URL к виду с завершающим `/`.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if url.cannot_be_a_base() {
        return Err(YooKassaError::InvalidBaseUrl(base_url.to_owned()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// Каждый сегмент кодируется целиком: `/`, `%` и `\` внутри него не создают новых сегментов
fn endpoint_url(base_url: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| YooKassaError::InvalidBaseUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// `.` и `..` `path_segments_mut` молча отбрасывает, поэтому их отсекаем сами
fn check_payment_id(payment_id: &str) -> Result<&str> {
    if matches!(payment_id.trim(), "" | "." | "..")
        || payment_id.contains(['/', '\\', '?', '#'])
    {
        return Err(YooKassaError::InvalidPaymentId(payment_id.to_owned()));
    }
    Ok(payment_id)
}

pub(crate) fn payment_endpoint(payment_id: &str) -> Result<Vec<&str>> {
    Ok(vec![PAYMENTS_ENDPOINT, check_payment_id(payment_id)?])
}

pub(crate) fn capture_endpoint(payment_id: &str) -> Result<Vec<&str>> {
    let mut segments = payment_endpoint(payment_id)?;
    segments.push(CAPTURE_ENDPOINT);
    Ok(segments)
}

pub(crate) fn cancel_endpoint(payment_id: &str) -> Result<Vec<&str>> {
    let mut segments = payment_endpoint(payment_id)?;
    segments.push(CANCEL_ENDPOINT);
    Ok(segments)
}

/// Все, что нужно для отправки запроса, включая повторные попытки:
/// тело сериализуется один раз, ключ идемпотентности тоже фиксируется один раз.
#[derive(Debug, Clone)]
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    pub fn get(base_url: &Url, endpoint: &[&str]) -> Result<Self> {
        Self::new(Method::GET, base_url, endpoint, None)
    }

    /// POST всегда несет JSON тело и ключ идемпотентности.
    pub fn post<T: Serialize + ?Sized>(
        base_url: &Url,
        endpoint: &[&str],
        body: &T,
    ) -> Result<Self> {
        let body = serde_json::to_vec(body)?;
        let mut request = Self::new(Method::POST, base_url, endpoint, Some(body))?;
        request.headers.insert(
            IDEMPOTENCE_KEY_HEADER,
            HeaderValue::from_str(&idempotence_key())?,
        );
        Ok(request)
    }

    fn new(
        method: Method,
        base_url: &Url,
        endpoint: &[&str],
        body: Option<Vec<u8>>,
    ) -> Result<Self> {
        let url = endpoint_url(base_url, endpoint)?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
        })
    }

    pub fn with_query(mut self, query: &[(&str, String)]) -> Self {
        if !query.is_empty() {
            let mut pairs = self.url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        self
    }

    pub fn idempotence_key(&self) -> Option<&str> {
        self.headers
            .get(IDEMPOTENCE_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn idempotence_keys_are_unique() {
        let first = idempotence_key();
        let second = idempotence_key();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    fn url_for(base: &str, endpoint: &[&str]) -> String {
        endpoint_url(&parse_base_url(base).unwrap(), endpoint)
            .unwrap()
            .to_string()
    }

    #[test]
    fn base_url_keeps_version_segment() {
        assert_eq!(
            url_for("https://api.yookassa.ru/v3", &[PAYMENTS_ENDPOINT]),
            "https://api.yookassa.ru/v3/payments"
        );
        assert_eq!(
            url_for("https://api.yookassa.ru/v3/", &[PAYMENTS_ENDPOINT]),
            "https://api.yookassa.ru/v3/payments"
        );
        assert_eq!(
            url_for("http://127.0.0.1:8080", &[PAYMENTS_ENDPOINT]),
            "http://127.0.0.1:8080/payments"
        );

        let base = parse_base_url("https://api.yookassa.ru/v3/").unwrap();
        assert_eq!(base.as_str(), "https://api.yookassa.ru/v3/");
    }

    #[test]
    fn bad_base_url_is_rejected() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(YooKassaError::UrlParse(_))
        ));
        assert!(matches!(
            parse_base_url("mailto:shop@example.com"),
            Err(YooKassaError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn sub_resource_paths() {
        let base = "https://api.yookassa.ru/v3/";
        let id = "22d6d597-000f-5000-9000-145f6df21d6f";
        assert_eq!(
            url_for(base, &payment_endpoint(id).unwrap()),
            "https://api.yookassa.ru/v3/payments/22d6d597-000f-5000-9000-145f6df21d6f"
        );
        assert_eq!(
            url_for(base, &capture_endpoint(id).unwrap()),
            "https://api.yookassa.ru/v3/payments/22d6d597-000f-5000-9000-145f6df21d6f/capture"
        );
        assert_eq!(
            url_for(base, &cancel_endpoint(id).unwrap()),
            "https://api.yookassa.ru/v3/payments/22d6d597-000f-5000-9000-145f6df21d6f/cancel"
        );
    }

    #[test]
    fn path_breaking_ids_are_rejected() {
        for id in ["", " ", ".", "..", "a/b", "a\\b", "a?b=1", "a#b"] {
            assert!(
                matches!(cancel_endpoint(id), Err(YooKassaError::InvalidPaymentId(_))),
                "{id:?} accepted"
            );
            assert!(matches!(
                payment_endpoint(id),
                Err(YooKassaError::InvalidPaymentId(_))
            ));
        }
    }

    #[test]
    fn payment_id_stays_one_segment() {
        let base = "https://api.yookassa.ru/v3/";
        assert_eq!(
            url_for(base, &cancel_endpoint("a b%2e%2e").unwrap()),
            "https://api.yookassa.ru/v3/payments/a%20b%252e%252e/cancel"
        );
    }

    #[test]
    fn post_carries_json_and_idempotence_key() {
        let base = parse_base_url("https://api.yookassa.ru/v3/").unwrap();
        let request =
            PreparedRequest::post(&base, &[PAYMENTS_ENDPOINT], &json!({})).unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body.as_deref(), Some(&b"{}"[..]));
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert!(request.idempotence_key().is_some());
    }

    #[test]
    fn get_has_no_body_headers() {
        let base = parse_base_url("https://api.yookassa.ru/v3/").unwrap();
        let request = PreparedRequest::get(&base, &[PAYMENTS_ENDPOINT])
            .unwrap()
            .with_query(&[("limit", "5".to_string())]);

        assert!(request.body.is_none());
        assert!(request.headers.get(CONTENT_TYPE).is_none());
        assert!(request.idempotence_key().is_none());
        assert_eq!(
            request.url.as_str(),
            "https://api.yookassa.ru/v3/payments?limit=5"
        );
    }
}
