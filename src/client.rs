use std::env;
use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Result, YooKassaError};
use crate::models::{
    CapturePaymentRequest, ListPaymentsParams, Payment, PaymentConfig, PaymentList,
};
use crate::request::{
    self, IDEMPOTENCE_KEY_HEADER, PAYMENTS_ENDPOINT, PreparedRequest, cancel_endpoint,
    capture_endpoint, payment_endpoint,
};
use crate::response;
use crate::retry::RetryPolicy;
use crate::webhook::{self, WebhookEvent, WebhookPayment};

pub const YOOKASSA_API_BASE_URL: &str = "https://api.yookassa.ru/v3/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const SHOP_ID_VAR: &str = "YOOKASSA_SHOP_ID";
pub const SECRET_KEY_VAR: &str = "YOOKASSA_SECRET_KEY";
pub const BASE_URL_VAR: &str = "YOOKASSA_BASE_URL";
pub const VERBOSE_VAR: &str = "YOOKASSA_VERBOSE";

/// Параметры клиента до его создания.
pub struct ClientBuilder {
    shop_id: String,
    secret_key: String,
    base_url: String,
    verbose: bool,
    timeout: Duration,
    retry_policy: RetryPolicy,
    http_client: Option<ReqwestClient>,
}

impl ClientBuilder {
    pub fn new(shop_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        ClientBuilder {
            shop_id: shop_id.into(),
            secret_key: secret_key.into(),
            base_url: YOOKASSA_API_BASE_URL.to_string(),
            verbose: false,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::none(),
            http_client: None,
        }
    }

    /// Читает `YOOKASSA_SHOP_ID` и `YOOKASSA_SECRET_KEY` (обязательные),
    /// `YOOKASSA_BASE_URL` и `YOOKASSA_VERBOSE` (необязательные).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let shop_id = lookup(SHOP_ID_VAR).ok_or(YooKassaError::MissingEnv(SHOP_ID_VAR))?;
        let secret_key = lookup(SECRET_KEY_VAR).ok_or(YooKassaError::MissingEnv(SECRET_KEY_VAR))?;

        let mut builder = ClientBuilder::new(shop_id, secret_key);
        if let Some(base_url) = lookup(BASE_URL_VAR) {
            builder = builder.base_url(base_url);
        }
        if let Some(verbose) = lookup(VERBOSE_VAR) {
            builder = builder.verbose(matches!(
                verbose.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ));
        }
        Ok(builder)
    }

    /// Логировать тела запросов и ответов (уровень `info`).
    /// В телах бывают данные карт, поэтому по умолчанию выключено.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Кастомный базовый URL (для тестирования или прокси).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Игнорируется, если передан собственный HTTP клиент.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Готовый `reqwest::Client` с настройками приложения (прокси, TLS, таймауты).
    pub fn http_client(mut self, client: ReqwestClient) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<YooKassaClient> {
        let client = match self.http_client {
            Some(client) => client,
            None => ReqwestClient::builder().timeout(self.timeout).build()?,
        };
        Ok(YooKassaClient {
            client,
            shop_id: self.shop_id,
            secret_key: self.secret_key,
            base_url: request::parse_base_url(&self.base_url)?,
            verbose: self.verbose,
            retry_policy: self.retry_policy,
        })
    }
}

// --- Клиент YooKassa ---

/// Клиент API YooKassa.
///
/// После создания не меняется; клонирование дешевое и разделяет пул
/// соединений `reqwest`.
#[derive(Clone)]
pub struct YooKassaClient {
    client: ReqwestClient,
    shop_id: String,
    secret_key: String,
    base_url: Url,
    verbose: bool,
    retry_policy: RetryPolicy,
}

impl fmt::Debug for YooKassaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YooKassaClient")
            .field("shop_id", &self.shop_id)
            .field("secret_key", &"***")
            .field("base_url", &self.base_url.as_str())
            .field("verbose", &self.verbose)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl YooKassaClient {
    /// Создает клиент с настройками по умолчанию.
    ///
    /// # Arguments
    ///
    /// * `shop_id` - Идентификатор вашего магазина.
    /// * `secret_key` - Секретный ключ вашего магазина.
    pub fn new(shop_id: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(shop_id, secret_key).build()
    }

    pub fn builder(shop_id: impl Into<String>, secret_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(shop_id, secret_key)
    }

    pub fn shop_id(&self) -> &str {
        &self.shop_id
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    // Одна попытка отправки
    async fn send_once(&self, request: &PreparedRequest) -> reqwest::Result<reqwest::Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .basic_auth(&self.shop_id, Some(&self.secret_key))
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        builder.send().await
    }

    // Отправка с учетом политики повторов; возвращает статус и тело последней попытки
    async fn execute(&self, request: &PreparedRequest) -> Result<(StatusCode, Vec<u8>)> {
        match request.idempotence_key() {
            Some(key) => debug!(
                "{} {} ({}: {})",
                request.method, request.url, IDEMPOTENCE_KEY_HEADER, key
            ),
            None => debug!("{} {}", request.method, request.url),
        }
        if self.verbose {
            if let Some(body) = request.body_text() {
                info!("YooKassa request body: {}", body);
            }
        }

        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(response) => {
                    let status = response.status();
                    if self.retry_policy.should_retry_status(attempt, status) {
                        attempt += 1;
                        warn!(
                            "{} {} returned {}, retry {}/{}",
                            request.method,
                            request.url,
                            status,
                            attempt,
                            self.retry_policy.max_retries
                        );
                        tokio::time::sleep(self.retry_policy.delay(attempt)).await;
                        continue;
                    }

                    let body = response.bytes().await?;
                    if self.verbose {
                        info!(
                            "YooKassa response ({}): {}",
                            status,
                            String::from_utf8_lossy(&body)
                        );
                    }
                    return Ok((status, body.to_vec()));
                }
                Err(err) if self.retry_policy.should_retry_error(attempt, &err) => {
                    attempt += 1;
                    warn!(
                        "{} {} failed: {}, retry {}/{}",
                        request.method, request.url, err, attempt, self.retry_policy.max_retries
                    );
                    tokio::time::sleep(self.retry_policy.delay(attempt)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn call<R: DeserializeOwned>(&self, request: PreparedRequest) -> Result<R> {
        let (status, body) = self.execute(&request).await?;
        response::handle(status, &body)
    }

    /// Проверяет доступность API и корректность ключей.
    ///
    /// `Ok(true)` только при ответе 200; сетевые ошибки возвращаются как `Err`.
    pub async fn ping(&self) -> Result<bool> {
        let request = PreparedRequest::get(&self.base_url, &[PAYMENTS_ENDPOINT])?;
        let (status, _) = self.execute(&request).await?;
        Ok(status == StatusCode::OK)
    }

    /// Создает новый платеж.
    ///
    /// Каждый вызов получает свой ключ идемпотентности; повторы по
    /// [`RetryPolicy`] используют тот же ключ.
    pub async fn create_payment(&self, config: &PaymentConfig) -> Result<Payment> {
        let request = PreparedRequest::post(&self.base_url, &[PAYMENTS_ENDPOINT], config)?;
        self.call(request).await
    }

    /// Получает информацию о конкретном платеже.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        let request = PreparedRequest::get(&self.base_url, &payment_endpoint(payment_id)?)?;
        self.call(request).await
    }

    /// Подтверждает (списывает) платеж в статусе `waiting_for_capture`.
    ///
    /// Без `request` списывается вся сумма. Ответ разбирается так же, как
    /// у [`Self::get_payment`]: объект ошибки возвращается как `Err`.
    pub async fn capture_payment(
        &self,
        payment_id: &str,
        request: Option<&CapturePaymentRequest>,
    ) -> Result<Payment> {
        let default_body = CapturePaymentRequest::default();
        let body = request.unwrap_or(&default_body);
        let request = PreparedRequest::post(&self.base_url, &capture_endpoint(payment_id)?, body)?;
        self.call(request).await
    }

    /// Отменяет платеж в статусе `waiting_for_capture`.
    pub async fn cancel_payment(&self, payment_id: &str) -> Result<Payment> {
        // API ожидает пустой объект {} в теле
        let empty_body = serde_json::json!({});
        let request =
            PreparedRequest::post(&self.base_url, &cancel_endpoint(payment_id)?, &empty_body)?;
        self.call(request).await
    }

    /// Список платежей с фильтрами и пагинацией через `next_cursor`.
    pub async fn list_payments(&self, params: &ListPaymentsParams) -> Result<PaymentList> {
        let request = PreparedRequest::get(&self.base_url, &[PAYMENTS_ENDPOINT])?
            .with_query(&params.to_query());
        self.call(request).await
    }

    pub fn parse_webhook_event(&self, body: &str) -> Result<WebhookEvent> {
        if self.verbose {
            info!("YooKassa notification: {}", body);
        }
        webhook::parse_event(body)
    }

    pub fn parse_webhook_payment(&self, body: &str) -> Result<WebhookPayment> {
        if self.verbose {
            info!("YooKassa notification: {}", body);
        }
        webhook::parse_payment(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn builder_defaults() {
        let client = YooKassaClient::new("830911", "test_secret").unwrap();
        assert_eq!(client.shop_id(), "830911");
        assert_eq!(client.base_url().as_str(), YOOKASSA_API_BASE_URL);
        assert!(!client.is_verbose());
    }

    #[test]
    fn debug_hides_secret_key() {
        let client = YooKassaClient::new("830911", "test_secret").unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("830911"));
        assert!(!debug.contains("test_secret"));
    }

    #[test]
    fn invalid_base_url_fails_build() {
        let result = YooKassaClient::builder("830911", "test_secret")
            .base_url("::not a url::")
            .build();
        assert!(matches!(result, Err(YooKassaError::UrlParse(_))));

        let result = YooKassaClient::builder("830911", "test_secret")
            .base_url("data:text/plain,v3")
            .build();
        assert!(matches!(result, Err(YooKassaError::InvalidBaseUrl(_))));
    }

    #[test]
    fn env_requires_credentials() {
        let result = ClientBuilder::from_lookup(lookup(&[(SHOP_ID_VAR, "830911")]));
        assert!(matches!(result, Err(YooKassaError::MissingEnv(SECRET_KEY_VAR))));

        let result = ClientBuilder::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(YooKassaError::MissingEnv(SHOP_ID_VAR))));
    }

    #[test]
    fn env_optional_settings() {
        let client = ClientBuilder::from_lookup(lookup(&[
            (SHOP_ID_VAR, "830911"),
            (SECRET_KEY_VAR, "test_secret"),
            (BASE_URL_VAR, "http://localhost:8080/v3"),
            (VERBOSE_VAR, "True"),
        ]))
        .unwrap()
        .build()
        .unwrap();

        assert!(client.is_verbose());
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/v3/");
    }
}
