//! Клиент HTTP API YooKassa: создание, проверка, подтверждение и отмена
//! платежей, а также разбор входящих уведомлений.
//!
//! ```no_run
//! use yookassa_client::{Amount, Confirmation, PaymentConfig, PaymentStatus, YooKassaClient};
//!
//! # async fn run() -> yookassa_client::Result<()> {
//! let client = YooKassaClient::new("830911", "test_secret_key")?;
//!
//! let config = PaymentConfig::new(
//!     Amount::rub("10.00"),
//!     Confirmation::redirect("https://example.com/return"),
//! )
//! .with_description("Заказ №72");
//!
//! let payment = client.create_payment(&config).await?;
//! if let Some(url) = payment.confirmation_url() {
//!     println!("Перенаправьте пользователя на: {url}");
//! }
//!
//! let payment = client.get_payment(&payment.id).await?;
//! if payment.status == PaymentStatus::WaitingForCapture {
//!     client.capture_payment(&payment.id, None).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;
pub mod request;
mod response;
mod retry;
pub mod webhook;

pub use client::{
    BASE_URL_VAR, ClientBuilder, DEFAULT_TIMEOUT, SECRET_KEY_VAR, SHOP_ID_VAR, VERBOSE_VAR,
    YOOKASSA_API_BASE_URL, YooKassaClient,
};
pub use error::{ERROR_TYPE, Result, YooKassaApiError, YooKassaError};
pub use models::*;
pub use response::ApiResponse;
pub use retry::RetryPolicy;
pub use webhook::{WebhookEvent, WebhookPayment};
