use serde::{Deserialize, Serialize};

// --- Общие структуры ---

// Сумма
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub value: String,    // Десятичная строка, например "100.00"
    pub currency: String, // ISO-4217, например "RUB"
}

impl Amount {
    pub fn new(value: impl Into<String>, currency: impl Into<String>) -> Self {
        Amount {
            value: value.into(),
            currency: currency.into(),
        }
    }

    pub fn rub(value: impl Into<String>) -> Self {
        Amount::new(value, "RUB")
    }
}

// --- Запросы ---

/// Сценарий подтверждения платежа пользователем.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Confirmation {
    /// Пользователь уходит на страницу YooKassa и возвращается на `return_url`.
    Redirect {
        return_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enforce: Option<bool>, // Принудительный 3-D Secure
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>, // ru_RU, en_US
    },
    /// Платежная форма встраивается в страницу магазина.
    Embedded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
    },
    External {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
    },
    Qr {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
    },
    MobileApplication {
        return_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<String>,
    },
}

impl Confirmation {
    pub fn redirect(return_url: impl Into<String>) -> Self {
        Confirmation::Redirect {
            return_url: return_url.into(),
            enforce: None,
            locale: None,
        }
    }

    pub fn embedded() -> Self {
        Confirmation::Embedded { locale: None }
    }
}

// Данные о способе оплаты, если он выбирается на стороне магазина
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaymentMethodData {
    #[serde(rename = "type")]
    pub payment_method_type: String, // "bank_card", "sbp", "yoo_money", ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>, // SberPay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>, // mobile_balance
}

/// Параметры нового платежа.
///
/// Отправляется один раз через [`crate::YooKassaClient::create_payment`];
/// незаданные поля в JSON не попадают.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaymentConfig {
    pub amount: Amount,
    pub confirmation: Confirmation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<bool>, // true - одностадийная оплата
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_payment_method: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>, // Сохраненный способ оплаты
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>, // Токен Checkout.js / Mobile SDK
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_data: Option<PaymentMethodData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
}

impl PaymentConfig {
    pub fn new(amount: Amount, confirmation: Confirmation) -> Self {
        PaymentConfig {
            amount,
            confirmation,
            description: None,
            metadata: None,
            capture: None,
            save_payment_method: None,
            payment_method_id: None,
            payment_token: None,
            payment_method_data: None,
            receipt: None,
            client_ip: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_capture(mut self, capture: bool) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn with_receipt(mut self, receipt: Receipt) -> Self {
        self.receipt = Some(receipt);
        self
    }

    pub fn with_payment_method_data(mut self, data: PaymentMethodData) -> Self {
        self.payment_method_data = Some(data);
        self
    }
}

// Запрос на подтверждение (capture); пустой объект списывает всю сумму
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CapturePaymentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>, // Частичное списание
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
}

// --- Чеки 54-ФЗ ---

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ReceiptCustomer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>, // ITU-T E.164
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReceiptItem {
    pub description: String,
    pub quantity: String,
    pub amount: Amount, // С учетом количества и скидок
    pub vat_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_subject: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Receipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<ReceiptCustomer>,
    pub items: Vec<ReceiptItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_system_code: Option<i32>,
}

// --- Ответы ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::WaitingForCapture => "waiting_for_capture",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Canceled => "canceled",
        }
    }

    /// Дальнейших переходов у платежа не будет.
    pub fn is_final(self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Canceled)
    }
}

// Подтверждение в ответе
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfirmationResponse {
    #[serde(rename = "type")]
    pub confirmation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>, // Куда перенаправить пользователя
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>, // Для embedded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_data: Option<String>, // Для qr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforce: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Recipient {
    pub account_id: String,
    pub gateway_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CardProduct {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CardDetails {
    pub first6: Option<String>,
    pub last4: String,
    pub expiry_year: String,
    pub expiry_month: String,
    pub card_type: String, // "MasterCard", "Visa", "Mir", ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_product: Option<CardProduct>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub payment_method_type: String,
    pub id: String,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>, // "Bank card *4444"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CancellationDetails {
    pub party: String,  // "yoo_money", "merchant", "payment_network"
    pub reason: String, // "expired_on_confirmation", "canceled_by_merchant", ...
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ThreeDSecure {
    pub applied: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthorizationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rrn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_d_secure: Option<ThreeDSecure>,
}

/// Объект платежа.
///
/// Временные метки хранятся строками ISO 8601 в том виде, в котором пришли.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Payment {
    pub id: String,
    pub status: PaymentStatus,
    pub paid: bool, // true для succeeded и waiting_for_capture
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_amount: Option<Amount>, // За вычетом комиссии
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Recipient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>, // Только для waiting_for_capture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationResponse>,
    pub test: bool,
    pub refundable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_details: Option<CancellationDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_details: Option<AuthorizationDetails>,
}

impl Payment {
    /// Ссылка для перенаправления пользователя, если она есть.
    pub fn confirmation_url(&self) -> Option<&str> {
        self.confirmation
            .as_ref()
            .and_then(|c| c.confirmation_url.as_deref())
    }
}

// Список платежей
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaymentList {
    #[serde(rename = "type")]
    pub list_type: String, // "list"
    pub items: Vec<Payment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Фильтры и пагинация для [`crate::YooKassaClient::list_payments`].
#[derive(Debug, Clone, Default)]
pub struct ListPaymentsParams {
    pub limit: Option<u32>, // 1..=100
    pub status: Option<PaymentStatus>,
    pub cursor: Option<String>,
    pub created_at_gte: Option<String>,
    pub created_at_lt: Option<String>,
}

impl ListPaymentsParams {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_owned()));
        }
        if let Some(cursor) = &self.cursor {
            query.push(("cursor", cursor.clone()));
        }
        if let Some(gte) = &self.created_at_gte {
            query.push(("created_at.gte", gte.clone()));
        }
        if let Some(lt) = &self.created_at_lt {
            query.push(("created_at.lt", lt.clone()));
        }
        query
    }
}
