//! Разбор входящих уведомлений (webhook).
//!
//! Прием HTTP запроса, проверка отправителя и защита от повторной доставки
//! остаются на стороне приложения; здесь только десериализация тела.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Payment, PaymentStatus};

pub const NOTIFICATION_TYPE: &str = "notification";

pub const PAYMENT_WAITING_FOR_CAPTURE: &str = "payment.waiting_for_capture";
pub const PAYMENT_SUCCEEDED: &str = "payment.succeeded";
pub const PAYMENT_CANCELED: &str = "payment.canceled";

/// Уведомление с объектом в сыром виде: подходит для любых событий,
/// в том числе `refund.*` и `payout.*`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub notification_type: String, // "notification"
    pub event: String,
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn is_payment_event(&self) -> bool {
        self.event.starts_with("payment.")
    }

    /// Статус платежа, о котором сообщает событие; `None` для прочих событий.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        match self.event.as_str() {
            PAYMENT_WAITING_FOR_CAPTURE => Some(PaymentStatus::WaitingForCapture),
            PAYMENT_SUCCEEDED => Some(PaymentStatus::Succeeded),
            PAYMENT_CANCELED => Some(PaymentStatus::Canceled),
            _ => None,
        }
    }
}

/// Уведомление о платеже с уже разобранным объектом.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WebhookPayment {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub event: String,
    pub object: Payment,
}

pub fn parse_event(body: &str) -> Result<WebhookEvent> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_payment(body: &str) -> Result<WebhookPayment> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::YooKassaError;

    const WAITING_FOR_CAPTURE: &str = r#"{
        "type": "notification",
        "event": "payment.waiting_for_capture",
        "object": {
          "id": "22d6d597-000f-5000-9000-145f6df21d6f",
          "status": "waiting_for_capture",
          "paid": true,
          "amount": {
            "value": "2.00",
            "currency": "RUB"
          },
          "authorization_details": {
            "rrn": "10000000000",
            "auth_code": "000000",
            "three_d_secure": {
              "applied": true
            }
          },
          "created_at": "2018-07-10T14:27:54.691Z",
          "description": "Заказ №72",
          "expires_at": "2018-07-17T14:28:32.484Z",
          "metadata": {},
          "payment_method": {
            "type": "bank_card",
            "id": "22d6d597-000f-5000-9000-145f6df21d6f",
            "saved": false,
            "card": {
              "first6": "555555",
              "last4": "4444",
              "expiry_month": "07",
              "expiry_year": "2021",
              "card_type": "MasterCard",
              "issuer_country": "RU",
              "issuer_name": "Sberbank"
            },
            "title": "Bank card *4444"
          },
          "refundable": false,
          "test": false
        }
    }"#;

    #[test]
    fn parses_event_envelope() {
        let event = parse_event(WAITING_FOR_CAPTURE).unwrap();
        assert_eq!(event.notification_type, NOTIFICATION_TYPE);
        assert_eq!(event.event, PAYMENT_WAITING_FOR_CAPTURE);
        assert!(event.is_payment_event());
        assert_eq!(event.object["status"], "waiting_for_capture");
        assert_eq!(event.payment_status(), Some(PaymentStatus::WaitingForCapture));
    }

    #[test]
    fn final_events_map_to_statuses() {
        for (name, status) in [
            (PAYMENT_SUCCEEDED, PaymentStatus::Succeeded),
            (PAYMENT_CANCELED, PaymentStatus::Canceled),
        ] {
            let body = WAITING_FOR_CAPTURE.replace(PAYMENT_WAITING_FOR_CAPTURE, name);
            let event = parse_event(&body).unwrap();
            assert_eq!(event.payment_status(), Some(status));
            assert!(status.is_final());
        }
    }

    #[test]
    fn parses_embedded_payment() {
        let notification = parse_payment(WAITING_FOR_CAPTURE).unwrap();
        let payment = notification.object;

        assert_eq!(payment.id, "22d6d597-000f-5000-9000-145f6df21d6f");
        assert_eq!(payment.amount.value, "2.00");
        assert_eq!(payment.status, PaymentStatus::WaitingForCapture);
        assert!(payment.paid);
        assert!(payment.recipient.is_none());

        let card = payment.payment_method.and_then(|m| m.card).unwrap();
        assert_eq!(card.last4, "4444");
        let three_ds = payment
            .authorization_details
            .and_then(|d| d.three_d_secure)
            .unwrap();
        assert!(three_ds.applied);
    }

    #[test]
    fn malformed_body_is_rejected() {
        let (truncated, _) = WAITING_FOR_CAPTURE.split_once("\"payment_method\"").unwrap();
        assert!(matches!(parse_event(truncated), Err(YooKassaError::Serde(_))));
        assert!(matches!(parse_payment(truncated), Err(YooKassaError::Serde(_))));
        assert!(matches!(parse_event(""), Err(YooKassaError::Serde(_))));
    }

    #[test]
    fn refund_event_is_not_a_payment() {
        let body = r#"{
            "type": "notification",
            "event": "refund.succeeded",
            "object": {"id": "216749f7-0016-50be-b000-078d43a63ae4", "status": "succeeded"}
        }"#;
        let event = parse_event(body).unwrap();
        assert!(!event.is_payment_event());
        assert_eq!(event.payment_status(), None);
        assert!(parse_payment(body).is_err());
    }
}
