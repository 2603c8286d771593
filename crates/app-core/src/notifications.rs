//! In-app notification inbox

use crate::models::{list_at, Ack, Notification};
use crate::validation;
use api_client::descriptor::{MockEnv, RequestDescriptor};
use api_client::{ApiRequest, RawResponse, Result};
use chrono::Duration;

/// `GET /notifications`
#[derive(Debug, Clone, Copy, Default)]
pub struct ListNotifications;

impl RequestDescriptor for ListNotifications {
    type Input = ();
    type Output = Vec<Notification>;
    const NAME: &'static str = "notifications.list";

    fn mock(&self, _input: &(), env: &MockEnv) -> Result<Vec<Notification>> {
        Ok(vec![
            Notification {
                id: env.synthetic_id("notif"),
                title: "Your order is on its way".to_string(),
                body: "A local courier picked up your order.".to_string(),
                read: false,
                created_at: env.now(),
            },
            Notification {
                id: "notif_welcome".to_string(),
                title: "Welcome to BuyLocal".to_string(),
                body: "Discover producers in your neighbourhood.".to_string(),
                read: true,
                created_at: env.now() - Duration::days(7),
            },
        ])
    }

    fn request(&self, _input: &()) -> Result<ApiRequest> {
        Ok(ApiRequest::get("/notifications"))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Vec<Notification>> {
        list_at(response, "/data/notifications")
    }
}

/// `PATCH /notifications/{id}/read`
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkNotificationRead;

impl RequestDescriptor for MarkNotificationRead {
    type Input = String;
    type Output = Ack;
    const NAME: &'static str = "notifications.markRead";

    fn validate(&self, id: &String) -> Result<()> {
        validation::path_id("Notification id", id)
    }

    fn mock(&self, _id: &String, _env: &MockEnv) -> Result<Ack> {
        Ok(Ack::new("Notification marked as read"))
    }

    fn request(&self, id: &String) -> Result<ApiRequest> {
        Ok(ApiRequest::patch(format!("/notifications/{}/read", id)))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Ack> {
        Ack::from_response(response, "Notification marked as read")
    }
}
