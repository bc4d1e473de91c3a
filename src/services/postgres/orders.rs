use super::{PostgresClient, PostgresError};
use crate::models::{CreateOrderRequest, Order, OrderStatus};

const ORDER_COLUMNS: &str =
    "id, service, price, name, phone, email, company, comment, status, created_at";

impl PostgresClient {
    /// Store a lead from the public order form
    pub async fn create_order(&self, order: &CreateOrderRequest) -> Result<i32, PostgresError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (service, price, name, phone, email, company, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(order.service.trim())
        .bind(order.price.trim())
        .bind(order.name.trim())
        .bind(order.phone.trim())
        .bind(non_empty(&order.email))
        .bind(non_empty(&order.company))
        .bind(non_empty(&order.comment))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Received order {} for service '{}'", id, order.service);
        Ok(id)
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, PostgresError> {
        let query = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::order_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "#
        );

        let orders = sqlx::query_as::<_, Order>(&query)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    pub async fn update_order_status(
        &self,
        id: i32,
        status: OrderStatus,
    ) -> Result<Order, PostgresError> {
        let query = format!("UPDATE orders SET status = $1 WHERE id = $2 RETURNING {ORDER_COLUMNS}");

        sqlx::query_as::<_, Order>(&query)
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("Order {} not found", id)))
    }
}

/// Blank optional form fields are stored as NULL
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_optional_fields_become_null() {
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(" ООО Ромашка ".to_string())), Some("ООО Ромашка"));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_order_lifecycle() {
        let client = super::super::test_client().await;
        let order = CreateOrderRequest {
            service: super::super::unique("Регистрация ООО"),
            price: "от 5 000 ₽".to_string(),
            name: " Иван ".to_string(),
            phone: "+7 900 000-00-00".to_string(),
            email: Some("".to_string()),
            company: Some("ООО Ромашка".to_string()),
            comment: None,
        };

        let id = client.create_order(&order).await.unwrap();
        let stored = client
            .list_orders(Some(OrderStatus::New))
            .await
            .unwrap()
            .into_iter()
            .find(|o| o.id == id)
            .unwrap();
        assert_eq!(stored.name, "Иван");
        assert_eq!(stored.email, None);

        let updated = client.update_order_status(id, OrderStatus::InProgress).await.unwrap();
        assert_eq!(updated.status, OrderStatus::InProgress);
        assert!(matches!(
            client.update_order_status(-1, OrderStatus::Completed).await,
            Err(PostgresError::NotFound(_))
        ));
    }
}
