//! # Mock Framework
//!
//! Utilities for testing clients and services in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_create`] or [`expect_action`] to assert behavior.

use crate::actor_framework::{Entity, FrameworkError, ResourceClient, ResourceRequest};
use tokio::sync::{mpsc, oneshot};

/// Creates a mock client and a receiver for asserting requests.
///
/// The client sends to a channel the test controls instead of a running
/// `ResourceActor`, so replies (success, failure, delays) are scripted by
/// the test.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, oneshot::Sender<Result<T::Id, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<oneshot::Sender<Result<Vec<T>, FrameworkError>>> {
    match receiver.recv().await {
        Some(ResourceRequest::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, oneshot::Sender<Result<T::ActionResult, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::InventoryClient;
    use crate::domain::InventoryRecord;

    #[tokio::test]
    async fn test_mock_client() {
        let (inner, mut receiver) = create_mock_client::<InventoryRecord>(10);
        let client = InventoryClient::new(inner);

        let create_task = {
            let client = client.clone();
            tokio::spawn(async move { client.create_record(InventoryRecord::new("ube", "Ube", 8).into()).await })
        };
        let (params, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(params.product_id, "ube");
        assert_eq!(params.current_stock, Some(8));
        responder.send(Ok("ube".to_string())).unwrap();
        assert_eq!(create_task.await.unwrap(), Ok("ube".to_string()));

        let get_task = {
            let client = client.clone();
            tokio::spawn(async move { client.get_record("ube".into()).await })
        };
        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(id, "ube");
        responder.send(Ok(None)).unwrap();
        assert_eq!(get_task.await.unwrap(), Ok(None));

        let low_task = tokio::spawn(async move { client.low_stock_products(5).await });
        let responder = expect_list(&mut receiver).await.expect("Expected List request");
        let mut sold_out = InventoryRecord::new("choco", "Choco", 12);
        sold_out.current_stock = 1;
        responder
            .send(Ok(vec![InventoryRecord::new("glazed", "Glazed", 20), sold_out.clone()]))
            .unwrap();
        assert_eq!(low_task.await.unwrap(), Ok(vec![sold_out]));
    }
}
