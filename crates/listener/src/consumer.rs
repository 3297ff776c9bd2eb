//! AMQP consumer for the notification queue.
//!
//! Topology, declared idempotently on start:
//! - durable topic exchange `notification-exchange`
//! - durable queue `notification-queue`
//! - binding `notification.*`
//!
//! Each delivery is handled in its own task and acknowledged once handling
//! returns. Nothing is nacked or requeued. On shutdown the consumer is
//! cancelled and in-flight tasks are drained before the connection closes,
//! so a message that was already sent still gets its ack.

use std::future::Future;

use anyhow::{Context, Result};
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::signal;
use tokio::task::JoinSet;

use herald_common::config::AppConfig;
use herald_dispatch::service::DispatchService;

use crate::handler::handle_payload;

pub const NOTIFICATION_EXCHANGE: &str = "notification-exchange";
pub const NOTIFICATION_QUEUE: &str = "notification-queue";
pub const NOTIFICATION_ROUTING_KEY: &str = "notification.*";
const CONSUMER_TAG: &str = "herald-listener";

/// Declare the exchange, queue and binding the listener consumes from.
pub async fn declare_topology(channel: &Channel) -> Result<()> {
    channel
        .exchange_declare(
            NOTIFICATION_EXCHANGE,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare notification exchange")?;

    channel
        .queue_declare(
            NOTIFICATION_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare notification queue")?;

    channel
        .queue_bind(
            NOTIFICATION_QUEUE,
            NOTIFICATION_EXCHANGE,
            NOTIFICATION_ROUTING_KEY,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .context("Failed to bind notification queue")?;

    tracing::info!(
        exchange = NOTIFICATION_EXCHANGE,
        queue = NOTIFICATION_QUEUE,
        routing_key = NOTIFICATION_ROUTING_KEY,
        "Queue topology declared"
    );
    Ok(())
}

/// Event-handling tasks that are still running.
#[derive(Default)]
pub struct EventTasks {
    tasks: JoinSet<()>,
}

impl EventTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the next task to finish. Pending forever when none are running.
    async fn reap(&mut self) {
        match self.tasks.join_next().await {
            Some(result) => log_join_result(result),
            None => std::future::pending::<()>().await,
        }
    }

    /// Wait for every running task to finish.
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            log_join_result(result);
        }
    }
}

fn log_join_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Event task did not complete");
    }
}

/// Consume notification events until the connection closes or a shutdown
/// signal arrives.
pub async fn run(config: &AppConfig, service: DispatchService) -> Result<()> {
    let conn = Connection::connect(&config.amqp_url, ConnectionProperties::default())
        .await
        .context("Failed to connect to AMQP broker")?;
    tracing::info!("Connected to AMQP broker");

    let channel = conn
        .create_channel()
        .await
        .context("Failed to create channel")?;

    channel
        .basic_qos(config.queue_prefetch, BasicQosOptions::default())
        .await
        .context("Failed to set QoS")?;

    declare_topology(&channel).await?;

    let mut consumer = channel
        .basic_consume(
            NOTIFICATION_QUEUE,
            CONSUMER_TAG,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .context("Failed to start consumer")?;

    tracing::info!(
        queue = NOTIFICATION_QUEUE,
        prefetch = config.queue_prefetch,
        "Listening for notification events"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut in_flight = EventTasks::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal, stopping consumer...");
                break;
            }
            delivery = consumer.next() => {
                match delivery {
                    Some(Ok(delivery)) => {
                        let service = service.clone();
                        let channel = channel.clone();

                        in_flight.spawn(async move {
                            let delivery_tag = delivery.delivery_tag;
                            handle_payload(&service, &delivery.data).await;

                            // Acknowledged whatever the outcome: at-most-once, no retry.
                            if let Err(e) = channel
                                .basic_ack(delivery_tag, BasicAckOptions::default())
                                .await
                            {
                                tracing::error!(delivery_tag, error = %e, "Failed to ack event");
                            }
                        });
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Consumer delivery error");
                    }
                    None => {
                        tracing::warn!("Consumer stream closed");
                        break;
                    }
                }
            }
            _ = in_flight.reap() => {}
        }
    }

    if let Err(e) = channel
        .basic_cancel(CONSUMER_TAG, BasicCancelOptions::default())
        .await
    {
        tracing::warn!(error = %e, "Failed to cancel consumer");
    }

    if !in_flight.is_empty() {
        tracing::info!(in_flight = in_flight.len(), "Waiting for in-flight events");
    }
    in_flight.drain().await;

    if let Err(e) = conn.close(200, "listener shutdown").await {
        tracing::warn!(error = %e, "Failed to close AMQP connection cleanly");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
