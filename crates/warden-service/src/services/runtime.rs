//! Process lifecycle
//!
//! Wires storage, the platform actor and the expiry scheduler together once
//! at startup and tears them down on shutdown. Configuration flows in through
//! the constructors; there is no global state.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use warden_common::{AppConfig, AppError, AppResult, SchedulerSettings};
use warden_core::events::PlatformEvent;
use warden_core::traits::GuildActor;
use warden_db::{create_pool, run_migrations, DatabaseConfig};

use super::context::{ServiceContext, ServiceContextBuilder};
use super::events::EventService;
use super::scheduler::{Scheduler, SchedulerHandle};

/// A running moderation core
pub struct Runtime {
    ctx: Arc<ServiceContext>,
    scheduler: Option<SchedulerHandle>,
}

impl Runtime {
    /// Connect to PostgreSQL, apply migrations, then start the scheduler
    ///
    /// # Errors
    /// `AppError::Database` when the pool cannot be created and
    /// `AppError::Migration` when the schema cannot be brought up to date.
    pub async fn start(config: &AppConfig, actor: Arc<dyn GuildActor>) -> AppResult<Self> {
        info!("Connecting to PostgreSQL...");
        let pool = create_pool(&DatabaseConfig::from(&config.database))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        info!("PostgreSQL connection established");

        run_migrations(&pool, config.database.migrations_dir.as_deref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to apply migrations");
                AppError::Migration(e.to_string())
            })?;
        info!("Migrations applied");

        let ctx = ServiceContextBuilder::new()
            .postgres(pool)
            .actor(actor)
            .moderation(config.moderation.clone())
            .bot_name(config.app.name.clone())
            .build()?;

        Ok(Self::with_context(ctx, config.scheduler.clone()))
    }

    /// Start on a prebuilt context, e.g. one backed by a `MemoryStore`
    pub fn with_context(ctx: ServiceContext, scheduler: SchedulerSettings) -> Self {
        let ctx = Arc::new(ctx);
        let handle = Scheduler::new(ctx.clone(), scheduler).spawn();
        Self {
            ctx,
            scheduler: Some(handle),
        }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Shared handle to the context for tasks that outlive a borrow
    pub fn shared_context(&self) -> Arc<ServiceContext> {
        self.ctx.clone()
    }

    /// Handle a platform event on its own task
    ///
    /// Ban events wait out the settle delay, so the gateway must not await
    /// them inline.
    pub fn dispatch(&self, event: PlatformEvent) -> JoinHandle<()> {
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = EventService::new(&ctx).dispatch(&event).await {
                error!(
                    event_type = event.event_type(),
                    guild_id = %event.guild_id(),
                    error = %e,
                    "Failed to handle platform event"
                );
            }
        })
    }

    /// Stop the scheduler after its current record
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.scheduler.take() {
            handle.shutdown().await;
        }
        info!("Runtime stopped");
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("ctx", &self.ctx)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
