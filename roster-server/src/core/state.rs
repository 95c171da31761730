//! 服务器状态
//!
//! 持有配置、报名引擎和存储句柄。所有字段都可廉价克隆，
//! axum handler 通过 `State<ServerState>` 共享同一份状态。

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerError};
use crate::registration::{
    Clock, EventJournal, LogNotifier, ManagerError, Notification, NotificationWorker, Notifier,
    OfferSweeper, ReconcileScheduler, RedbStore, RegistrationManager, RegistrationStore,
    SystemClock, WebhookNotifier,
};

/// 服务器状态
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 报名引擎
    pub manager: RegistrationManager,
    /// 存储 (用于健康检查统计)
    pub store: RedbStore,
    notifier: Arc<dyn Notifier>,
    /// 通知队列接收端，由通知 worker 取走
    notify_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<Notification>>>>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 基于已打开的存储创建状态
    ///
    /// 配置了 `NOTIFY_WEBHOOK_URL` 时通过 webhook 推送通知，否则写日志。
    pub fn new(config: Config, store: RedbStore, clock: Arc<dyn Clock>) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
            Some(url) => {
                let notifier = WebhookNotifier::new(url.clone(), config.request_timeout())
                    .map_err(|e| ServerError::Config(e.to_string()))?;
                tracing::info!(url = %url, "Notifications delivered via webhook");
                Arc::new(notifier)
            }
            None => {
                tracing::info!("No notification webhook configured, notifications go to the log");
                Arc::new(LogNotifier)
            }
        };

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let manager = RegistrationManager::new(
            Arc::new(store.clone()),
            clock,
            config.registration_settings(),
        )
        .with_notifications(notify_tx);

        Ok(Self {
            config,
            manager,
            store,
            notifier,
            notify_rx: Arc::new(Mutex::new(Some(notify_rx))),
        })
    }

    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录结构
    /// 2. 打开 redb 数据库 `{work_dir}/database/roster.redb`
    /// 3. 创建报名引擎和通知队列
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let store = RedbStore::open(&db_path).map_err(ManagerError::from)?;
        let floor = store.latest_timestamp().map_err(ManagerError::from)?;
        tracing::info!(path = %db_path.display(), floor, "Registration store opened");

        Self::new(config.clone(), store, Arc::new(SystemClock::resume_after(floor)))
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 开始接收请求之前调用
    ///
    /// 启动的任务：
    /// - 通知投递 (NotificationWorker)
    /// - 事件日志 (EventJournal)
    /// - 过期空位扫描 (OfferSweeper)
    /// - 对账 (ReconcileScheduler)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        match self.notify_rx.lock().take() {
            Some(rx) => {
                let worker =
                    NotificationWorker::new(self.notifier.clone(), rx, tasks.shutdown_token());
                tasks.spawn("notification_worker", TaskKind::Worker, worker.run());
            }
            None => tracing::warn!("Notification worker already started"),
        }

        let journal = EventJournal::new(self.manager.subscribe(), tasks.shutdown_token());
        tasks.spawn("event_journal", TaskKind::Listener, async move {
            journal.run().await;
        });

        let sweeper = OfferSweeper::new(
            self.manager.clone(),
            self.config.offer_sweep_interval(),
            tasks.shutdown_token(),
        );
        tasks.spawn("offer_sweeper", TaskKind::Periodic, sweeper.run());

        let reconciler = ReconcileScheduler::new(
            self.manager.clone(),
            self.config.reconcile_interval(),
            tasks.shutdown_token(),
        );
        tasks.spawn("reconcile_scheduler", TaskKind::Periodic, reconciler.run());

        tasks.log_summary();
        tasks
    }

    /// 获取工作目录
    pub fn work_dir(&self) -> &str {
        &self.config.work_dir
    }
}
